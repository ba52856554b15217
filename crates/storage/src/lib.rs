//! Transport layer for terrafs.
//!
//! The filesystem core only needs one remote operation: a blocking-per-call GET
//! of an arbitrary URL that yields a status code and the body bytes. This crate
//! defines that contract ([`HttpClient`]) and provides two backends:
//!
//! - **[`ReqwestHttpClient`]** - HTTP(S) over `reqwest`
//! - **[`MemoryHttpClient`]** - canned responses with request counting, for
//!   tests and offline use
//!
//! Non-200 statuses are not errors at this layer. A [`TransportError`] means no
//! HTTP response was obtained at all.

mod error;
mod memory;
mod reqwest_client;
mod traits;
mod types;

pub use error::TransportError;
pub use memory::MemoryHttpClient;
pub use reqwest_client::ReqwestHttpClient;
pub use traits::HttpClient;
pub use types::{HttpResponse, TransportSettings, DEFAULT_MAX_IDLE_CONNECTIONS, STATUS_OK};
