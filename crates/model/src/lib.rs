//! Directory listing model for terrafs.
//!
//! A remote scenery tree describes each directory with a small text resource
//! named `.dirindex`. This crate parses that resource into a [`Listing`] of
//! typed [`Entry`] values. It does no I/O.

pub mod error;
pub mod listing;

mod decode;

pub use decode::{decode_listing, decode_listing_bytes};
pub use error::ListingError;
pub use listing::{Entry, EntryKind, Listing};

/// Name of the per-directory listing resource.
pub const LISTING_RESOURCE_NAME: &str = ".dirindex";
