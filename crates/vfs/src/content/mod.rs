//! Remote content access for the virtual filesystem.
//!
//! [`RemoteTree`] maps virtual paths to URLs and performs the fetches.
//! [`ListingCache`] sits on top of it and guarantees each directory listing is
//! fetched and parsed at most once per mount.

mod listing_cache;
mod store;

pub use listing_cache::{ListingCache, ListingCacheStats};
pub use store::RemoteTree;
