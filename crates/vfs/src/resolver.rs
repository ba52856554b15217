//! Path resolution against cached listings.

use std::sync::Arc;

use terrafs_model::Entry;

use crate::content::ListingCache;

/// Split an absolute virtual path into parent directory and leaf name.
///
/// # Arguments
/// * `path` - Virtual path such as `/Terrain/w010n40`
///
/// # Returns
/// `(parent, leaf)` split at the last `/`, or None if there is no separator.
/// The parent of a top-level entry is the empty string.
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    path.rfind('/').map(|idx| (&path[..idx], &path[idx + 1..]))
}

/// Resolves virtual paths to listing entries.
pub struct PathResolver {
    /// Shared listing cache.
    listings: Arc<ListingCache>,
}

impl PathResolver {
    /// Create a resolver over a listing cache.
    ///
    /// # Arguments
    /// * `listings` - Listing cache to consult and populate
    pub fn new(listings: Arc<ListingCache>) -> Self {
        Self { listings }
    }

    /// Get the listing cache.
    pub fn listings(&self) -> &Arc<ListingCache> {
        &self.listings
    }

    /// Resolve a virtual path to the entry describing it.
    ///
    /// The root is never an entry. The parent's listing is fetched on a miss,
    /// and the first entry whose name matches the leaf wins.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path
    ///
    /// # Returns
    /// A copy of the entry, or None if the parent is absent or has no such entry.
    pub async fn resolve_entry(&self, path: &str) -> Option<Entry> {
        let (parent, leaf) = split_path(path)?;
        let dir_url: String = self.listings.tree().directory_url(parent);

        self.listings
            .with_listing(&dir_url, |listing| listing?.find(leaf).cloned())
            .await
    }
}
