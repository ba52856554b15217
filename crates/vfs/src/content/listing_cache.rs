//! Directory listing cache with negative caching.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      ListingCache                        │
//! │  listings:        HashMap<dir URL, Option<Listing>>      │
//! │  pending_fetches: HashMap<dir URL, Shared<Future>>       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `None` marks a directory confirmed absent: a non-200 status, a transport
//! failure, or a malformed listing. Entries are inserted once and never evicted
//! or refreshed.
//!
//! # Thread Safety
//!
//! - One `Mutex` guards both maps and is held only for quick map operations
//! - Concurrent misses on the same URL share one in-flight fetch
//! - Listings never leave the cache; callers see them through `with_listing`

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use terrafs_model::Listing;
use tokio::sync::oneshot;

use super::RemoteTree;
use crate::VfsError;

/// Completion signal for an in-flight fetch.
type PendingFetch = Shared<BoxFuture<'static, ()>>;

/// Snapshot of listing cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingCacheStats {
    /// Directories cached with a listing.
    pub present: usize,
    /// Directories cached as absent.
    pub absent: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Listing fetches issued.
    pub fetches: u64,
    /// Fetches currently in flight.
    pub pending_fetches: usize,
}

impl ListingCacheStats {
    /// Hit rate as a percentage of all lookups.
    pub fn hit_rate(&self) -> f64 {
        let total: u64 = self.hits + self.fetches;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Internal state guarded by the cache mutex.
#[derive(Default)]
struct ListingCacheInner {
    /// Cached outcomes by directory URL.
    listings: HashMap<String, Option<Listing>>,
    /// In-flight fetches by directory URL.
    pending_fetches: HashMap<String, PendingFetch>,
}

/// What a caller has to do after checking the cache.
enum FetchRole {
    /// Outcome already cached.
    Cached,
    /// Another caller is fetching; wait for it.
    Waiter(PendingFetch),
    /// This caller fetches and signals waiters when done.
    Leader(oneshot::Sender<()>),
}

/// Removes the in-flight marker when the leader finishes or is dropped.
///
/// Dropping the leader also drops its sender, which wakes waiters so one of
/// them can take over.
struct PendingFetchGuard<'a> {
    inner: &'a Mutex<ListingCacheInner>,
    dir_url: &'a str,
}

impl Drop for PendingFetchGuard<'_> {
    fn drop(&mut self) {
        self.inner.lock().pending_fetches.remove(self.dir_url);
    }
}

/// Cache of parsed directory listings keyed by directory URL.
pub struct ListingCache {
    /// Remote tree used on a miss.
    tree: Arc<RemoteTree>,
    /// Cached outcomes and in-flight fetches.
    inner: Mutex<ListingCacheInner>,
    /// Lookups answered from the cache.
    hit_count: AtomicU64,
    /// Listing fetches issued.
    fetch_count: AtomicU64,
}

impl ListingCache {
    /// Create an empty cache.
    ///
    /// # Arguments
    /// * `tree` - Remote tree to fetch listings from
    pub fn new(tree: Arc<RemoteTree>) -> Self {
        Self {
            tree,
            inner: Mutex::new(ListingCacheInner::default()),
            hit_count: AtomicU64::new(0),
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Get the remote tree this cache fetches from.
    pub fn tree(&self) -> &Arc<RemoteTree> {
        &self.tree
    }

    /// Run `f` against the cached listing for a directory, fetching it first on
    /// a miss.
    ///
    /// # Arguments
    /// * `dir_url` - Directory URL (cache key)
    /// * `f` - Receives the listing, or None if the directory is absent
    ///
    /// # Returns
    /// Whatever `f` returns.
    pub async fn with_listing<R, F>(&self, dir_url: &str, f: F) -> R
    where
        F: FnOnce(Option<&Listing>) -> R,
    {
        self.ensure_cached(dir_url).await;

        let inner = self.inner.lock();
        f(inner.listings.get(dir_url).and_then(Option::as_ref))
    }

    /// Get a copy of the listing for a directory, fetching it on a miss.
    ///
    /// # Arguments
    /// * `dir_url` - Directory URL (cache key)
    ///
    /// # Returns
    /// The listing, or None if the directory is absent.
    pub async fn get_listing(&self, dir_url: &str) -> Option<Listing> {
        self.with_listing(dir_url, |listing| listing.cloned()).await
    }

    /// Check whether an outcome is cached for a directory URL.
    pub fn contains(&self, dir_url: &str) -> bool {
        self.inner.lock().listings.contains_key(dir_url)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> ListingCacheStats {
        let inner = self.inner.lock();
        let present: usize = inner.listings.values().filter(|l| l.is_some()).count();

        ListingCacheStats {
            present,
            absent: inner.listings.len() - present,
            hits: self.hit_count.load(Ordering::Relaxed),
            fetches: self.fetch_count.load(Ordering::Relaxed),
            pending_fetches: inner.pending_fetches.len(),
        }
    }

    /// Make sure an outcome is cached for `dir_url`.
    async fn ensure_cached(&self, dir_url: &str) {
        loop {
            let role: FetchRole = {
                let mut inner = self.inner.lock();

                if inner.listings.contains_key(dir_url) {
                    FetchRole::Cached
                } else if let Some(pending) = inner.pending_fetches.get(dir_url) {
                    FetchRole::Waiter(pending.clone())
                } else {
                    let (tx, rx) = oneshot::channel::<()>();
                    let pending: PendingFetch = async move {
                        let _ = rx.await;
                    }
                    .boxed()
                    .shared();
                    inner.pending_fetches.insert(dir_url.to_string(), pending);
                    FetchRole::Leader(tx)
                }
            };

            match role {
                FetchRole::Cached => {
                    self.hit_count.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                FetchRole::Waiter(pending) => {
                    // Either the outcome is cached now or the leader was
                    // cancelled and the next pass takes over.
                    pending.await;
                }
                FetchRole::Leader(tx) => {
                    let _guard: PendingFetchGuard<'_> = PendingFetchGuard {
                        inner: &self.inner,
                        dir_url,
                    };
                    let outcome: Option<Listing> = self.fetch(dir_url).await;
                    self.inner
                        .lock()
                        .listings
                        .insert(dir_url.to_string(), outcome);
                    let _ = tx.send(());
                    return;
                }
            }
        }
    }

    /// Fetch one listing, folding every failure into an absent marker.
    async fn fetch(&self, dir_url: &str) -> Option<Listing> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        match self.tree.fetch_listing(dir_url).await {
            Ok(listing) => {
                tracing::debug!(
                    "Cached listing for {} ({} entries)",
                    dir_url,
                    listing.len()
                );
                Some(listing)
            }
            Err(VfsError::DataFormat(e)) => {
                tracing::warn!("Malformed listing at {}: {}", dir_url, e);
                None
            }
            Err(e) => {
                tracing::debug!("Caching {} as absent: {}", dir_url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use terrafs_storage::{HttpResponse, MemoryHttpClient};

    const BASE: &str = "http://scenery.test";

    fn cache_with(client: Arc<MemoryHttpClient>) -> ListingCache {
        ListingCache::new(Arc::new(RemoteTree::new(client, BASE)))
    }

    #[tokio::test]
    async fn test_hit_after_fetch() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/Terrain/.dirindex", BASE), "version:1\nd:w010n40\n");
        let cache: ListingCache = cache_with(client.clone());
        let url: String = format!("{}/Terrain", BASE);

        let first: Option<Listing> = cache.get_listing(&url).await;
        let second: Option<Listing> = cache.get_listing(&url).await;

        assert_eq!(first, second);
        assert_eq!(first.unwrap().len(), 1);
        assert_eq!(client.request_count(&format!("{}/Terrain/.dirindex", BASE)), 1);

        let stats: ListingCacheStats = cache.stats();
        assert_eq!(stats.present, 1);
        assert_eq!(stats.absent, 0);
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.pending_fetches, 0);
        assert!((stats.hit_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_negative_caching() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert(
            format!("{}/Gone/.dirindex", BASE),
            HttpResponse::new(500, Vec::new()),
        );
        let cache: ListingCache = cache_with(client.clone());
        let url: String = format!("{}/Gone", BASE);

        assert!(cache.get_listing(&url).await.is_none());
        assert!(cache.contains(&url));
        assert!(cache.get_listing(&url).await.is_none());
        assert_eq!(client.total_requests(), 1);
        assert_eq!(cache.stats().absent, 1);
    }

    #[tokio::test]
    async fn test_transport_failure_cached_as_absent() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.fail(format!("{}/Down/.dirindex", BASE));
        let cache: ListingCache = cache_with(client.clone());
        let url: String = format!("{}/Down", BASE);

        assert!(cache.get_listing(&url).await.is_none());
        assert!(cache.get_listing(&url).await.is_none());
        assert_eq!(client.total_requests(), 1);
    }

    #[tokio::test]
    async fn test_malformed_listing_cached_as_absent() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/Bad/.dirindex", BASE), "version:x\n");
        let cache: ListingCache = cache_with(client.clone());

        assert!(cache.get_listing(&format!("{}/Bad", BASE)).await.is_none());
        assert_eq!(cache.stats().absent, 1);
    }

    #[tokio::test]
    async fn test_non_utf8_listing_cached_as_absent() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(
            format!("{}/Dir/.dirindex", BASE),
            b"version:1\nf:caf\xE9.txt:x:3\n".to_vec(),
        );
        let cache: ListingCache = cache_with(client.clone());
        let url: String = format!("{}/Dir", BASE);

        assert!(cache.get_listing(&url).await.is_none());
        assert!(cache.get_listing(&url).await.is_none());
        assert_eq!(client.total_requests(), 1);

        let stats: ListingCacheStats = cache.stats();
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.present, 0);
    }

    #[tokio::test]
    async fn test_with_listing_borrows() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/.dirindex", BASE), "d:Models\nf:readme:x:10\n");
        let cache: ListingCache = cache_with(client);

        let names: Vec<String> = cache
            .with_listing(BASE, |listing| {
                listing
                    .map(|l| l.iter().map(|e| e.name.clone()).collect())
                    .unwrap_or_default()
            })
            .await;
        assert_eq!(names, vec!["Models".to_string(), "readme".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let client: Arc<MemoryHttpClient> =
            Arc::new(MemoryHttpClient::new().with_latency(Duration::from_millis(50)));
        client.insert_ok(format!("{}/Objects/.dirindex", BASE), "d:e000n40\n");
        let cache: Arc<ListingCache> = Arc::new(cache_with(client.clone()));
        let url: String = format!("{}/Objects", BASE);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache: Arc<ListingCache> = cache.clone();
            let url: String = url.clone();
            tasks.push(tokio::spawn(async move { cache.get_listing(&url).await }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().len(), 1);
        }

        assert_eq!(client.total_requests(), 1);
        assert_eq!(cache.stats().fetches, 1);
        assert_eq!(cache.stats().pending_fetches, 0);
    }

    #[tokio::test]
    async fn test_cancelled_leader_hands_over() {
        let client: Arc<MemoryHttpClient> =
            Arc::new(MemoryHttpClient::new().with_latency(Duration::from_millis(50)));
        client.insert_ok(format!("{}/Airports/.dirindex", BASE), "d:K\n");
        let cache: ListingCache = cache_with(client.clone());
        let url: String = format!("{}/Airports", BASE);

        // Leader gives up before the response arrives
        let cancelled =
            tokio::time::timeout(Duration::from_millis(5), cache.get_listing(&url)).await;
        assert!(cancelled.is_err());
        assert_eq!(cache.stats().pending_fetches, 0);
        assert!(!cache.contains(&url));

        assert!(cache.get_listing(&url).await.is_some());
        assert_eq!(client.total_requests(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_leader_wakes_parked_waiter() {
        let client: Arc<MemoryHttpClient> =
            Arc::new(MemoryHttpClient::new().with_latency(Duration::from_millis(50)));
        client.insert_ok(format!("{}/Models/.dirindex", BASE), "d:Aircraft\n");
        let cache: Arc<ListingCache> = Arc::new(cache_with(client.clone()));
        let url: String = format!("{}/Models", BASE);

        let leader = {
            let cache: Arc<ListingCache> = cache.clone();
            let url: String = url.clone();
            tokio::spawn(async move { cache.get_listing(&url).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.stats().pending_fetches, 1);

        let waiter = {
            let cache: Arc<ListingCache> = cache.clone();
            let url: String = url.clone();
            tokio::spawn(async move { cache.get_listing(&url).await.is_some() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.total_requests(), 1);

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        // The waiter takes over the fetch and sees the listing
        assert!(waiter.await.unwrap());
        assert_eq!(client.total_requests(), 2);

        let stats: ListingCacheStats = cache.stats();
        assert_eq!(stats.fetches, 2);
        assert_eq!(stats.pending_fetches, 0);
        assert_eq!(stats.present, 1);
    }
}
