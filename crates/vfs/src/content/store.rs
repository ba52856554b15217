//! URL mapping and fetches against the remote tree.

use std::sync::Arc;

use terrafs_model::{Listing, LISTING_RESOURCE_NAME};
use terrafs_storage::{HttpClient, HttpResponse};

use crate::VfsError;

/// The remote directory tree rooted at a base URL.
pub struct RemoteTree {
    /// Transport used for every fetch.
    client: Arc<dyn HttpClient>,
    /// Root URL without trailing `/`.
    base_url: String,
}

impl RemoteTree {
    /// Create a remote tree.
    ///
    /// # Arguments
    /// * `client` - Transport client
    /// * `base_url` - Root URL of the tree
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let url: String = base_url.into();
        Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the root URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a virtual directory path to its directory URL.
    ///
    /// Trailing slashes are dropped so `/` and the empty parent of a top-level
    /// entry map to the same URL.
    ///
    /// # Arguments
    /// * `dir_path` - Virtual directory path (`/`, `/Terrain`, or `""`)
    pub fn directory_url(&self, dir_path: &str) -> String {
        format!("{}{}", self.base_url, dir_path.trim_end_matches('/'))
    }

    /// URL of the listing resource for a directory URL.
    ///
    /// # Arguments
    /// * `dir_url` - Directory URL as returned by [`Self::directory_url`]
    pub fn listing_url(dir_url: &str) -> String {
        format!("{}/{}", dir_url, LISTING_RESOURCE_NAME)
    }

    /// Resolve a virtual file path to its content URL.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path
    pub fn file_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch and parse the listing of a directory.
    ///
    /// # Arguments
    /// * `dir_url` - Directory URL
    ///
    /// # Returns
    /// The parsed listing. A non-200 status is `NotFound`; a body that is not
    /// UTF-8 or holds malformed records is `DataFormat`.
    pub async fn fetch_listing(&self, dir_url: &str) -> Result<Listing, VfsError> {
        let url: String = Self::listing_url(dir_url);
        let response: HttpResponse = self.client.get(&url).await?;

        if !response.is_success() {
            return Err(VfsError::NotFound(url));
        }

        Ok(terrafs_model::decode_listing_bytes(&response.body)?)
    }

    /// Fetch the whole content of a file.
    ///
    /// # Arguments
    /// * `path` - Absolute virtual path of the file
    ///
    /// # Returns
    /// The file bytes. A non-200 status is `NotFound`.
    pub async fn fetch_file(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let url: String = self.file_url(path);
        let response: HttpResponse = self.client.get(&url).await?;

        if !response.is_success() {
            return Err(VfsError::NotFound(path.to_string()));
        }
        Ok(response.into_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrafs_storage::MemoryHttpClient;

    const BASE: &str = "http://scenery.test/root";

    fn tree_with(client: Arc<MemoryHttpClient>) -> RemoteTree {
        RemoteTree::new(client, format!("{}/", BASE))
    }

    #[test]
    fn test_url_mapping() {
        let tree: RemoteTree = tree_with(Arc::new(MemoryHttpClient::new()));

        assert_eq!(tree.base_url(), BASE);
        assert_eq!(tree.directory_url("/"), BASE);
        assert_eq!(tree.directory_url(""), BASE);
        assert_eq!(tree.directory_url("/Terrain"), format!("{}/Terrain", BASE));
        assert_eq!(tree.directory_url("/Terrain/"), format!("{}/Terrain", BASE));
        assert_eq!(
            RemoteTree::listing_url(&tree.directory_url("/Terrain")),
            format!("{}/Terrain/.dirindex", BASE)
        );
        assert_eq!(tree.file_url("/Terrain/a.stg"), format!("{}/Terrain/a.stg", BASE));
    }

    #[tokio::test]
    async fn test_fetch_listing() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/.dirindex", BASE), "version:1\nd:Terrain\n");
        let tree: RemoteTree = tree_with(client);

        let listing: Listing = tree.fetch_listing(BASE).await.unwrap();
        assert_eq!(listing.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_listing_errors() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/bad/.dirindex", BASE), "f:a:x:notanumber\n");
        client.fail(format!("{}/down/.dirindex", BASE));
        let tree: RemoteTree = tree_with(client);

        let missing = tree.fetch_listing(&format!("{}/missing", BASE)).await;
        assert!(matches!(missing, Err(VfsError::NotFound(_))));

        let bad = tree.fetch_listing(&format!("{}/bad", BASE)).await;
        assert!(matches!(bad, Err(VfsError::DataFormat(_))));

        let down = tree.fetch_listing(&format!("{}/down", BASE)).await;
        assert!(matches!(down, Err(VfsError::Transport(_))));
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let client: Arc<MemoryHttpClient> = Arc::new(MemoryHttpClient::new());
        client.insert_ok(format!("{}/a.txt", BASE), "hello");
        let tree: RemoteTree = tree_with(client);

        assert_eq!(tree.fetch_file("/a.txt").await.unwrap(), b"hello".to_vec());
        let missing = tree.fetch_file("/b.txt").await;
        assert!(matches!(missing, Err(VfsError::NotFound(p)) if p == "/b.txt"));
    }
}
