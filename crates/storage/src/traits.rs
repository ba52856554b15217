//! Transport trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::HttpResponse;

/// GET-only HTTP client used for listings and whole-file content.
///
/// Implementations perform exactly one attempt per call. Retries, if any, are
/// the caller's business.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a URL.
    ///
    /// # Arguments
    /// * `url` - Absolute URL to fetch
    ///
    /// # Returns
    /// The status code and full body. Non-success statuses are returned as
    /// responses, not errors.
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}
