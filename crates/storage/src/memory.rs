//! In-memory [`HttpClient`] with request accounting.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::TransportError;
use crate::traits::HttpClient;
use crate::types::HttpResponse;

/// HTTP client serving canned responses from memory.
///
/// Unknown URLs answer 404. Every call is counted per URL, which lets tests
/// assert how many network round-trips an operation made.
#[derive(Debug, Default)]
pub struct MemoryHttpClient {
    /// Canned responses by URL.
    responses: RwLock<HashMap<String, HttpResponse>>,
    /// URLs that fail at the transport level.
    failing: RwLock<HashSet<String>>,
    /// Request count by URL.
    counts: RwLock<HashMap<String, u64>>,
    /// Total number of requests.
    total: AtomicU64,
    /// Artificial delay applied to every request.
    latency: Option<Duration>,
}

impl MemoryHttpClient {
    /// Create an empty client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`.
    ///
    /// # Arguments
    /// * `latency` - Delay applied before each response
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serve `response` for `url`.
    ///
    /// # Arguments
    /// * `url` - Exact URL to match
    /// * `response` - Response to return
    pub fn insert(&self, url: impl Into<String>, response: HttpResponse) {
        self.responses.write().insert(url.into(), response);
    }

    /// Serve a 200 response with `body` for `url`.
    ///
    /// # Arguments
    /// * `url` - Exact URL to match
    /// * `body` - Response body
    pub fn insert_ok(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.insert(url, HttpResponse::ok(body));
    }

    /// Make requests for `url` fail without a response.
    ///
    /// # Arguments
    /// * `url` - Exact URL to fail
    pub fn fail(&self, url: impl Into<String>) {
        self.failing.write().insert(url.into());
    }

    /// Get the number of requests made for `url`.
    pub fn request_count(&self, url: &str) -> u64 {
        self.counts.read().get(url).copied().unwrap_or(0)
    }

    /// Get the total number of requests made.
    pub fn total_requests(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HttpClient for MemoryHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.counts.write().entry(url.to_string()).or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.read().contains(url) {
            return Err(TransportError::Request {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(self
            .responses
            .read()
            .get(url)
            .cloned()
            .unwrap_or_else(HttpResponse::not_found))
    }
}
