//! `reqwest` backend for the [`HttpClient`] trait.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::traits::HttpClient;
use crate::types::{HttpResponse, TransportSettings};

/// HTTP(S) client backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    /// Underlying pooled client.
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client from transport settings.
    ///
    /// # Arguments
    /// * `settings` - Timeout, connection pool and User-Agent settings
    pub fn new(settings: TransportSettings) -> Result<Self, TransportError> {
        let mut builder: reqwest::ClientBuilder = reqwest::Client::builder()
            .pool_max_idle_per_host(settings.max_idle_connections)
            .user_agent(settings.user_agent);

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        let client: reqwest::Client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        tracing::trace!("GET {}", url);

        let response: reqwest::Response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| TransportError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        let status: u16 = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| TransportError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
