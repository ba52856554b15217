//! Transport error types.

use thiserror::Error;

/// Failure to obtain an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Request could not be sent or no response arrived.
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// Response body could not be read.
    #[error("Reading body from {url} failed: {message}")]
    Body { url: String, message: String },

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl TransportError {
    /// Get the URL the failure relates to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            TransportError::Request { url, .. } | TransportError::Body { url, .. } => Some(url),
            TransportError::Client(_) => None,
        }
    }
}
