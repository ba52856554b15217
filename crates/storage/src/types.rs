//! Transport request/response types and settings.

use std::time::Duration;

/// The only status treated as success.
pub const STATUS_OK: u16 = 200;

/// Default cap on idle pooled connections per host.
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 2;

/// Response to a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Full response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a 200 response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(STATUS_OK, body)
    }

    /// Create an empty 404 response.
    pub fn not_found() -> Self {
        Self::new(404, Vec::new())
    }

    /// Check if the status is the designated success code.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Consume the response and return the body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Whole-request timeout. `None` leaves the client default (no timeout).
    pub timeout: Option<Duration>,
    /// Maximum idle pooled connections per host.
    pub max_idle_connections: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            user_agent: format!("terrafs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportSettings {
    /// Set the request timeout.
    ///
    /// # Arguments
    /// * `timeout` - Whole-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the idle connection cap.
    ///
    /// # Arguments
    /// * `max` - Maximum idle connections per host
    pub fn with_max_idle_connections(mut self, max: usize) -> Self {
        self.max_idle_connections = max;
        self
    }

    /// Set the User-Agent header.
    ///
    /// # Arguments
    /// * `user_agent` - Header value
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_is_200_only() {
        assert!(HttpResponse::ok("x").is_success());
        assert!(!HttpResponse::not_found().is_success());
        assert!(!HttpResponse::new(204, Vec::new()).is_success());
        assert!(!HttpResponse::new(301, Vec::new()).is_success());
    }

    #[test]
    fn test_settings_builder() {
        let settings: TransportSettings = TransportSettings::default()
            .with_timeout(Duration::from_secs(30))
            .with_max_idle_connections(8)
            .with_user_agent("test-agent");

        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.max_idle_connections, 8);
        assert_eq!(settings.user_agent, "test-agent");
    }

    #[test]
    fn test_settings_default() {
        let settings: TransportSettings = TransportSettings::default();
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.max_idle_connections, DEFAULT_MAX_IDLE_CONNECTIONS);
        assert!(settings.user_agent.starts_with("terrafs/"));
    }
}
