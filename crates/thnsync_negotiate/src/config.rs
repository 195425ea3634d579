//! Configuration for the negotiation client.

use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default cap on response bodies read into memory (16 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;

/// Configuration for [`crate::ChunkNegotiator`] and [`crate::UreqClient`].
#[derive(Debug, Clone)]
pub struct NegotiatorConfig {
    /// Base URL of the remote host (e.g. `https://sync.example.com`).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Largest response body read into memory.
    pub max_response_bytes: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl NegotiatorConfig {
    /// Creates a configuration for `base_url` with default limits.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            user_agent: format!("thnsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the response size cap.
    pub fn with_max_response_bytes(mut self, bytes: u64) -> Self {
        self.max_response_bytes = bytes;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Joins the base URL and an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8765")
    }
}
