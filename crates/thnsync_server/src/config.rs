//! Server configuration.

use thnsync_protocol::{Capabilities, DEFAULT_MAX_PAYLOAD_BYTES};

/// Default largest accepted chunk (4 MiB).
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 4 * 1024 * 1024;

/// Configuration for the chunk server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Largest chunk accepted by `put`.
    pub max_chunk_bytes: usize,
    /// Accepted target namespaces. Empty accepts any valid name.
    pub targets: Vec<String>,
    /// Envelope modes declared during negotiation.
    pub modes: Vec<String>,
    /// Whether uploads must be signed.
    pub signature_required: bool,
    /// Payload limit declared during negotiation.
    pub max_payload_bytes: u64,
    /// Version string declared during negotiation.
    pub remote_version: String,
}

impl ServerConfig {
    /// Creates a configuration serving only `web` in both modes.
    pub fn new() -> Self {
        Self {
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            targets: vec!["web".to_string()],
            modes: vec!["raw-zip".to_string(), "cdc-delta".to_string()],
            signature_required: false,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            remote_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Sets the chunk size limit.
    pub fn with_max_chunk_bytes(mut self, max: usize) -> Self {
        self.max_chunk_bytes = max;
        self
    }

    /// Sets the accepted targets.
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the declared modes.
    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes = modes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the declared payload limit.
    pub fn with_max_payload_bytes(mut self, max: u64) -> Self {
        self.max_payload_bytes = max;
        self
    }

    /// Requires signed uploads.
    pub fn with_signature_required(mut self, required: bool) -> Self {
        self.signature_required = required;
        self
    }

    /// Returns true if `target` is served.
    pub fn accepts_target(&self, target: &str) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| t == target)
    }

    /// Capabilities declared to clients.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            modes: self.modes.clone(),
            signature_required: self.signature_required,
            max_payload_bytes: self.max_payload_bytes,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
