//! Capability negotiation.

use serde::{Deserialize, Serialize};

/// Payload limit assumed when the remote does not declare one (32 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// Version reported when the remote does not declare one.
pub const DEFAULT_REMOTE_VERSION: &str = "unknown";

fn default_modes() -> Vec<String> {
    vec!["raw-zip".to_string()]
}

fn default_max_payload() -> u64 {
    DEFAULT_MAX_PAYLOAD_BYTES
}

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    DEFAULT_REMOTE_VERSION.to_string()
}

/// Capabilities declared by a remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Supported envelope modes.
    #[serde(default = "default_modes")]
    pub modes: Vec<String>,
    /// Whether uploads must be signed.
    #[serde(default)]
    pub signature_required: bool,
    /// Largest accepted payload in bytes.
    #[serde(default = "default_max_payload")]
    pub max_payload_bytes: u64,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            signature_required: false,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl Capabilities {
    /// Returns true if `mode` is supported.
    pub fn supports(&self, mode: &str) -> bool {
        self.modes.iter().any(|m| m == mode)
    }
}

/// Body of a negotiation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationResponse {
    /// Whether the remote answered the negotiation.
    #[serde(default = "default_true")]
    pub success: bool,
    /// Remote software version.
    #[serde(default = "default_version")]
    pub remote_version: String,
    /// Declared capabilities.
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Targets the remote accepts.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Why negotiation fell back to defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NegotiationResponse {
    /// Conservative assumptions for a remote without a negotiation endpoint:
    /// raw-zip only, no signatures, 32 MiB, target `web`.
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            success: false,
            remote_version: default_version(),
            capabilities: Capabilities::default(),
            targets: vec!["web".to_string()],
            error: Some(error.into()),
        }
    }
}
