//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of a `has` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasRequest {
    /// Target namespace.
    pub target: String,
    /// Chunk ids to check, in caller order.
    pub chunks: Vec<String>,
}

impl HasRequest {
    /// Creates a new query.
    pub fn new(target: impl Into<String>, chunks: Vec<String>) -> Self {
        Self {
            target: target.into(),
            chunks,
        }
    }
}

/// Body of a `has` response.
///
/// Every field is optional on the wire; a response carrying only `has` and
/// `missing` is well-formed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasResponse {
    /// Explicit success flag, when the remote sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Ids the remote already holds.
    #[serde(default)]
    pub has: Vec<String>,
    /// Ids the remote lacks.
    #[serde(default)]
    pub missing: Vec<String>,
    /// Remote-reported error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HasResponse {
    /// Creates a successful response.
    pub fn success(has: Vec<String>, missing: Vec<String>) -> Self {
        Self {
            success: Some(true),
            has,
            missing,
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            has: Vec::new(),
            missing: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Returns true unless the remote explicitly reported failure.
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(true) && self.error.is_none()
    }
}

/// Body of a `put` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    /// Whether the chunk was stored (or already present).
    #[serde(default)]
    pub success: bool,
    /// Echo of the stored chunk id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    /// Remote-reported error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PutResponse {
    /// Creates a successful response.
    pub fn stored(chunk_id: impl Into<String>) -> Self {
        Self {
            success: true,
            chunk_id: Some(chunk_id.into()),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            chunk_id: None,
            error: Some(message.into()),
        }
    }
}
