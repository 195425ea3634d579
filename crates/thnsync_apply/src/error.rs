//! Error types for the apply engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use thnsync_manifest::{EnvelopeError, ManifestValidationError};
use thnsync_store::StoreError;

/// Result type for apply operations.
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Errors that can occur while applying.
///
/// Per-action failures are reported in the returned reports; this type
/// covers failures that prevent an apply from being attempted at all, and
/// the internal causes collected into those reports.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The plan document is not usable.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// The root directory cannot be used.
    #[error("invalid root {}: {reason}", path.display())]
    InvalidRoot {
        /// Offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// The manifest is invalid.
    #[error(transparent)]
    Validation(#[from] ManifestValidationError),

    /// Envelope I/O or payload failure.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Chunk store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApplyError {
    /// Creates an invalid plan error.
    pub fn invalid_plan(message: impl Into<String>) -> Self {
        Self::InvalidPlan(message.into())
    }
}
