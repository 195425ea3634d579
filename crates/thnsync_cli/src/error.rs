//! CLI error type.

use std::io;
use thiserror::Error;

/// Result type for commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that stop a command before it can report.
#[derive(Debug, Error)]
pub enum CliError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid chunker configuration.
    #[error(transparent)]
    Chunker(#[from] thnsync_chunker::ChunkerError),

    /// Envelope could not be built, read or written.
    #[error(transparent)]
    Envelope(#[from] thnsync_manifest::EnvelopeError),

    /// Chunk store failure.
    #[error(transparent)]
    Store(#[from] thnsync_store::StoreError),

    /// Apply could not start.
    #[error(transparent)]
    Apply(#[from] thnsync_apply::ApplyError),

    /// The command line does not make sense.
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}
