//! Error types for chunk store operations.

use std::io;
use thiserror::Error;

/// Result type for chunk store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during chunk store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The chunk is not present in the store.
    #[error("missing chunk {chunk_id} for target {target}")]
    ChunkNotFound {
        /// Target namespace.
        target: String,
        /// Requested chunk id.
        chunk_id: String,
    },

    /// The chunk id is not 64 lowercase hex characters.
    #[error("invalid chunk id: {0:?}")]
    InvalidChunkId(String),

    /// The target name is empty or contains characters outside `[A-Za-z0-9._-]`.
    #[error("invalid target name: {0:?}")]
    InvalidTarget(String),

    /// The bytes do not hash to the claimed chunk id.
    #[error("chunk hash mismatch: claimed {claimed}, actual {actual}")]
    HashMismatch {
        /// Id supplied by the caller.
        claimed: String,
        /// Id computed from the bytes.
        actual: String,
    },
}

impl StoreError {
    /// Creates a chunk-not-found error.
    pub fn not_found(target: impl Into<String>, chunk_id: impl Into<String>) -> Self {
        Self::ChunkNotFound {
            target: target.into(),
            chunk_id: chunk_id.into(),
        }
    }

    /// Returns true if the error means the chunk is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ChunkNotFound { .. })
    }
}
