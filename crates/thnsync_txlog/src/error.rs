//! Error types for TXLOG writing.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for TXLOG operations.
pub type TxLogResult<T> = Result<T, TxLogError>;

/// Errors that can occur while writing a TXLOG.
#[derive(Debug, Error)]
pub enum TxLogError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another writer holds the log file.
    #[error("txlog file is locked: {}", .0.display())]
    Locked(PathBuf),

    /// The operation name cannot be used in a file name.
    #[error("invalid txlog operation name: {0:?}")]
    InvalidOp(String),
}
