//! Error types for the chunk server.

use thiserror::Error;
use thnsync_store::StoreError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a request.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A required header is absent.
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// The target namespace is not served.
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// The chunk exceeds the configured limit.
    #[error("Chunk of {size} bytes exceeds limit of {max} bytes")]
    ChunkTooLarge {
        /// Uploaded size.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// No route for the path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("Method {method} not allowed for {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Chunk store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServerError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) | ServerError::MissingHeader(_) => 400,
            ServerError::UnknownTarget(_) | ServerError::NotFound(_) => 404,
            ServerError::MethodNotAllowed { .. } => 405,
            ServerError::ChunkTooLarge { .. } => 413,
            ServerError::Store(e) => match e {
                StoreError::InvalidChunkId(_)
                | StoreError::InvalidTarget(_)
                | StoreError::HashMismatch { .. } => 400,
                StoreError::ChunkNotFound { .. } => 404,
                StoreError::Io(_) => 500,
            },
        }
    }

    /// Returns true if the client caused the error.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Returns true if the server caused the error.
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }
}
