//! Error types for chunking operations.

use std::io;
use thiserror::Error;

/// Result type for chunking operations.
pub type ChunkerResult<T> = Result<T, ChunkerError>;

/// Errors that can occur while chunking.
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// The size bounds do not satisfy `0 < min <= avg <= max`.
    #[error("invalid chunker configuration: {0}")]
    InvalidConfig(String),

    /// Reading from the input stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ChunkerError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ChunkerError::invalid_config("min must be positive");
        assert_eq!(
            err.to_string(),
            "invalid chunker configuration: min must be positive"
        );
        assert!(err.is_config_error());

        let err = ChunkerError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(err.to_string().contains("boom"));
        assert!(!err.is_config_error());
    }
}
