//! Error types for manifest validation and envelope I/O.

use serde_json::Value;
use std::io;
use thiserror::Error;

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// A manifest failed structural validation.
///
/// Each variant is one failure reason; `Display` yields the human-readable
/// reason reported to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifestValidationError {
    /// The manifest is not a JSON object.
    #[error("Manifest must be a dictionary")]
    NotAnObject,

    /// `version` is absent or not 2.
    #[error("Unsupported manifest version: {0} (expected 2)")]
    UnsupportedVersion(Value),

    /// `mode` is absent or not a known mode.
    #[error("Unsupported manifest mode: {0}. Valid modes: [\"cdc-delta\", \"raw-zip\"]")]
    UnsupportedMode(Value),

    /// A required raw-zip field is absent.
    #[error("raw-zip manifest missing '{0}'")]
    MissingField(&'static str),

    /// `file_count` is not a non-negative integer.
    #[error("Invalid file_count: {0}")]
    InvalidFileCount(Value),

    /// `total_size` is not a non-negative integer.
    #[error("Invalid total_size: {0}")]
    InvalidTotalSize(Value),

    /// `file_hashes` is present but not a mapping.
    #[error("'file_hashes' must be a dict")]
    InvalidFileHashes,

    /// A `file_hashes` value is not a string.
    #[error("'file_hashes' entry for {0:?} must be a hash string")]
    InvalidFileHash(String),

    /// `files` is absent or not a list.
    #[error("cdc-delta manifest must contain 'files' as a list")]
    FilesNotList,

    /// A `files` entry is not an object.
    #[error("Each file entry must be a dict")]
    FileEntryNotObject,

    /// A `files` entry has no usable path.
    #[error("Each file entry must contain 'path' as a non-empty string")]
    InvalidFilePath,

    /// A `files` entry has a missing, negative or non-integer size.
    #[error("File entry for path {path:?} has invalid size: {size}")]
    InvalidFileSize {
        /// Entry path.
        path: String,
        /// Offending size value.
        size: Value,
    },

    /// A known optional field has the wrong shape for typed decoding.
    #[error("Malformed manifest: {0}")]
    Malformed(String),
}

/// Errors that can occur while building, reading or writing envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest failed validation.
    #[error("invalid manifest: {0}")]
    Invalid(#[from] ManifestValidationError),

    /// The archive has no `manifest.json`.
    #[error("envelope is missing 'manifest.json'")]
    MissingManifest,

    /// An archive entry has an unusable name.
    #[error("invalid envelope entry: {0}")]
    InvalidEntry(String),

    /// Payload bytes disagree with the manifest.
    #[error("payload mismatch: {0}")]
    PayloadMismatch(String),

    /// Chunking a source file failed.
    #[error("chunking failed: {0}")]
    Chunker(#[from] thnsync_chunker::ChunkerError),
}

impl EnvelopeError {
    /// Creates a payload mismatch error.
    pub fn payload_mismatch(message: impl Into<String>) -> Self {
        Self::PayloadMismatch(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reason_messages() {
        assert_eq!(
            ManifestValidationError::UnsupportedVersion(json!(3)).to_string(),
            "Unsupported manifest version: 3 (expected 2)"
        );
        assert_eq!(
            ManifestValidationError::UnsupportedVersion(Value::Null).to_string(),
            "Unsupported manifest version: null (expected 2)"
        );
        assert_eq!(
            ManifestValidationError::MissingField("file_count").to_string(),
            "raw-zip manifest missing 'file_count'"
        );
        assert_eq!(
            ManifestValidationError::InvalidFileSize {
                path: "a.txt".into(),
                size: json!(-1)
            }
            .to_string(),
            "File entry for path \"a.txt\" has invalid size: -1"
        );
    }

    #[test]
    fn envelope_error_wraps_validation() {
        let err = EnvelopeError::from(ManifestValidationError::NotAnObject);
        assert_eq!(
            err.to_string(),
            "invalid manifest: Manifest must be a dictionary"
        );
    }
}
