//! Diagnostics for soft negotiation failures.

use thiserror::Error;

/// Result of a fallible negotiation step.
pub type SoftResult<T> = Result<T, Diagnostic>;

/// Category of a negotiation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The request never produced an HTTP response.
    Network,
    /// The remote answered with a non-success status.
    Http,
    /// The body was not the expected JSON shape.
    InvalidResponse,
    /// The remote reported an error in a well-formed body.
    Remote,
    /// The request was refused locally before sending.
    Rejected,
}

/// A soft failure carrying a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Diagnostic {
    /// Failure category.
    pub kind: DiagnosticKind,
    /// Message reported to callers.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transport failure before any response.
    pub fn network(detail: impl std::fmt::Display) -> Self {
        Self::new(DiagnosticKind::Network, format!("Network error: {detail}"))
    }

    /// Non-success HTTP status.
    pub fn http(status: u16) -> Self {
        Self::new(DiagnosticKind::Http, format!("HTTPError: HTTP {status}"))
    }

    /// Body that is not valid JSON or has the wrong shape.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::InvalidResponse, message)
    }

    /// Error reported by the remote.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Remote, message)
    }
}
