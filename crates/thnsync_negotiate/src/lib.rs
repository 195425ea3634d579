//! # thnsync Negotiate
//!
//! Client side of chunk negotiation.
//!
//! Before uploading a CDC delta the client asks the remote which chunks it
//! already holds, partitions its chunk list into `present` and `missing`, and
//! uploads only the missing ones.
//!
//! ## Soft failures
//!
//! Negotiation never aborts the sync. Network errors, HTTP errors and
//! malformed responses become a [`Diagnostic`]; the public operations turn
//! that into an always-populated result and fall back to treating every chunk
//! as missing, so the worst case is uploading everything.
//!
//! ## Transport
//!
//! HTTP is abstracted behind [`HttpClient`]. [`UreqClient`] is the blocking
//! production client; [`LoopbackClient`] routes requests to an in-process
//! [`LoopbackServer`] for tests.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod capabilities;
mod config;
mod error;
mod http;
mod negotiator;

pub use capabilities::{check_payload_size, ensure_mode_supported, ModeDecision};
pub use config::{NegotiatorConfig, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT};
pub use error::{Diagnostic, DiagnosticKind, SoftResult};
pub use http::{HttpClient, HttpResponse, LoopbackClient, LoopbackServer, UreqClient};
pub use negotiator::{
    partition, ChunkNegotiator, ChunkSyncReport, Negotiation, NegotiationResult, Partition,
    UploadResult,
};
