//! # thnsync Protocol
//!
//! Wire types for the chunk negotiation protocol.
//!
//! This crate provides:
//! - Endpoint paths and header names
//! - `has` request/response bodies (JSON)
//! - `put` response body (the request body is the raw chunk)
//! - Capability negotiation response with conservative defaults
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ```text
//! POST {base}/sync/chunks/has    {"target": t, "chunks": [id, ...]}
//!                             -> {"success": true, "has": [...], "missing": [...]}
//! POST {base}/sync/chunks/put    X-THN-Target, X-THN-Chunk-ID, raw bytes
//!                             -> {"success": true} | {"success": false, "error": "..."}
//! GET  {base}/sync/negotiation   -> capabilities
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod capabilities;
mod messages;

pub use capabilities::{
    Capabilities, NegotiationResponse, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_REMOTE_VERSION,
};
pub use messages::{HasRequest, HasResponse, PutResponse};

/// Path of the chunk presence query.
pub const HAS_PATH: &str = "/sync/chunks/has";

/// Path of the chunk upload.
pub const PUT_PATH: &str = "/sync/chunks/put";

/// Path of the capability negotiation endpoint.
pub const NEGOTIATION_PATH: &str = "/sync/negotiation";

/// Header carrying the target namespace of an upload.
pub const HEADER_TARGET: &str = "X-THN-Target";

/// Header carrying the chunk id of an upload.
pub const HEADER_CHUNK_ID: &str = "X-THN-Chunk-ID";

/// Content type of JSON bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type of raw chunk bodies.
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";
