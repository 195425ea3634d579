//! # thnsync Server
//!
//! Reference chunk server for the thnsync negotiation protocol.
//!
//! This crate provides:
//! - Request routing for `has`, `put` and `negotiation`
//! - Hash and size verification of uploaded chunks
//! - Capability declaration (modes, payload limit, targets)
//!
//! The server is transport-agnostic: it turns a [`ServerRequest`] into a
//! [`ServerResponse`] and leaves sockets to the embedding application. Tests
//! drive it in-process.
//!
//! ```rust
//! use std::sync::Arc;
//! use thnsync_server::{ChunkServer, ServerConfig, ServerRequest};
//! use thnsync_store::InMemoryChunkStore;
//!
//! let server = ChunkServer::new(ServerConfig::default(), Arc::new(InMemoryChunkStore::new()));
//! let response = server.handle(&ServerRequest::get("/sync/negotiation"));
//! assert_eq!(response.status, 200);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;

pub use config::{ServerConfig, DEFAULT_MAX_CHUNK_BYTES};
pub use error::{ServerError, ServerResult};
pub use handler::{RequestHandler, ServerStats};
pub use server::{ChunkServer, ServerRequest, ServerResponse};
