//! # thnsync Store
//!
//! Content-addressed chunk storage for the thnsync delta transport.
//!
//! Chunks are keyed by the lowercase hex SHA-256 of their bytes and grouped
//! into per-target namespaces. Stores are **append-only byte stores**: a chunk
//! that already exists is never rewritten, so concurrent writers of the same
//! chunk cannot corrupt each other.
//!
//! ## Available Stores
//!
//! - [`InMemoryChunkStore`] - For testing and the in-process chunk server
//! - [`FileChunkStore`] - Sharded on-disk layout `<root>/<target>/<xx>/<id>`
//!
//! ## Example
//!
//! ```rust
//! use thnsync_store::{ChunkStore, InMemoryChunkStore};
//!
//! let store = InMemoryChunkStore::new();
//! let id = store.put("web", b"hello world").unwrap();
//! assert!(store.contains("web", &id).unwrap());
//! assert_eq!(store.get("web", &id).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileChunkStore;
pub use memory::InMemoryChunkStore;
pub use store::{is_valid_chunk_id, validate_chunk_id, validate_target, ChunkStore};
