//! # thnsync Chunker
//!
//! Content-defined chunking (CDC) for the thnsync delta transport.
//!
//! Input bytes are cut into variable-size chunks whose boundaries depend only
//! on local content, so an insertion near the start of a file shifts a single
//! boundary instead of every following chunk. Each chunk is identified by the
//! lowercase hex SHA-256 of its bytes.
//!
//! ## Boundary rule
//!
//! - A 32-bit Gear rolling hash is advanced one byte at a time
//! - No boundary is placed before `min_size` bytes
//! - A boundary is forced at `max_size` bytes
//! - Otherwise a boundary is placed when `hash & mask == 0`, where `mask`
//!   is derived from the highest set bit of `avg_size`
//! - The hash resets to zero after each boundary
//!
//! The same input and configuration always yield the same chunks, on every
//! platform. The streaming reader yields byte-identical results to the
//! whole-buffer API.
//!
//! ## Example
//!
//! ```rust
//! use thnsync_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(16, 32, 64)).unwrap();
//! let chunks = chunker.chunk_bytes(&[7u8; 200]);
//! let total: u64 = chunks.iter().map(|c| u64::from(c.length)).sum();
//! assert_eq!(total, 200);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunker;
mod config;
mod error;
mod gear;
mod stats;
mod stream;

pub use chunker::{chunk, chunk_id, Chunk, Chunker};
pub use config::{
    ChunkerConfig, DEFAULT_AVG_CHUNK_SIZE, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE,
};
pub use error::{ChunkerError, ChunkerResult};
pub use gear::GEAR_TABLE;
pub use stats::{compute_stats, ChunkStats};
pub use stream::{ChunkData, ChunkStream, STREAM_BLOCK_SIZE};
