//! Whole-buffer content-defined chunking.

use crate::config::ChunkerConfig;
use crate::error::ChunkerResult;
use crate::gear::roll;
use crate::stream::ChunkStream;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;

/// A contiguous chunk of the input.
///
/// `offset` is absolute within the logical input (including any start
/// offset passed to the chunker). `chunk_id` is the lowercase hex SHA-256
/// of the chunk bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    /// Absolute offset of the first byte.
    pub offset: u64,
    /// Number of bytes in the chunk.
    pub length: u32,
    /// Lowercase hex SHA-256 of the chunk bytes.
    pub chunk_id: String,
}

impl Chunk {
    /// Returns the offset one past the last byte.
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.length)
    }
}

/// Returns the chunk id (lowercase hex SHA-256) of `data`.
pub fn chunk_id(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Boundary decision shared by the buffer and streaming paths.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Boundary {
    min: usize,
    max: usize,
    mask: u32,
}

impl Boundary {
    pub(crate) fn new(config: &ChunkerConfig) -> Self {
        Self {
            min: config.min_size,
            max: config.max_size,
            mask: config.mask(),
        }
    }

    /// Returns true when a chunk of `len` bytes with rolling `hash` ends here.
    #[inline]
    pub(crate) fn is_cut(&self, hash: u32, len: usize) -> bool {
        if len < self.min {
            return false;
        }
        if len >= self.max {
            return true;
        }
        hash & self.mask == 0
    }
}

/// A validated content-defined chunker.
///
/// # Example
///
/// ```rust
/// use thnsync_chunker::{Chunker, ChunkerConfig};
///
/// let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
/// assert!(chunker.chunk_bytes(b"").is_empty());
/// assert_eq!(chunker.chunk_bytes(b"hello").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    boundary: Boundary,
}

impl Chunker {
    /// Creates a chunker after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChunkerError::InvalidConfig`] for invalid bounds.
    pub fn new(config: ChunkerConfig) -> ChunkerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            boundary: Boundary::new(&config),
        })
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunks `data` with offsets starting at zero.
    pub fn chunk_bytes(&self, data: &[u8]) -> Vec<Chunk> {
        self.chunk_bytes_at(data, 0)
    }

    /// Chunks `data` with offsets starting at `start_offset`.
    pub fn chunk_bytes_at(&self, data: &[u8], start_offset: u64) -> Vec<Chunk> {
        self.split_at(data, start_offset)
            .into_iter()
            .map(|(chunk, _)| chunk)
            .collect()
    }

    /// Chunks `data` and pairs every chunk with its bytes.
    pub fn split<'a>(&self, data: &'a [u8]) -> Vec<(Chunk, &'a [u8])> {
        self.split_at(data, 0)
    }

    fn split_at<'a>(&self, data: &'a [u8], start_offset: u64) -> Vec<(Chunk, &'a [u8])> {
        let mut out = Vec::new();
        let mut chunk_start = 0usize;
        let mut hash = 0u32;

        for (pos, byte) in data.iter().enumerate() {
            hash = roll(hash, *byte);
            let len = pos + 1 - chunk_start;
            if self.boundary.is_cut(hash, len) {
                out.push(make_chunk(data, chunk_start, pos + 1, start_offset));
                chunk_start = pos + 1;
                hash = 0;
            }
        }

        if chunk_start < data.len() {
            out.push(make_chunk(data, chunk_start, data.len(), start_offset));
        }

        tracing::trace!(
            bytes = data.len(),
            chunks = out.len(),
            "chunked buffer"
        );
        out
    }

    /// Returns a streaming iterator over `reader`.
    ///
    /// The stream yields exactly the chunks [`Chunker::chunk_bytes`] would
    /// produce for the full contents of `reader`.
    pub fn stream<R: Read>(&self, reader: R) -> ChunkStream<R> {
        ChunkStream::new(reader, self.boundary, 0)
    }

    /// Returns a streaming iterator whose offsets start at `start_offset`.
    pub fn stream_at<R: Read>(&self, reader: R, start_offset: u64) -> ChunkStream<R> {
        ChunkStream::new(reader, self.boundary, start_offset)
    }

    /// Chunks everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChunkerError::Io`] if reading fails.
    pub fn chunk_reader<R: Read>(&self, reader: R) -> ChunkerResult<Vec<Chunk>> {
        self.stream(reader)
            .map(|item| item.map(|data| data.chunk))
            .collect()
    }
}

fn make_chunk(data: &[u8], start: usize, end: usize, base: u64) -> (Chunk, &[u8]) {
    let block = &data[start..end];
    let chunk = Chunk {
        offset: base + start as u64,
        // Chunk length never exceeds max_size, which validation bounds to u32.
        length: block.len() as u32,
        chunk_id: chunk_id(block),
    };
    (chunk, block)
}

/// Chunks `data` with explicit size bounds.
///
/// # Errors
///
/// Returns [`crate::ChunkerError::InvalidConfig`] unless
/// `0 < min_size <= avg_size <= max_size`.
pub fn chunk(
    data: &[u8],
    min_size: usize,
    avg_size: usize,
    max_size: usize,
) -> ChunkerResult<Vec<Chunk>> {
    let chunker = Chunker::new(ChunkerConfig::new(min_size, avg_size, max_size))?;
    Ok(chunker.chunk_bytes(data))
}
