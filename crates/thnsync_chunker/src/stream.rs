//! Streaming content-defined chunking.

use crate::chunker::{chunk_id, Boundary, Chunk};
use crate::error::ChunkerResult;
use crate::gear::roll;
use std::io::{ErrorKind, Read};

/// Size of each read from the underlying reader.
pub const STREAM_BLOCK_SIZE: usize = 64 * 1024;

/// A chunk together with its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkData {
    /// Chunk metadata.
    pub chunk: Chunk,
    /// The chunk bytes.
    pub data: Vec<u8>,
}

/// Iterator producing chunks from a reader without buffering the whole input.
///
/// Memory use is bounded by one read block plus one chunk. Boundaries are
/// identical to the whole-buffer chunker regardless of how the reader splits
/// its reads.
pub struct ChunkStream<R> {
    reader: R,
    boundary: Boundary,
    block: Vec<u8>,
    pos: usize,
    filled: usize,
    current: Vec<u8>,
    hash: u32,
    offset: u64,
    done: bool,
}

impl<R: Read> ChunkStream<R> {
    pub(crate) fn new(reader: R, boundary: Boundary, start_offset: u64) -> Self {
        Self {
            reader,
            boundary,
            block: vec![0u8; STREAM_BLOCK_SIZE],
            pos: 0,
            filled: 0,
            current: Vec::new(),
            hash: 0,
            offset: start_offset,
            done: false,
        }
    }

    fn emit(&mut self) -> ChunkData {
        let data = std::mem::take(&mut self.current);
        let chunk = Chunk {
            offset: self.offset,
            length: data.len() as u32,
            chunk_id: chunk_id(&data),
        };
        self.offset += data.len() as u64;
        self.hash = 0;
        ChunkData { chunk, data }
    }

    fn fill(&mut self) -> ChunkerResult<usize> {
        loop {
            match self.reader.read(&mut self.block) {
                Ok(n) => {
                    self.pos = 0;
                    self.filled = n;
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> Iterator for ChunkStream<R> {
    type Item = ChunkerResult<ChunkData>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            while self.pos < self.filled {
                let byte = self.block[self.pos];
                self.pos += 1;
                self.current.push(byte);
                self.hash = roll(self.hash, byte);
                if self.boundary.is_cut(self.hash, self.current.len()) {
                    return Some(Ok(self.emit()));
                }
            }

            match self.fill() {
                Ok(0) => {
                    self.done = true;
                    if self.current.is_empty() {
                        return None;
                    }
                    return Some(Ok(self.emit()));
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
