//! Chunk command implementation.

use serde::Serialize;
use std::fs::File;
use std::path::Path;
use thnsync_chunker::{compute_stats, Chunk, ChunkStats, Chunker, ChunkerConfig};

use crate::error::CliResult;
use crate::output::{emit, human_bytes};

/// Chunking result.
#[derive(Debug, Serialize)]
pub struct ChunkResult {
    /// File path.
    pub path: String,
    /// Minimum chunk size used.
    pub min_size: usize,
    /// Average chunk size used.
    pub avg_size: usize,
    /// Maximum chunk size used.
    pub max_size: usize,
    /// Chunks in file order.
    pub chunks: Vec<Chunk>,
    /// Summary statistics.
    pub stats: ChunkStats,
}

/// Runs the chunk command.
pub fn run(path: &Path, config: ChunkerConfig, json: bool) -> CliResult<bool> {
    let chunker = Chunker::new(config)?;
    let chunks = chunker.chunk_reader(File::open(path)?)?;
    let stats = compute_stats(&chunks);
    let result = ChunkResult {
        path: path.display().to_string(),
        min_size: config.min_size,
        avg_size: config.avg_size,
        max_size: config.max_size,
        chunks,
        stats,
    };
    emit(json, &result, render)?;
    Ok(true)
}

fn render(result: &ChunkResult) -> String {
    let mut out = format!(
        "{}: {} chunks, {} ({} unique, {} duplicate)\n",
        result.path,
        result.stats.chunk_count,
        human_bytes(result.stats.total_bytes),
        result.stats.unique_chunks,
        result.stats.dedup_hits,
    );
    for chunk in &result.chunks {
        out.push_str(&format!(
            "{:>12} {:>8} {}\n",
            chunk.offset, chunk.length, chunk.chunk_id
        ));
    }
    out
}
