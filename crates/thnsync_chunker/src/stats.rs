//! Chunk statistics for inspection output.

use crate::chunker::Chunk;
use serde::Serialize;
use std::collections::HashSet;

/// Summary of a chunk list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkStats {
    /// Number of chunks.
    pub chunk_count: usize,
    /// Number of distinct chunk ids.
    pub unique_chunks: usize,
    /// Chunks whose id was already seen earlier in the list.
    pub dedup_hits: usize,
    /// Sum of chunk lengths.
    pub total_bytes: u64,
    /// Sum of lengths of distinct chunks.
    pub unique_bytes: u64,
}

/// Computes statistics over `chunks`.
pub fn compute_stats<'a, I>(chunks: I) -> ChunkStats
where
    I: IntoIterator<Item = &'a Chunk>,
{
    let mut seen = HashSet::new();
    let mut stats = ChunkStats::default();
    for chunk in chunks {
        stats.chunk_count += 1;
        stats.total_bytes += u64::from(chunk.length);
        if seen.insert(chunk.chunk_id.as_str()) {
            stats.unique_bytes += u64::from(chunk.length);
        } else {
            stats.dedup_hits += 1;
        }
    }
    stats.unique_chunks = seen.len();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, length: u32) -> Chunk {
        Chunk {
            offset: 0,
            length,
            chunk_id: id.to_string(),
        }
    }

    #[test]
    fn empty_stats() {
        assert_eq!(compute_stats(&Vec::<Chunk>::new()), ChunkStats::default());
    }

    #[test]
    fn counts_duplicates() {
        let chunks = vec![chunk("a", 10), chunk("b", 5), chunk("a", 10)];
        let stats = compute_stats(&chunks);
        assert_eq!(stats.chunk_count, 3);
        assert_eq!(stats.unique_chunks, 2);
        assert_eq!(stats.dedup_hits, 1);
        assert_eq!(stats.total_bytes, 25);
        assert_eq!(stats.unique_bytes, 15);
    }
}
