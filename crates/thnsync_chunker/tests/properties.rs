//! Property tests for chunk boundaries.

use proptest::prelude::*;
use thnsync_chunker::{chunk_id, Chunker, ChunkerConfig};

fn bounds() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..64, 0usize..64, 0usize..128).prop_map(|(min, extra_avg, extra_max)| {
        let avg = min + extra_avg;
        (min, avg, avg + extra_max)
    })
}

proptest! {
    #[test]
    fn chunks_cover_input_exactly(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        (min, avg, max) in bounds(),
    ) {
        let chunker = Chunker::new(ChunkerConfig::new(min, avg, max)).unwrap();
        let chunks = chunker.split(&data);

        let mut offset = 0u64;
        let mut rebuilt = Vec::with_capacity(data.len());
        for (i, (chunk, bytes)) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.offset, offset);
            prop_assert_eq!(chunk.length as usize, bytes.len());
            prop_assert!(chunk.length as usize <= max);
            if i + 1 < chunks.len() {
                prop_assert!(chunk.length as usize >= min);
            }
            prop_assert_eq!(&chunk.chunk_id, &chunk_id(bytes));
            offset += u64::from(chunk.length);
            rebuilt.extend_from_slice(bytes);
        }
        prop_assert_eq!(rebuilt, data);
    }

    #[test]
    fn stream_is_byte_identical(
        data in prop::collection::vec(any::<u8>(), 0..8192),
        (min, avg, max) in bounds(),
        start in 0u64..1_000_000,
    ) {
        let chunker = Chunker::new(ChunkerConfig::new(min, avg, max)).unwrap();
        let expected = chunker.chunk_bytes_at(&data, start);
        let streamed: Vec<_> = chunker
            .stream_at(&data[..], start)
            .map(|item| item.map(|d| d.chunk))
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(streamed, expected);
    }

    #[test]
    fn deterministic(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let chunker = Chunker::new(ChunkerConfig::new(8, 32, 96)).unwrap();
        prop_assert_eq!(chunker.chunk_bytes(&data), chunker.chunk_bytes(&data));
    }
}

#[test]
fn default_bounds_split_large_input() {
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let data: Vec<u8> = (0..200_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
    let chunks = chunker.chunk_bytes(&data);
    assert!(chunks.len() >= 4);
    assert!(chunks.iter().all(|c| c.length as usize <= 64 * 1024));
    let total: u64 = chunks.iter().map(|c| u64::from(c.length)).sum();
    assert_eq!(total, 200_000);
}
