//! Property tests shared by both store implementations.

use proptest::prelude::*;
use tempfile::tempdir;
use thnsync_store::{ChunkStore, FileChunkStore, InMemoryChunkStore};

fn check_store(store: &dyn ChunkStore, blobs: &[Vec<u8>]) {
    let ids: Vec<String> = blobs.iter().map(|b| store.put("web", b).unwrap()).collect();
    for (id, blob) in ids.iter().zip(blobs) {
        assert!(store.contains("web", id).unwrap());
        assert_eq!(&store.get("web", id).unwrap(), blob);
    }
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(store.list("web").unwrap(), unique);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn memory_store_round_trips(blobs in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 1..8)) {
        check_store(&InMemoryChunkStore::new(), &blobs);
    }

    #[test]
    fn file_store_round_trips(blobs in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 1..8)) {
        let dir = tempdir().unwrap();
        check_store(&FileChunkStore::open(dir.path()).unwrap(), &blobs);
    }
}
