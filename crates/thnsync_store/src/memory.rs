//! In-memory chunk store for testing.

use crate::error::{StoreError, StoreResult};
use crate::store::{validate_chunk_id, validate_target, ChunkStore};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// An in-memory chunk store.
///
/// Suitable for unit tests, integration tests and the in-process chunk
/// server. Thread-safe and shareable across threads.
#[derive(Debug, Default)]
pub struct InMemoryChunkStore {
    targets: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of chunks stored for `target`.
    pub fn len(&self, target: &str) -> usize {
        self.targets.read().get(target).map_or(0, BTreeMap::len)
    }

    /// Returns true if no chunk is stored under any target.
    pub fn is_empty(&self) -> bool {
        self.targets.read().values().all(BTreeMap::is_empty)
    }
}

impl ChunkStore for InMemoryChunkStore {
    fn write_chunk(&self, target: &str, id: &str, data: &[u8]) -> StoreResult<()> {
        validate_target(target)?;
        validate_chunk_id(id)?;
        self.targets
            .write()
            .entry(target.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| data.to_vec());
        Ok(())
    }

    fn contains(&self, target: &str, id: &str) -> StoreResult<bool> {
        validate_target(target)?;
        Ok(self
            .targets
            .read()
            .get(target)
            .is_some_and(|chunks| chunks.contains_key(id)))
    }

    fn get(&self, target: &str, id: &str) -> StoreResult<Vec<u8>> {
        validate_target(target)?;
        self.targets
            .read()
            .get(target)
            .and_then(|chunks| chunks.get(id).cloned())
            .ok_or_else(|| StoreError::not_found(target, id))
    }

    fn list(&self, target: &str) -> StoreResult<Vec<String>> {
        validate_target(target)?;
        Ok(self
            .targets
            .read()
            .get(target)
            .map(|chunks| chunks.keys().cloned().collect())
            .unwrap_or_default())
    }
}
