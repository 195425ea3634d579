//! File-based chunk store for persistent storage.

use crate::error::{StoreError, StoreResult};
use crate::store::{validate_chunk_id, validate_target, ChunkStore};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// A sharded on-disk chunk store.
///
/// Layout: `<root>/<target>/<first two hex chars>/<chunk_id>`. New chunks are
/// written to a temporary sibling file and renamed into place, so a reader
/// never observes a partially written chunk.
///
/// # Example
///
/// ```no_run
/// use thnsync_store::{ChunkStore, FileChunkStore};
/// use std::path::Path;
///
/// let store = FileChunkStore::open(Path::new("/var/lib/thn/sync/chunks")).unwrap();
/// let id = store.put("web", b"persistent chunk").unwrap();
/// assert!(store.contains("web", &id).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct FileChunkStore {
    root: PathBuf,
}

impl FileChunkStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the on-disk location of a chunk.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid target or chunk id.
    pub fn chunk_path(&self, target: &str, id: &str) -> StoreResult<PathBuf> {
        validate_target(target)?;
        validate_chunk_id(id)?;
        Ok(self.root.join(target).join(&id[..2]).join(id))
    }
}

impl ChunkStore for FileChunkStore {
    fn write_chunk(&self, target: &str, id: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.chunk_path(target, id)?;
        if path.is_file() {
            return Ok(());
        }
        let shard = path
            .parent()
            .ok_or_else(|| StoreError::InvalidChunkId(id.to_string()))?;
        fs::create_dir_all(shard)?;

        let temp = shard.join(format!(".{}.tmp-{}", id, Uuid::new_v4().simple()));
        let mut file = File::create(&temp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        if path.is_file() {
            // Another writer landed the same content first.
            let _ = fs::remove_file(&temp);
            return Ok(());
        }
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        debug!(target_name = target, chunk_id = id, bytes = data.len(), "stored chunk");
        Ok(())
    }

    fn contains(&self, target: &str, id: &str) -> StoreResult<bool> {
        if validate_chunk_id(id).is_err() {
            validate_target(target)?;
            return Ok(false);
        }
        Ok(self.chunk_path(target, id)?.is_file())
    }

    fn get(&self, target: &str, id: &str) -> StoreResult<Vec<u8>> {
        let path = match self.chunk_path(target, id) {
            Ok(path) => path,
            Err(StoreError::InvalidChunkId(_)) => return Err(StoreError::not_found(target, id)),
            Err(e) => return Err(e),
        };
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::not_found(target, id)),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, target: &str) -> StoreResult<Vec<String>> {
        validate_target(target)?;
        let base = self.root.join(target);
        let mut ids = Vec::new();
        let shards = match fs::read_dir(&base) {
            Ok(shards) => shards,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        for shard in shards {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                if let Some(name) = entry.file_name().to_str() {
                    if crate::store::is_valid_chunk_id(name) {
                        ids.push(name.to_string());
                    }
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
