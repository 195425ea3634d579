//! Chunk store trait definition.

use crate::error::{StoreError, StoreResult};
use thnsync_chunker::chunk_id;

/// A content-addressed chunk store.
///
/// Chunks are immutable once written. Stores interpret neither manifests nor
/// chunk contents; they only map `(target, chunk_id)` to bytes.
///
/// # Invariants
///
/// - `put` returns the SHA-256 hex id of the bytes it was given
/// - Writing an existing chunk is a no-op and never overwrites
/// - `get` returns exactly the bytes that hash to the requested id
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryChunkStore`] - For testing
/// - [`super::FileChunkStore`] - For persistent storage
pub trait ChunkStore: Send + Sync {
    /// Stores `data` under its computed id and returns the id.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid target name or an I/O failure.
    fn put(&self, target: &str, data: &[u8]) -> StoreResult<String> {
        let id = chunk_id(data);
        self.write_chunk(target, &id, data)?;
        Ok(id)
    }

    /// Stores `data` under a caller-supplied id after verifying the hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HashMismatch`] when the bytes do not hash to
    /// `id`, or an error for invalid names and I/O failures.
    fn insert(&self, target: &str, id: &str, data: &[u8]) -> StoreResult<()> {
        validate_chunk_id(id)?;
        let actual = chunk_id(data);
        if actual != id {
            return Err(StoreError::HashMismatch {
                claimed: id.to_string(),
                actual,
            });
        }
        self.write_chunk(target, id, data)
    }

    /// Writes a chunk whose id the caller has already verified.
    ///
    /// Implementations must leave an existing chunk untouched.
    fn write_chunk(&self, target: &str, id: &str, data: &[u8]) -> StoreResult<()>;

    /// Returns true if the chunk exists.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid names.
    fn contains(&self, target: &str, id: &str) -> StoreResult<bool>;

    /// Loads a chunk's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ChunkNotFound`] if the chunk is absent.
    fn get(&self, target: &str, id: &str) -> StoreResult<Vec<u8>>;

    /// Lists the chunk ids stored for `target`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid target name or an I/O failure.
    fn list(&self, target: &str) -> StoreResult<Vec<String>>;
}

/// Returns true if `id` is 64 lowercase hex characters.
pub fn is_valid_chunk_id(id: &str) -> bool {
    id.len() == 64 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Checks a chunk id.
///
/// # Errors
///
/// Returns [`StoreError::InvalidChunkId`] unless the id is 64 lowercase hex
/// characters.
pub fn validate_chunk_id(id: &str) -> StoreResult<()> {
    if is_valid_chunk_id(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidChunkId(id.to_string()))
    }
}

/// Checks a target namespace name.
///
/// # Errors
///
/// Returns [`StoreError::InvalidTarget`] for empty names, `.`/`..`, or names
/// containing characters outside `[A-Za-z0-9._-]`.
pub fn validate_target(target: &str) -> StoreResult<()> {
    let ok = !target.is_empty()
        && target != "."
        && target != ".."
        && target
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidTarget(target.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_validation() {
        assert!(is_valid_chunk_id(&"a".repeat(64)));
        assert!(!is_valid_chunk_id(&"A".repeat(64)));
        assert!(!is_valid_chunk_id(&"a".repeat(63)));
        assert!(!is_valid_chunk_id("../../etc/passwd"));
        assert!(validate_chunk_id("zz").is_err());
    }

    #[test]
    fn target_validation() {
        assert!(validate_target("web").is_ok());
        assert!(validate_target("docs_v2.1-x").is_ok());
        assert!(validate_target("").is_err());
        assert!(validate_target("..").is_err());
        assert!(validate_target("a/b").is_err());
        assert!(validate_target("a\\b").is_err());
    }
}
