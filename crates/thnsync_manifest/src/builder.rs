//! Envelope construction from a source tree.

use crate::envelope::Envelope;
use crate::error::EnvelopeResult;
use crate::manifest::{
    CdcDeltaManifest, FileEntry, Manifest, RawZipManifest, SnapshotIndex, MANIFEST_VERSION,
};
use crate::source::scan_source_tree;
use serde_json::Map;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::Path;
use thnsync_chunker::Chunker;
use tracing::info;

/// Returns the lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Builds a `raw-zip` envelope carrying every file under `source_root`.
///
/// # Errors
///
/// Returns an error if the tree cannot be scanned or a file read.
pub fn build_raw_envelope(source_root: &Path, target: Option<&str>) -> EnvelopeResult<Envelope> {
    let mut files = BTreeMap::new();
    let mut hashes = BTreeMap::new();
    let mut total_size = 0u64;

    for source in scan_source_tree(source_root)? {
        let data = fs::read(&source.abs_path)?;
        total_size += data.len() as u64;
        hashes.insert(source.rel_path.clone(), sha256_hex(&data));
        files.insert(source.rel_path, data);
    }

    let manifest = RawZipManifest {
        version: MANIFEST_VERSION,
        file_count: files.len() as u64,
        total_size,
        file_hashes: Some(hashes),
        target: target.map(str::to_string),
        meta: Map::new(),
    };
    info!(
        files = files.len(),
        bytes = total_size,
        "built raw-zip envelope"
    );
    Ok(Envelope {
        manifest: Manifest::RawZip(manifest),
        files,
        chunks: BTreeMap::new(),
    })
}

/// Builds a `cdc-delta` envelope for `source_root`.
///
/// Every file is chunked with `chunker`. When `previous` is given, files
/// whose chunk list is unchanged are omitted and files that disappeared are
/// emitted as delete entries. Chunk bytes are de-duplicated across files.
///
/// # Errors
///
/// Returns an error if the tree cannot be scanned or a file read.
pub fn build_cdc_envelope(
    source_root: &Path,
    target: Option<&str>,
    chunker: &Chunker,
    previous: Option<&SnapshotIndex>,
) -> EnvelopeResult<Envelope> {
    let mut manifest = CdcDeltaManifest::new(target.map(str::to_string));
    let mut chunks = BTreeMap::new();
    let mut current = BTreeSet::new();
    let mut total_size = 0u64;
    let mut unchanged = 0usize;

    for source in scan_source_tree(source_root)? {
        current.insert(source.rel_path.clone());

        let mut file_hasher = Sha256::new();
        let mut ids = Vec::new();
        let mut file_chunks = Vec::new();
        let mut size = 0u64;
        for item in chunker.stream(File::open(&source.abs_path)?) {
            let item = item?;
            file_hasher.update(&item.data);
            size += item.data.len() as u64;
            ids.push(item.chunk.chunk_id.clone());
            file_chunks.push((item.chunk.chunk_id, item.data));
        }

        if previous.and_then(|p| p.get(&source.rel_path)) == Some(&ids) {
            unchanged += 1;
            continue;
        }

        for (id, data) in file_chunks {
            chunks.entry(id).or_insert(data);
        }
        total_size += size;
        manifest.files.push(
            FileEntry::write(source.rel_path, size, ids)
                .with_sha256(hex::encode(file_hasher.finalize())),
        );
    }

    if let Some(previous) = previous {
        for path in previous.keys().filter(|p| !current.contains(*p)) {
            manifest.files.push(FileEntry::delete(path.clone()));
        }
    }

    manifest.total_size = Some(total_size);
    info!(
        entries = manifest.files.len(),
        unchanged,
        chunks = chunks.len(),
        bytes = total_size,
        "built cdc-delta envelope"
    );
    Ok(Envelope {
        manifest: Manifest::CdcDelta(manifest),
        files: BTreeMap::new(),
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FileOp;
    use tempfile::tempdir;
    use thnsync_chunker::ChunkerConfig;

    fn chunker() -> Chunker {
        Chunker::new(ChunkerConfig::new(4, 8, 16)).unwrap()
    }

    #[test]
    fn raw_envelope_counts_and_hashes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.bin"), [0u8; 10]).unwrap();

        let envelope = build_raw_envelope(dir.path(), Some("web")).unwrap();
        let Manifest::RawZip(m) = &envelope.manifest else {
            panic!("expected raw-zip");
        };
        assert_eq!(m.file_count, 2);
        assert_eq!(m.total_size, 13);
        assert_eq!(m.target.as_deref(), Some("web"));
        assert_eq!(m.file_hashes.as_ref().unwrap()["a.txt"], sha256_hex(b"abc"));
        envelope.verify_payload().unwrap();
    }

    #[test]
    fn cdc_envelope_dedups_chunks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), [1u8; 64]).unwrap();
        fs::write(dir.path().join("b"), [1u8; 64]).unwrap();

        let envelope = build_cdc_envelope(dir.path(), None, &chunker(), None).unwrap();
        let Manifest::CdcDelta(m) = &envelope.manifest else {
            panic!("expected cdc-delta");
        };
        assert_eq!(m.files.len(), 2);
        assert_eq!(m.files[0].chunks, m.files[1].chunks);
        // Identical 16-byte blocks collapse to one stored chunk.
        assert_eq!(envelope.chunks.len(), 1);
        assert_eq!(m.total_size, Some(128));
        envelope.verify_payload().unwrap();
    }

    #[test]
    fn cdc_delta_against_previous() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("same.txt"), b"unchanged content").unwrap();
        fs::write(dir.path().join("edit.txt"), b"version one").unwrap();
        fs::write(dir.path().join("gone.txt"), b"bye").unwrap();

        let first = build_cdc_envelope(dir.path(), Some("web"), &chunker(), None).unwrap();
        let Manifest::CdcDelta(first) = first.manifest else {
            panic!("expected cdc-delta");
        };
        let previous = first.snapshot_index();

        fs::write(dir.path().join("edit.txt"), b"version two!").unwrap();
        fs::remove_file(dir.path().join("gone.txt")).unwrap();
        fs::write(dir.path().join("new.txt"), b"fresh").unwrap();

        let delta = build_cdc_envelope(dir.path(), Some("web"), &chunker(), Some(&previous)).unwrap();
        let Manifest::CdcDelta(m) = &delta.manifest else {
            panic!("expected cdc-delta");
        };
        let ops: Vec<(&str, FileOp)> = m.files.iter().map(|f| (f.path.as_str(), f.op)).collect();
        assert_eq!(
            ops,
            vec![
                ("edit.txt", FileOp::Write),
                ("new.txt", FileOp::Write),
                ("gone.txt", FileOp::Delete),
            ]
        );
        assert_eq!(m.total_size, Some(17));
    }

    #[test]
    fn empty_file_has_no_chunks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("empty"), b"").unwrap();
        let envelope = build_cdc_envelope(dir.path(), None, &chunker(), None).unwrap();
        let Manifest::CdcDelta(m) = &envelope.manifest else {
            panic!("expected cdc-delta");
        };
        assert_eq!(m.files[0].size, 0);
        assert!(m.files[0].chunks.is_empty());
        assert!(envelope.chunks.is_empty());
    }
}
