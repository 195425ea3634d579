//! Envelope archives.
//!
//! On disk an envelope is a tar archive:
//!
//! ```text
//! manifest.json
//! payload/<relative path>     raw-zip file contents
//! chunks/<chunk id>           cdc-delta chunk bytes
//! ```
//!
//! Archives and bare manifests are written to a temporary sibling and
//! renamed into place, so readers never see a half-written file.

use crate::builder::sha256_hex;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::manifest::{FileOp, Manifest};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Archive entry holding the manifest.
pub const MANIFEST_ENTRY: &str = "manifest.json";

const PAYLOAD_PREFIX: &str = "payload/";
const CHUNKS_PREFIX: &str = "chunks/";

/// A manifest together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The validated manifest.
    pub manifest: Manifest,
    /// Raw file contents keyed by relative path (`raw-zip`).
    pub files: BTreeMap<String, Vec<u8>>,
    /// Chunk bytes keyed by chunk id (`cdc-delta`).
    pub chunks: BTreeMap<String, Vec<u8>>,
}

impl Envelope {
    /// Creates an envelope with an empty payload.
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            files: BTreeMap::new(),
            chunks: BTreeMap::new(),
        }
    }

    /// Reads an envelope archive from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read, has no manifest, or
    /// the manifest fails validation.
    pub fn read_from(path: &Path) -> EnvelopeResult<Self> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Reads an envelope archive from any reader.
    ///
    /// # Errors
    ///
    /// See [`Envelope::read_from`].
    pub fn read<R: Read>(reader: R) -> EnvelopeResult<Self> {
        let mut archive = tar::Archive::new(reader);
        let mut manifest: Option<Value> = None;
        let mut files = BTreeMap::new();
        let mut chunks = BTreeMap::new();

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = entry
                .path()?
                .to_str()
                .map(|s| s.replace('\\', "/"))
                .ok_or_else(|| EnvelopeError::InvalidEntry("non UTF-8 entry name".into()))?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;

            if name == MANIFEST_ENTRY {
                manifest = Some(serde_json::from_slice(&data)?);
            } else if let Some(rel) = name.strip_prefix(PAYLOAD_PREFIX) {
                if rel.is_empty() {
                    return Err(EnvelopeError::InvalidEntry(name));
                }
                files.insert(rel.to_string(), data);
            } else if let Some(id) = name.strip_prefix(CHUNKS_PREFIX) {
                chunks.insert(id.to_string(), data);
            } else {
                debug!(entry = %name, "ignoring unknown envelope entry");
            }
        }

        let manifest = manifest.ok_or(EnvelopeError::MissingManifest)?;
        let manifest = Manifest::from_value(&manifest)?;
        Ok(Self {
            manifest,
            files,
            chunks,
        })
    }

    /// Writes the envelope archive to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be written or renamed.
    pub fn write_to(&self, path: &Path) -> EnvelopeResult<()> {
        atomic_write(path, |file| {
            let mut builder = tar::Builder::new(BufWriter::new(file));
            let manifest = serde_json::to_vec_pretty(&self.manifest)?;
            append(&mut builder, MANIFEST_ENTRY, &manifest)?;
            for (rel, data) in &self.files {
                append(&mut builder, &format!("{PAYLOAD_PREFIX}{rel}"), data)?;
            }
            for (id, data) in &self.chunks {
                append(&mut builder, &format!("{CHUNKS_PREFIX}{id}"), data)?;
            }
            let mut writer = builder.into_inner()?;
            writer.flush()?;
            let file = writer
                .into_inner()
                .map_err(|e| EnvelopeError::Io(e.into_error()))?;
            file.sync_all()?;
            Ok(())
        })?;
        debug!(
            path = %path.display(),
            mode = %self.manifest.mode(),
            files = self.files.len(),
            chunks = self.chunks.len(),
            "wrote envelope"
        );
        Ok(())
    }

    /// Drops chunk bytes whose id is not in `keep`.
    ///
    /// Used after negotiation to omit chunks the remote already holds.
    pub fn retain_chunks<'a, I>(&mut self, keep: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = keep.into_iter().collect();
        self.chunks.retain(|id, _| keep.contains(id.as_str()));
    }

    /// Checks payload bytes against the manifest.
    ///
    /// For `raw-zip` the file count, total size and any declared hashes must
    /// match the payload. For `cdc-delta` every shipped chunk must hash to its
    /// id. Chunks missing from the envelope are not an error here; the apply
    /// stage may find them in a local store.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::PayloadMismatch`] describing the first
    /// discrepancy.
    pub fn verify_payload(&self) -> EnvelopeResult<()> {
        match &self.manifest {
            Manifest::RawZip(m) => {
                if m.file_count != self.files.len() as u64 {
                    return Err(EnvelopeError::payload_mismatch(format!(
                        "manifest declares {} files, payload has {}",
                        m.file_count,
                        self.files.len()
                    )));
                }
                let total: u64 = self.files.values().map(|d| d.len() as u64).sum();
                if m.total_size != total {
                    return Err(EnvelopeError::payload_mismatch(format!(
                        "manifest declares {} bytes, payload has {}",
                        m.total_size, total
                    )));
                }
                for (rel, expected) in m.file_hashes.iter().flatten() {
                    let data = self.files.get(rel).ok_or_else(|| {
                        EnvelopeError::payload_mismatch(format!("hashed file {rel} not in payload"))
                    })?;
                    if !sha256_hex(data).eq_ignore_ascii_case(expected) {
                        return Err(EnvelopeError::payload_mismatch(format!(
                            "hash mismatch for {rel}"
                        )));
                    }
                }
            }
            Manifest::CdcDelta(m) => {
                for (id, data) in &self.chunks {
                    if sha256_hex(data) != *id {
                        return Err(EnvelopeError::payload_mismatch(format!(
                            "chunk {id} does not match its content"
                        )));
                    }
                }
                for entry in m.files.iter().filter(|f| f.op == FileOp::Write) {
                    if entry.chunks.is_empty() && entry.size > 0 {
                        return Err(EnvelopeError::payload_mismatch(format!(
                            "{} has size {} but no chunks",
                            entry.path, entry.size
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn append<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) -> EnvelopeResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data)?;
    Ok(())
}

fn temp_sibling(path: &Path) -> EnvelopeResult<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EnvelopeError::InvalidEntry(path.display().to_string()))?;
    Ok(path.with_file_name(format!(".{name}.tmp-{}", Uuid::new_v4().simple())))
}

fn atomic_write<F>(path: &Path, write: F) -> EnvelopeResult<()>
where
    F: FnOnce(File) -> EnvelopeResult<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let temp = temp_sibling(path)?;
    let result = File::create(&temp)
        .map_err(EnvelopeError::from)
        .and_then(write)
        .and_then(|()| fs::rename(&temp, path).map_err(EnvelopeError::from));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

/// Writes a bare manifest file atomically.
///
/// # Errors
///
/// Returns an error if the file cannot be written or renamed.
pub fn write_manifest_atomic(path: &Path, manifest: &Manifest) -> EnvelopeResult<()> {
    atomic_write(path, |mut file| {
        serde_json::to_writer_pretty(&mut file, manifest)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        Ok(())
    })
}

/// Reads and validates a bare manifest file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or fails
/// validation.
pub fn read_manifest(path: &Path) -> EnvelopeResult<Manifest> {
    let data = fs::read(path)?;
    let value: Value = serde_json::from_slice(&data)?;
    Ok(Manifest::from_value(&value)?)
}
