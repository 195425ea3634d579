//! Typed manifest model.

use crate::error::ManifestValidationError;
use crate::validate::validate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The only manifest version this crate reads or writes.
pub const MANIFEST_VERSION: u32 = 2;

/// Last-known file set of a target: path to ordered chunk ids.
pub type SnapshotIndex = BTreeMap<String, Vec<String>>;

/// Transfer mode of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManifestMode {
    /// Full payload of every file.
    #[serde(rename = "raw-zip")]
    RawZip,
    /// Changed files expressed as content-addressed chunks.
    #[serde(rename = "cdc-delta")]
    CdcDelta,
}

impl ManifestMode {
    /// Returns the wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawZip => "raw-zip",
            Self::CdcDelta => "cdc-delta",
        }
    }

    /// Parses a wire name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "raw-zip" => Some(Self::RawZip),
            "cdc-delta" => Some(Self::CdcDelta),
            _ => None,
        }
    }
}

impl fmt::Display for ManifestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum Manifest {
    /// Raw payload manifest.
    #[serde(rename = "raw-zip")]
    RawZip(RawZipManifest),
    /// CDC delta manifest.
    #[serde(rename = "cdc-delta")]
    CdcDelta(CdcDeltaManifest),
}

/// Manifest describing a full raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawZipManifest {
    /// Always [`MANIFEST_VERSION`].
    pub version: u32,
    /// Number of payload files.
    pub file_count: u64,
    /// Sum of payload file sizes in bytes.
    pub total_size: u64,
    /// Optional SHA-256 hex digest per payload path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hashes: Option<BTreeMap<String, String>>,
    /// Target the envelope is destined for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Free-form producer metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

/// Manifest describing changed files as chunk lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdcDeltaManifest {
    /// Always [`MANIFEST_VERSION`].
    pub version: u32,
    /// Changed, added and deleted files.
    pub files: Vec<FileEntry>,
    /// Target the envelope is destined for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Sum of written file sizes in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
    /// Free-form producer metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

/// What to do with a file entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOp {
    /// Create or replace the file.
    #[default]
    Write,
    /// Remove the file.
    Delete,
}

/// One file of a CDC delta manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// POSIX-style relative path.
    pub path: String,
    /// File size in bytes (zero for deletes).
    pub size: u64,
    /// Entry operation.
    #[serde(default)]
    pub op: FileOp,
    /// Ordered chunk ids whose concatenation is the file content.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<String>,
    /// SHA-256 hex digest of the whole file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl FileEntry {
    /// Creates a write entry.
    pub fn write(path: impl Into<String>, size: u64, chunks: Vec<String>) -> Self {
        Self {
            path: path.into(),
            size,
            op: FileOp::Write,
            chunks,
            sha256: None,
        }
    }

    /// Creates a delete entry.
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            op: FileOp::Delete,
            chunks: Vec::new(),
            sha256: None,
        }
    }

    /// Sets the whole-file digest.
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }
}

impl Manifest {
    /// Validates an untyped manifest and decodes it.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation, or
    /// [`ManifestValidationError::Malformed`] when a known optional field has
    /// the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self, ManifestValidationError> {
        validate(value)?;
        let mut value = value.clone();
        value["version"] = Value::from(MANIFEST_VERSION);
        Self::deserialize(&value).map_err(|e| ManifestValidationError::Malformed(e.to_string()))
    }

    /// Converts back to an untyped JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Returns the transfer mode.
    pub fn mode(&self) -> ManifestMode {
        match self {
            Self::RawZip(_) => ManifestMode::RawZip,
            Self::CdcDelta(_) => ManifestMode::CdcDelta,
        }
    }

    /// Returns the declared target, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::RawZip(m) => m.target.as_deref(),
            Self::CdcDelta(m) => m.target.as_deref(),
        }
    }
}

impl CdcDeltaManifest {
    /// Creates an empty manifest for `target`.
    pub fn new(target: Option<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            files: Vec::new(),
            target,
            total_size: None,
            meta: Map::new(),
        }
    }

    /// Returns the path-to-chunks index of the written files.
    pub fn snapshot_index(&self) -> SnapshotIndex {
        self.files
            .iter()
            .filter(|f| f.op == FileOp::Write)
            .map(|f| (f.path.clone(), f.chunks.clone()))
            .collect()
    }

    /// Returns every chunk id referenced by write entries, in first-use order
    /// and without duplicates.
    pub fn referenced_chunks(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.files
            .iter()
            .filter(|f| f.op == FileOp::Write)
            .flat_map(|f| f.chunks.iter())
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}
