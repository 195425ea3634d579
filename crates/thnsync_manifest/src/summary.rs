//! Bounded, never-failing manifest projections for display.
//!
//! These work on untyped manifests so that `inspect` can describe even an
//! envelope that fails validation.

use serde::Serialize;
use serde_json::{Map, Value};

/// Default cap on listed files in [`summarize_cdc_files`].
pub const DEFAULT_MAX_SUMMARY_ITEMS: usize = 200;

/// Normalized manifest summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestSummary {
    /// Declared version, if any.
    pub version: Option<Value>,
    /// Declared mode (`raw-zip` when absent).
    pub mode: String,
    /// Number of files.
    pub file_count: u64,
    /// Total bytes.
    pub total_size: u64,
    /// Producer metadata.
    pub meta: Map<String, Value>,
}

/// One listed file of a CDC manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CdcFileSummary {
    /// Entry path (`name`, `path` or `relpath`).
    pub name: Option<String>,
    /// Entry size, when readable as an integer.
    pub size: Option<u64>,
    /// Whole-file digest (`sha256`, `hash` or `content_sha256`).
    pub sha256: Option<String>,
}

/// Bounded file listing of a CDC manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CdcFilesSummary {
    /// True when the manifest is in `cdc-delta` mode.
    pub present: bool,
    /// Total number of entries in the manifest.
    pub count: usize,
    /// True when more than `max_items` entries exist.
    pub truncated: bool,
    /// Up to `max_items` entries in manifest order.
    pub files: Vec<CdcFileSummary>,
}

fn loose_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

fn loose_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn mode_of(manifest: &Value) -> String {
    manifest
        .get("mode")
        .and_then(Value::as_str)
        .unwrap_or("raw-zip")
        .to_string()
}

fn meta_of(manifest: &Value) -> Map<String, Value> {
    manifest
        .get("meta")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Summarizes any manifest-like value.
///
/// For `cdc-delta` the file count and size are derived from `files`;
/// otherwise the declared `file_count`/`total_size` are used (zero when
/// absent or unreadable).
pub fn summarize_manifest(manifest: &Value) -> ManifestSummary {
    let mode = mode_of(manifest);
    let version = manifest.get("version").cloned();

    let (file_count, total_size) = if mode == "cdc-delta" {
        let files = manifest
            .get("files")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let total = files
            .iter()
            .map(|f| loose_u64(f.get("size")).unwrap_or(0))
            .sum();
        (files.len() as u64, total)
    } else {
        (
            loose_u64(manifest.get("file_count")).unwrap_or(0),
            loose_u64(manifest.get("total_size")).unwrap_or(0),
        )
    };

    ManifestSummary {
        version,
        mode,
        file_count,
        total_size,
        meta: meta_of(manifest),
    }
}

fn summarize_entry(entry: &Value) -> CdcFileSummary {
    if !entry.is_object() {
        return CdcFileSummary {
            name: None,
            size: None,
            sha256: None,
        };
    }
    let first = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| loose_string(entry.get(*k)))
    };
    CdcFileSummary {
        name: first(&["name", "path", "relpath"]),
        size: loose_u64(entry.get("size")),
        sha256: first(&["sha256", "hash", "content_sha256"]),
    }
}

/// Lists up to `max_items` files of a CDC manifest.
///
/// Non-CDC manifests yield `present: false` and an empty listing. Malformed
/// entries appear with all fields `None`.
pub fn summarize_cdc_files(manifest: &Value, max_items: usize) -> CdcFilesSummary {
    if mode_of(manifest) != "cdc-delta" {
        return CdcFilesSummary {
            present: false,
            count: 0,
            truncated: false,
            files: Vec::new(),
        };
    }
    let files = manifest
        .get("files")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    CdcFilesSummary {
        present: true,
        count: files.len(),
        truncated: files.len() > max_items,
        files: files.iter().take(max_items).map(summarize_entry).collect(),
    }
}
