//! Validate command implementation.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thnsync_manifest::{summarize_manifest, validate, ManifestSummary};
use tracing::warn;

use crate::error::CliResult;
use crate::output::{emit, human_bytes};

/// Validation result.
#[derive(Debug, Serialize)]
pub struct ValidateResult {
    /// Manifest path.
    pub path: String,
    /// Whether the manifest is valid.
    pub valid: bool,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Normalized summary, computed even for invalid manifests.
    pub summary: ManifestSummary,
}

/// Runs the validate command.
pub fn run(path: &Path, json: bool) -> CliResult<bool> {
    let value: Value = serde_json::from_slice(&fs::read(path)?)?;
    let error = validate(&value).err().map(|e| e.to_string());
    if let Some(e) = &error {
        warn!(path = %path.display(), error = %e, "manifest is invalid");
    }
    let result = ValidateResult {
        path: path.display().to_string(),
        valid: error.is_none(),
        error,
        summary: summarize_manifest(&value),
    };
    emit(json, &result, |r| match &r.error {
        None => format!(
            "{}: valid {} manifest, {} files, {}",
            r.path,
            r.summary.mode,
            r.summary.file_count,
            human_bytes(r.summary.total_size)
        ),
        Some(e) => format!("{}: invalid: {e}", r.path),
    })?;
    Ok(result.valid)
}
