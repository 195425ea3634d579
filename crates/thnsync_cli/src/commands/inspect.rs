//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use thnsync_apply::{diagnose_envelope, CdcDiagnostics};
use thnsync_manifest::{
    summarize_cdc_files, summarize_manifest, CdcFilesSummary, Envelope, ManifestSummary,
};
use thnsync_store::{ChunkStore, FileChunkStore};

use crate::error::CliResult;
use crate::output::{emit, human_bytes};

/// Envelope inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Envelope path.
    pub envelope: String,
    /// Whether the payload matches the manifest.
    pub payload_ok: bool,
    /// Payload problem, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_error: Option<String>,
    /// Manifest summary.
    pub manifest: ManifestSummary,
    /// Bounded file listing for CDC envelopes.
    pub cdc_files: CdcFilesSummary,
    /// Chunk diagnostics for CDC envelopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdc_diagnostics: Option<CdcDiagnostics>,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    store_root: Option<&Path>,
    target: Option<String>,
    max_items: usize,
    json: bool,
) -> CliResult<bool> {
    let envelope = Envelope::read_from(path)?;
    let value = envelope.manifest.to_value();
    let target = target
        .or_else(|| envelope.manifest.target().map(str::to_string))
        .unwrap_or_else(|| "web".to_string());
    let store = store_root.map(FileChunkStore::open).transpose()?;
    let payload_error = envelope.verify_payload().err().map(|e| e.to_string());

    let result = InspectResult {
        envelope: path.display().to_string(),
        payload_ok: payload_error.is_none(),
        payload_error,
        manifest: summarize_manifest(&value),
        cdc_files: summarize_cdc_files(&value, max_items),
        cdc_diagnostics: diagnose_envelope(
            &envelope,
            &target,
            store.as_ref().map(|s| s as &dyn ChunkStore),
        ),
    };
    emit(json, &result, render)?;
    Ok(result.payload_ok)
}

fn render(result: &InspectResult) -> String {
    let mut out = format!(
        "{}\n  mode: {}\n  files: {}\n  size: {}\n  payload: {}\n",
        result.envelope,
        result.manifest.mode,
        result.manifest.file_count,
        human_bytes(result.manifest.total_size),
        result.payload_error.as_deref().unwrap_or("ok"),
    );
    for file in &result.cdc_files.files {
        out.push_str(&format!(
            "    {} ({})\n",
            file.name.as_deref().unwrap_or("?"),
            file.size.map_or_else(|| "?".to_string(), human_bytes)
        ));
    }
    if result.cdc_files.truncated {
        out.push_str(&format!(
            "    ... {} more\n",
            result.cdc_files.count - result.cdc_files.files.len()
        ));
    }
    if let Some(diag) = &result.cdc_diagnostics {
        let completeness = &diag.payload_completeness;
        out.push_str(&format!(
            "  chunks: {}/{} shipped, {} unreferenced, {} unavailable\n",
            completeness.present,
            completeness.expected,
            completeness.extra.len(),
            diag.chunk_health.missing_chunks.len()
        ));
    }
    out
}
