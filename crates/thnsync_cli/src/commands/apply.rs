//! Apply command implementation.

use std::path::{Path, PathBuf};
use thnsync_apply::{apply_envelope, ApplyOptions, DirectoryTarget, EnvelopeApplyReport};
use thnsync_manifest::Envelope;
use thnsync_store::{ChunkStore, FileChunkStore};

use crate::error::CliResult;
use crate::output::{emit, human_bytes};

/// Runs the apply command.
pub fn run(
    envelope_path: &Path,
    dest: &Path,
    target: Option<String>,
    backup: Option<PathBuf>,
    store_root: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> CliResult<bool> {
    let envelope = Envelope::read_from(envelope_path)?;
    let name = target
        .or_else(|| envelope.manifest.target().map(str::to_string))
        .unwrap_or_else(|| "web".to_string());
    let mut sync_target = DirectoryTarget::new(name, dest);
    if let Some(backup) = backup {
        sync_target = sync_target.with_backup_root(backup);
    }
    let store = store_root.map(FileChunkStore::open).transpose()?;
    let options = ApplyOptions::new().with_dry_run(dry_run);

    let report = apply_envelope(
        &envelope,
        &sync_target,
        store.as_ref().map(|s| s as &dyn ChunkStore),
        &options,
    );
    emit(json, &report, render)?;
    Ok(report.success)
}

fn render(report: &EnvelopeApplyReport) -> String {
    let verb = if report.dry_run { "would apply" } else { "applied" };
    if report.success {
        let mut out = format!(
            "{verb} {} files to {} ({} written, {} deleted)",
            report.applied_count,
            report.destination.display(),
            human_bytes(report.written_bytes),
            report.deleted_files
        );
        if let Some(txlog) = report.txlog.as_ref().filter(|t| t.enabled) {
            out.push_str(&format!("\n  tx: {}", txlog.tx_id));
        }
        return out;
    }
    let mut out = format!(
        "apply to {} failed: {}",
        report.destination.display(),
        report.error.as_deref().unwrap_or("unknown error")
    );
    if report.restored_previous_state {
        out.push_str("\n  previous state restored");
    }
    for error in &report.errors {
        out.push_str(&format!("\n  {error}"));
    }
    out
}
