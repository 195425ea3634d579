//! Envelope apply with backup, rollback and TXLOG.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map};
use thnsync_manifest::{sha256_hex, Envelope, FileEntry, FileOp, Manifest, ManifestMode};
use thnsync_store::ChunkStore;
use thnsync_txlog::{TxLogDiagnostic, TxLogSession};
use tracing::{debug, info, warn};

use crate::context::RootContext;
use crate::diagnostics::{diagnose_envelope, find_chunk, CdcDiagnostics};
use crate::fsops::write_atomic;
use crate::options::ApplyOptions;
use crate::path::check_path;
use crate::target::SyncTarget;

/// TXLOG operation name for envelope applies.
pub const SYNC_APPLY_OP: &str = "sync_apply";

/// One file written or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedFile {
    /// Path as declared in the envelope.
    pub logical_path: String,
    /// Destination on disk.
    pub dest: PathBuf,
    /// Bytes written; zero for deletes.
    pub size: u64,
    /// Write or delete.
    pub op: FileOp,
}

/// Result of [`apply_envelope`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeApplyReport {
    /// Whether the destination now reflects the envelope.
    pub success: bool,
    /// Envelope mode.
    pub mode: ManifestMode,
    /// Target name.
    pub target: String,
    /// Destination directory.
    pub destination: PathBuf,
    /// Files written; zero unless the apply succeeded.
    pub applied_count: usize,
    /// Files written or deleted, or projected in a dry run.
    pub files: Vec<AppliedFile>,
    /// Total bytes written.
    pub written_bytes: u64,
    /// Files removed.
    pub deleted_files: usize,
    /// Chunk diagnostics for `cdc-delta` envelopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdc_diagnostics: Option<CdcDiagnostics>,
    /// Whether nothing was written.
    pub dry_run: bool,
    /// Where replaced files were backed up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    /// Whether a failed apply was rolled back.
    pub restored_previous_state: bool,
    /// Headline failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Reason given by a target hook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Detailed failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// TXLOG state; absent for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txlog: Option<TxLogDiagnostic>,
}

impl EnvelopeApplyReport {
    fn new(envelope: &Envelope, target: &dyn SyncTarget, dry_run: bool) -> Self {
        Self {
            success: false,
            mode: envelope.manifest.mode(),
            target: target.name().to_string(),
            destination: target.destination_path().to_path_buf(),
            applied_count: 0,
            files: Vec::new(),
            written_bytes: 0,
            deleted_files: 0,
            cdc_diagnostics: None,
            dry_run,
            backup_dir: None,
            restored_previous_state: false,
            error: None,
            reason: None,
            errors: Vec::new(),
            txlog: None,
        }
    }

    fn fail(mut self, error: &str, errors: Vec<String>) -> Self {
        warn!(target_name = %self.target, error, "envelope apply failed");
        self.error = Some(error.to_string());
        self.errors = errors;
        self
    }
}

/// A mutation computed before anything is touched.
struct PlannedFile {
    rel: String,
    dest: PathBuf,
    content: Option<Vec<u8>>,
}

/// Previous state of a path, for rollback.
struct Undo {
    dest: PathBuf,
    previous: Option<Vec<u8>>,
}

fn declared_paths(envelope: &Envelope) -> Vec<&str> {
    match &envelope.manifest {
        Manifest::RawZip(_) => envelope.files.keys().map(String::as_str).collect(),
        Manifest::CdcDelta(m) => m.files.iter().map(|f| f.path.as_str()).collect(),
    }
}

fn resolve(ctx: &RootContext, raw: &str) -> Result<(String, PathBuf), String> {
    check_path(ctx, raw, None)
        .map(|rel| {
            let dest = ctx.resolve(&rel);
            (rel, dest)
        })
        .map_err(|reason| format!("{raw}: {reason}"))
}

fn plan_files(
    envelope: &Envelope,
    ctx: &RootContext,
    store: Option<&dyn ChunkStore>,
    target: &str,
) -> Result<Vec<PlannedFile>, Vec<String>> {
    let mut planned = Vec::new();
    let mut errors = Vec::new();

    match &envelope.manifest {
        Manifest::RawZip(_) => {
            for (raw, data) in &envelope.files {
                match resolve(ctx, raw) {
                    Ok((rel, dest)) => planned.push(PlannedFile {
                        rel,
                        dest,
                        content: Some(data.clone()),
                    }),
                    Err(e) => errors.push(e),
                }
            }
        }
        Manifest::CdcDelta(m) => {
            for entry in &m.files {
                let (rel, dest) = match resolve(ctx, &entry.path) {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        errors.push(e);
                        continue;
                    }
                };
                let content = match entry.op {
                    FileOp::Delete => None,
                    FileOp::Write => Some(assemble(envelope, store, target, entry, &mut errors)),
                };
                planned.push(PlannedFile { rel, dest, content });
            }
        }
    }

    if errors.is_empty() {
        Ok(planned)
    } else {
        Err(errors)
    }
}

fn assemble(
    envelope: &Envelope,
    store: Option<&dyn ChunkStore>,
    target: &str,
    entry: &FileEntry,
    errors: &mut Vec<String>,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(usize::try_from(entry.size).unwrap_or(0));
    for id in &entry.chunks {
        match find_chunk(envelope, store, target, id) {
            Some(chunk) => data.extend_from_slice(&chunk),
            None => {
                errors.push(format!("{}: missing chunk {id}", entry.path));
                return data;
            }
        }
    }
    if data.len() as u64 != entry.size {
        errors.push(format!(
            "{}: reassembled {} bytes, manifest declares {}",
            entry.path,
            data.len(),
            entry.size
        ));
    } else if let Some(expected) = &entry.sha256 {
        if !sha256_hex(&data).eq_ignore_ascii_case(expected) {
            errors.push(format!("{}: content hash mismatch", entry.path));
        }
    }
    data
}

fn read_previous(dest: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(dest) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn abort_with(
    mut report: EnvelopeApplyReport,
    session: &mut TxLogSession,
    reason: &str,
) -> EnvelopeApplyReport {
    let detail = report
        .reason
        .clone()
        .or_else(|| report.errors.first().cloned())
        .or_else(|| report.error.clone());
    session.abort(reason, detail.as_deref());
    if !report.dry_run {
        report.txlog = Some(session.diagnostic());
    }
    report
}

fn rollback(undo: &[Undo]) -> bool {
    let mut clean = true;
    for step in undo.iter().rev() {
        let result = match &step.previous {
            Some(data) => write_atomic(&step.dest, data),
            None => match fs::remove_file(&step.dest) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(e) = result {
            warn!(path = %step.dest.display(), error = %e, "rollback step failed");
            clean = false;
        }
    }
    clean
}

/// Applies `envelope` to `target`.
///
/// Nothing is written until the target precheck passes, the payload
/// matches the manifest, every declared path stays inside the destination
/// and every referenced chunk is available from the envelope or `store`.
/// Files that get replaced or deleted are backed up under
/// `<backup_root>/<tx_id>/` when the target has a backup root, and any
/// write failure or failed postcheck restores the previous state.
///
/// After a successful `cdc-delta` apply the shipped chunks are added to
/// `store` so later deltas can reference them.
///
/// The result is always a report; failures are described in it.
pub fn apply_envelope(
    envelope: &Envelope,
    target: &dyn SyncTarget,
    store: Option<&dyn ChunkStore>,
    options: &ApplyOptions,
) -> EnvelopeApplyReport {
    let mut report = EnvelopeApplyReport::new(envelope, target, options.dry_run);

    let ctx = match RootContext::new(target.destination_path()) {
        Ok(ctx) => ctx,
        Err(e) => return report.fail("Invalid destination", vec![e.to_string()]),
    };
    report.destination = ctx.root().to_path_buf();
    let destination = ctx.root().display().to_string();

    let mut session = if options.dry_run {
        TxLogSession::disabled()
    } else {
        TxLogSession::start(options.log_start(ctx.root()), SYNC_APPLY_OP, &destination)
    };
    let mut meta = Map::new();
    meta.insert("target".into(), json!(target.name()));
    meta.insert("mode".into(), json!(report.mode));
    meta.insert("destination".into(), json!(destination));
    session.begin(meta);

    let pre = target.precheck(envelope);
    if !pre.ok {
        report.reason = pre.reason;
        let report = report.fail("Target precheck failed", Vec::new());
        return abort_with(report, &mut session, "precheck_failed");
    }

    if let Err(e) = envelope.verify_payload() {
        let report = report.fail("Envelope validation failed", vec![e.to_string()]);
        return abort_with(report, &mut session, "validation_failed");
    }

    let preflight_errors: Vec<String> = declared_paths(envelope)
        .into_iter()
        .filter_map(|raw| check_path(&ctx, raw, None).err().map(|r| format!("{raw}: {r}")))
        .collect();
    if !preflight_errors.is_empty() {
        let report = report.fail("Unsafe path in envelope", preflight_errors);
        return abort_with(report, &mut session, "preflight_failed");
    }

    report.cdc_diagnostics = diagnose_envelope(envelope, target.name(), store);
    let missing = report
        .cdc_diagnostics
        .as_ref()
        .map(|d| d.chunk_health.missing_chunks.clone())
        .unwrap_or_default();
    if !missing.is_empty() {
        let report = report.fail("Missing chunks for CDC-delta apply", missing);
        return abort_with(report, &mut session, "missing_chunks");
    }

    let planned = match plan_files(envelope, &ctx, store, target.name()) {
        Ok(planned) => planned,
        Err(errors) => {
            let report = report.fail("Envelope content does not match manifest", errors);
            return abort_with(report, &mut session, "validation_failed");
        }
    };

    if options.dry_run {
        report.files = planned.iter().map(projected).collect();
        report.applied_count = planned.iter().filter(|p| p.content.is_some()).count();
        report.success = true;
        info!(target_name = %report.target, files = report.files.len(), "envelope dry run");
        return report;
    }

    let backup_dir = target.backup_root().map(|root| root.join(session.tx_id()));
    report.backup_dir = backup_dir.clone();

    let mut undo: Vec<Undo> = Vec::with_capacity(planned.len());
    let mut failure: Option<String> = None;
    for file in &planned {
        match apply_one(file, backup_dir.as_deref(), &mut undo) {
            Ok(None) => {}
            Ok(Some(applied)) => {
                session.action(json!({
                    "op": applied.op,
                    "path": applied.logical_path,
                    "size": applied.size,
                }));
                match applied.op {
                    FileOp::Write => report.written_bytes += applied.size,
                    FileOp::Delete => report.deleted_files += 1,
                }
                report.files.push(applied);
            }
            Err(e) => {
                failure = Some(format!("Failed to apply {:?}: {e}", file.rel));
                break;
            }
        }
    }

    if let Some(error) = failure {
        report.restored_previous_state = rollback(&undo);
        let headline = match report.mode {
            ManifestMode::CdcDelta => "CDC-delta apply failed; previous backup restored",
            ManifestMode::RawZip => "Apply operation failed; previous backup restored",
        };
        let report = report.fail(headline, vec![error]);
        return abort_with(report, &mut session, "apply_failed");
    }

    let post = target.postcheck(envelope);
    if !post.ok {
        report.restored_previous_state = rollback(&undo);
        report.reason = post.reason;
        let report = report.fail("Target postcheck failed; previous backup restored", Vec::new());
        return abort_with(report, &mut session, "postcheck_failed");
    }

    report.applied_count = report
        .files
        .iter()
        .filter(|f| f.op == FileOp::Write)
        .count();
    report.success = true;

    if let Some(store) = store {
        for (id, data) in &envelope.chunks {
            if let Err(e) = store.insert(target.name(), id, data) {
                warn!(chunk = %id, error = %e, "could not retain received chunk");
            }
        }
    }

    session.commit(json!({
        "mode": report.mode,
        "applied_count": report.applied_count,
        "written_bytes": report.written_bytes,
        "deleted_files": report.deleted_files,
        "backup_dir": report.backup_dir,
    }));
    report.txlog = Some(session.diagnostic());
    info!(
        target_name = %report.target,
        applied = report.applied_count,
        deleted = report.deleted_files,
        "envelope applied"
    );
    report
}

fn projected(file: &PlannedFile) -> AppliedFile {
    AppliedFile {
        logical_path: file.rel.clone(),
        dest: file.dest.clone(),
        size: file.content.as_ref().map_or(0, |c| c.len() as u64),
        op: if file.content.is_some() {
            FileOp::Write
        } else {
            FileOp::Delete
        },
    }
}

/// Applies one file, recording how to undo it. Deleting an absent file
/// does nothing and returns `None`.
fn apply_one(
    file: &PlannedFile,
    backup_dir: Option<&Path>,
    undo: &mut Vec<Undo>,
) -> io::Result<Option<AppliedFile>> {
    let previous = read_previous(&file.dest)?;
    if file.content.is_none() && previous.is_none() {
        return Ok(None);
    }
    if let (Some(dir), Some(data)) = (backup_dir, previous.as_ref()) {
        write_atomic(&dir.join(&file.rel), data)?;
    }
    undo.push(Undo {
        dest: file.dest.clone(),
        previous,
    });

    match &file.content {
        Some(data) => {
            debug!(path = %file.rel, bytes = data.len(), "writing file");
            write_atomic(&file.dest, data)?;
        }
        None => {
            debug!(path = %file.rel, "deleting file");
            fs::remove_file(&file.dest)?;
        }
    }
    Ok(Some(projected(file)))
}
