//! Sync targets.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thnsync_manifest::Envelope;

/// Outcome of a target hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Whether the apply may continue.
    pub ok: bool,
    /// Why not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CheckResult {
    /// A passing check.
    pub fn pass() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    /// A failing check.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// A destination an envelope can be applied to.
pub trait SyncTarget {
    /// Target name; also the chunk store namespace.
    fn name(&self) -> &str;

    /// Directory the envelope is applied into.
    fn destination_path(&self) -> &Path;

    /// Directory for per-transaction backups. Without one, replaced files
    /// are held in memory for rollback only.
    fn backup_root(&self) -> Option<&Path>;

    /// Runs before anything else.
    fn precheck(&self, _envelope: &Envelope) -> CheckResult {
        CheckResult::pass()
    }

    /// Runs after all files are in place; failure rolls the apply back.
    fn postcheck(&self, _envelope: &Envelope) -> CheckResult {
        CheckResult::pass()
    }
}

/// A plain directory target with no hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTarget {
    name: String,
    destination: PathBuf,
    backup_root: Option<PathBuf>,
}

impl DirectoryTarget {
    /// Creates a target.
    pub fn new(name: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
            backup_root: None,
        }
    }

    /// Keeps backups of replaced files under `backup_root`.
    pub fn with_backup_root(mut self, backup_root: impl Into<PathBuf>) -> Self {
        self.backup_root = Some(backup_root.into());
        self
    }
}

impl SyncTarget for DirectoryTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn destination_path(&self) -> &Path {
        &self.destination
    }

    fn backup_root(&self) -> Option<&Path> {
        self.backup_root.as_deref()
    }
}
