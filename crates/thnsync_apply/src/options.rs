//! Apply options.

use std::path::{Path, PathBuf};

/// Options shared by plan and envelope applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Run every check but write nothing, not even the TXLOG.
    pub dry_run: bool,
    /// Allow `regen` actions to render blueprint-owned files.
    pub regen_owned: bool,
    /// Directory the TXLOG scaffold search starts from. Defaults to the
    /// apply root.
    pub working_dir: Option<PathBuf>,
}

impl ApplyOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables or disables regeneration.
    pub fn with_regen_owned(mut self, regen_owned: bool) -> Self {
        self.regen_owned = regen_owned;
        self
    }

    /// Sets the TXLOG search start.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub(crate) fn log_start<'a>(&'a self, root: &'a Path) -> &'a Path {
        self.working_dir.as_deref().unwrap_or(root)
    }
}
