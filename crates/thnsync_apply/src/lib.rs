//! # thnsync Apply
//!
//! Transactional, non-destructive application of recovery plans and sync
//! envelopes.
//!
//! Both entry points follow the same shape: check everything, then mutate,
//! then record. All paths are validated against a [`RootContext`] before
//! the first write, and each run is recorded as one TXLOG transaction
//! when a `.thn` scaffold encloses the working directory.
//!
//! - [`apply_plan`] executes `touch`, `mkdir` and `regen` actions. Unsafe
//!   paths reject the whole plan, an optional lineage policy can block it,
//!   and existing user content is never overwritten.
//! - [`apply_envelope`] writes a `raw-zip` or `cdc-delta` envelope into a
//!   [`SyncTarget`], reassembling files from shipped or stored chunks.
//!   Replaced files are backed up and restored if anything fails.
//!
//! ```no_run
//! use thnsync_apply::{apply_plan, ApplyOptions, ApplyPlan, PlanAction};
//!
//! let plan = ApplyPlan::new("/srv/site")
//!     .with_action(PlanAction::new("mkdir", "assets"))
//!     .with_action(PlanAction::new("touch", "assets/.keep"));
//! let report = apply_plan(&plan, &ApplyOptions::new(), None)?;
//! println!("{:?}", report.status);
//! # Ok::<(), thnsync_apply::ApplyError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod context;
mod diagnostics;
mod envelope_apply;
mod error;
mod fsops;
mod lineage;
mod options;
mod path;
mod plan;
mod recover;
mod regen;
mod target;

pub use context::{normalize_absolute, RootContext};
pub use diagnostics::{
    diagnose_cdc, diagnose_envelope, CdcDiagnostics, ChunkHealth, PayloadCompleteness,
};
pub use envelope_apply::{apply_envelope, AppliedFile, EnvelopeApplyReport, SYNC_APPLY_OP};
pub use error::{ApplyError, ApplyResult};
pub use fsops::write_atomic;
pub use lineage::{
    check_lineage, lineage_mode, LineageCheck, LineageIssue, LineageMode, REGISTRY_FILE,
    SNAPSHOT_INDEX_FILE,
};
pub use options::ApplyOptions;
pub use path::{
    check_path, is_unsafe_rel, normalize_rel, PathFailure, INVALID_ABS_PATH, OUTSIDE_ROOT,
    UNSAFE_PATH,
};
pub use plan::{ActionOp, ApplyPlan, PlanAction, NOOP_PLAN_STATUSES};
pub use recover::{apply_plan, ActionOutcome, PlanReport, PlanStatus, RECOVER_OP};
pub use regen::{
    registry_variables, render_placeholders, RegenRequest, Regenerator, TemplateDirRegenerator,
};
pub use target::{CheckResult, DirectoryTarget, SyncTarget};
