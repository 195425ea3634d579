//! Plan apply: preflight, lineage, execution and TXLOG.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};
use thnsync_txlog::{TxLogDiagnostic, TxLogSession};
use tracing::{debug, info, warn};

use crate::context::RootContext;
use crate::error::ApplyResult;
use crate::fsops::write_atomic;
use crate::lineage::{check_lineage, LineageIssue, LineageMode};
use crate::options::ApplyOptions;
use crate::path::{check_path, normalize_rel, PathFailure};
use crate::plan::{ActionOp, ApplyPlan, PlanAction};
use crate::regen::{registry_variables, RegenRequest, Regenerator};

/// TXLOG operation name for plan applies.
pub const RECOVER_OP: &str = "recover";

/// Final state of a plan apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// At least one path was unsafe; nothing ran.
    FailedPreflight,
    /// Lineage policy refused the apply; nothing ran.
    Blocked,
    /// Checks passed; outcomes are projected.
    DryRun,
    /// The plan had nothing to do.
    Noop,
    /// Every action succeeded or was skipped.
    Applied,
    /// At least one action failed.
    Failed,
}

impl PlanStatus {
    /// Returns true for statuses that count as success.
    pub fn is_success(self) -> bool {
        matches!(self, Self::DryRun | Self::Noop | Self::Applied)
    }

    /// Returns the serialized name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailedPreflight => "failed_preflight",
            Self::Blocked => "blocked",
            Self::DryRun => "dry_run",
            Self::Noop => "noop",
            Self::Applied => "applied",
            Self::Failed => "failed",
        }
    }
}

/// An executed, projected or skipped action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    /// Operation name.
    pub op: String,
    /// Normalized relative path.
    pub path: String,
    /// Destination on disk.
    pub dest: PathBuf,
    /// Extra information, such as why an action was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of [`apply_plan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    /// Final state.
    pub status: PlanStatus,
    /// Resolved root.
    pub path: PathBuf,
    /// Blueprint descriptor from the plan.
    pub blueprint: Option<Value>,
    /// Plan schema version.
    pub schema_version: Option<Value>,
    /// Actions that ran, or would run in a dry run.
    pub applied: Vec<ActionOutcome>,
    /// Actions that were not attempted.
    pub skipped: Vec<ActionOutcome>,
    /// Preflight or execution failures.
    pub failures: Vec<PathFailure>,
    /// Lineage issues found.
    pub lineage: Vec<LineageIssue>,
    /// Plan notes plus lineage warnings.
    pub notes: Vec<Map<String, Value>>,
    /// TXLOG state; absent for dry runs.
    pub txlog: Option<TxLogDiagnostic>,
}

impl PlanReport {
    fn new(root: &Path, plan: &ApplyPlan, status: PlanStatus) -> Self {
        Self {
            status,
            path: root.to_path_buf(),
            blueprint: plan.blueprint.clone(),
            schema_version: plan.schema_version.clone(),
            applied: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            lineage: Vec::new(),
            notes: plan.notes.clone(),
            txlog: None,
        }
    }

    fn summary(&self) -> Value {
        json!({
            "status": self.status,
            "applied": self.applied.len(),
            "skipped": self.skipped.len(),
            "failures": self.failures.len(),
        })
    }
}

fn declared_root(plan: &ApplyPlan, options: &ApplyOptions) -> PathBuf {
    let declared = PathBuf::from(plan.path.as_deref().unwrap_or("."));
    match &options.working_dir {
        Some(dir) if declared.is_relative() => dir.join(declared),
        _ => declared,
    }
}

fn preflight(ctx: &RootContext, actions: &[PlanAction]) -> Vec<PathFailure> {
    actions
        .iter()
        .filter_map(|action| {
            let raw = action.path.as_deref().unwrap_or_default();
            check_path(ctx, raw, action.abs_path.as_deref())
                .err()
                .map(|reason| PathFailure {
                    op: action.op.clone(),
                    path: normalize_rel(raw),
                    error: reason.to_string(),
                })
        })
        .collect()
}

fn begin_meta(root: &Path, plan: &ApplyPlan, options: &ApplyOptions) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("root".into(), json!(root));
    meta.insert("dry_run".into(), json!(options.dry_run));
    meta.insert("regen_owned".into(), json!(options.regen_owned));
    meta.insert("actions".into(), json!(plan.actions.len()));
    if let Some(id) = plan.blueprint_id() {
        meta.insert("blueprint_id".into(), json!(id));
    }
    meta
}

/// Applies a recovery plan.
///
/// Every path is checked before anything runs. Unsafe paths fail the whole
/// plan with [`PlanStatus::FailedPreflight`], and a blocking lineage policy
/// yields [`PlanStatus::Blocked`]. Otherwise actions run in deterministic
/// order: `touch` never overwrites, `mkdir` is idempotent and `regen` only
/// writes files that are missing or were created earlier in the same run.
///
/// Outside a dry run a `begin` and exactly one terminal TXLOG record are
/// written when a scaffold encloses the working directory. TXLOG failures
/// only show up in [`PlanReport::txlog`].
///
/// # Errors
///
/// Fails only when the plan root cannot be resolved. That failure is still
/// logged as an `invalid_root` abort outside a dry run. Every other problem
/// is reported in the returned [`PlanReport`].
pub fn apply_plan(
    plan: &ApplyPlan,
    options: &ApplyOptions,
    regenerator: Option<&dyn Regenerator>,
) -> ApplyResult<PlanReport> {
    let declared = declared_root(plan, options);
    let ctx = match RootContext::new(&declared) {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(root = %declared.display(), error = %e, "plan root rejected");
            if !options.dry_run {
                let mut session = TxLogSession::start(
                    options.log_start(&declared),
                    RECOVER_OP,
                    &declared.display().to_string(),
                );
                session.begin(begin_meta(&declared, plan, options));
                session.abort("invalid_root", Some(&e.to_string()));
            }
            return Err(e);
        }
    };
    let root = ctx.root();
    let actions = plan.sorted_actions();
    debug!(root = %root.display(), actions = actions.len(), "plan preflight");

    let mut session = if options.dry_run {
        TxLogSession::disabled()
    } else {
        TxLogSession::start(options.log_start(root), RECOVER_OP, &root.display().to_string())
    };

    let failures = preflight(&ctx, &actions);
    if !failures.is_empty() {
        warn!(failures = failures.len(), "plan rejected by preflight");
        let mut report = PlanReport::new(root, plan, PlanStatus::FailedPreflight);
        report.failures = failures;
        if !options.dry_run {
            session.begin(begin_meta(root, plan, options));
            let error = format!("{} unsafe path(s)", report.failures.len());
            session.abort("preflight_failed", Some(&error));
            report.txlog = Some(session.diagnostic());
        }
        return Ok(report);
    }

    let lineage = check_lineage(root, plan.blueprint_id());
    let mut notes = plan.notes.clone();
    if lineage.is_blocking() {
        warn!(issues = lineage.issues.len(), "plan blocked by lineage policy");
        let mut report = PlanReport::new(root, plan, PlanStatus::Blocked);
        report.lineage = lineage.issues;
        if !options.dry_run {
            session.begin(begin_meta(root, plan, options));
            let codes: Vec<&str> = report.lineage.iter().map(|i| i.code).collect();
            session.abort("lineage_blocked", Some(&codes.join(",")));
            report.txlog = Some(session.diagnostic());
        }
        return Ok(report);
    }
    if lineage.mode == LineageMode::Warn {
        notes.extend(lineage.issues.iter().map(LineageIssue::to_note));
    }

    let mut report = PlanReport::new(root, plan, PlanStatus::Applied);
    report.notes = notes;
    report.lineage = lineage.issues;

    if plan.is_noop() || actions.is_empty() {
        report.status = if options.dry_run {
            PlanStatus::DryRun
        } else {
            PlanStatus::Noop
        };
        if !options.dry_run {
            session.begin(begin_meta(root, plan, options));
            session.commit(json!({"status": "noop", "applied": 0, "skipped": 0, "failures": 0}));
            report.txlog = Some(session.diagnostic());
        }
        info!(root = %root.display(), "nothing to apply");
        return Ok(report);
    }

    if !options.dry_run {
        session.begin(begin_meta(root, plan, options));
    }

    let variables = registry_variables(root);
    let mut executor = Executor {
        ctx: &ctx,
        plan,
        options,
        regenerator,
        variables: &variables,
        created: HashSet::new(),
    };
    for action in &actions {
        let step = executor.run(action);
        if !options.dry_run {
            session.action(step.audit());
        }
        match step {
            Step::Applied(outcome) => report.applied.push(outcome),
            Step::Skipped(outcome) => report.skipped.push(outcome),
            Step::Failed(failure) => report.failures.push(failure),
        }
    }

    report.status = match (options.dry_run, report.failures.is_empty()) {
        (true, _) => PlanStatus::DryRun,
        (false, true) => PlanStatus::Applied,
        (false, false) => PlanStatus::Failed,
    };

    if !options.dry_run {
        if report.failures.is_empty() {
            session.commit(report.summary());
        } else {
            let first = &report.failures[0];
            let error = format!(
                "{} action(s) failed; first: {}: {}",
                report.failures.len(),
                first.path,
                first.error
            );
            session.abort("action_failed", Some(&error));
        }
        report.txlog = Some(session.diagnostic());
    }

    info!(
        status = ?report.status,
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        failures = report.failures.len(),
        "plan apply finished"
    );
    Ok(report)
}

enum Step {
    Applied(ActionOutcome),
    Skipped(ActionOutcome),
    Failed(PathFailure),
}

impl Step {
    fn audit(&self) -> Value {
        match self {
            Step::Applied(o) => json!({"op": o.op, "path": o.path, "result": "applied", "detail": o.detail}),
            Step::Skipped(o) => json!({"op": o.op, "path": o.path, "result": "skipped", "detail": o.detail}),
            Step::Failed(f) => json!({"op": f.op, "path": f.path, "result": "failed", "error": f.error}),
        }
    }
}

struct Executor<'a> {
    ctx: &'a RootContext,
    plan: &'a ApplyPlan,
    options: &'a ApplyOptions,
    regenerator: Option<&'a dyn Regenerator>,
    variables: &'a Map<String, Value>,
    /// Files created by this run, including projected ones in a dry run.
    created: HashSet<PathBuf>,
}

impl Executor<'_> {
    fn exists(&self, dest: &Path) -> bool {
        self.created.contains(dest) || dest.exists()
    }

    fn run(&mut self, action: &PlanAction) -> Step {
        let op_name = action.op.clone().unwrap_or_default();
        let path = normalize_rel(action.path.as_deref().unwrap_or_default());
        let dest = self.ctx.resolve(&path);
        let outcome = |detail: Option<&str>| ActionOutcome {
            op: op_name.clone(),
            path: path.clone(),
            dest: dest.clone(),
            detail: detail.map(str::to_string),
        };
        let failure = |error: String| PathFailure {
            op: action.op.clone(),
            path: path.clone(),
            error,
        };

        let Some(op) = ActionOp::parse(&op_name) else {
            return Step::Skipped(outcome(Some("unsupported operation")));
        };

        let result = match op {
            ActionOp::Touch => self.touch(&dest),
            ActionOp::Mkdir => self.mkdir(&dest),
            ActionOp::Regen => self.regen(&path, &dest),
        };
        match result {
            Ok(Done::Applied(detail)) => Step::Applied(outcome(detail)),
            Ok(Done::Skipped(reason)) => Step::Skipped(outcome(Some(reason))),
            Err(error) => {
                debug!(op = %op, path = %path, error = %error, "action failed");
                Step::Failed(failure(error))
            }
        }
    }

    fn touch(&mut self, dest: &Path) -> Result<Done, String> {
        if self.exists(dest) {
            return Err("Path already exists".to_string());
        }
        if !self.options.dry_run {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dest)
                .map_err(|e| e.to_string())?;
        }
        self.created.insert(dest.to_path_buf());
        Ok(Done::Applied(None))
    }

    fn mkdir(&mut self, dest: &Path) -> Result<Done, String> {
        if self.created.contains(dest) || (dest.exists() && !dest.is_dir()) {
            return Err("Path exists and is not a directory".to_string());
        }
        if dest.is_dir() {
            return Ok(Done::Applied(Some("already present")));
        }
        if !self.options.dry_run {
            fs::create_dir_all(dest).map_err(|e| e.to_string())?;
        }
        Ok(Done::Applied(None))
    }

    fn regen(&mut self, path: &str, dest: &Path) -> Result<Done, String> {
        if !self.options.regen_owned {
            return Ok(Done::Skipped("regeneration not enabled"));
        }
        if dest.exists() && dest.is_dir() {
            return Err("Path exists and is a directory".to_string());
        }
        if self.exists(dest) && !self.created.contains(dest) {
            return Ok(Done::Skipped("existing content is not blueprint-managed"));
        }
        let regenerator = self
            .regenerator
            .ok_or_else(|| "No regenerator configured".to_string())?;
        let request = RegenRequest {
            root: self.ctx.root(),
            path,
            blueprint: self.plan.blueprint.as_ref(),
            variables: self.variables,
        };
        let rendered = regenerator.render(&request)?;
        if !self.options.dry_run {
            write_atomic(dest, &rendered).map_err(|e| e.to_string())?;
        }
        self.created.insert(dest.to_path_buf());
        Ok(Done::Applied(Some("regenerated")))
    }
}

enum Done {
    Applied(Option<&'static str>),
    Skipped(&'static str),
}
