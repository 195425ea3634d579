//! Recover command implementation.

use std::path::{Path, PathBuf};
use thnsync_apply::{
    apply_plan, ApplyOptions, ApplyPlan, PlanReport, Regenerator, TemplateDirRegenerator,
};

use crate::error::{CliError, CliResult};
use crate::output::emit;

/// Runs the recover command.
///
/// Writing requires `--yes`; a dry run does not.
pub fn run(
    plan_path: &Path,
    dry_run: bool,
    yes: bool,
    regen_owned: bool,
    templates: Option<PathBuf>,
    json: bool,
) -> CliResult<bool> {
    if !dry_run && !yes {
        return Err(CliError::usage(
            "recover modifies files; pass --yes to confirm or --dry-run to preview",
        ));
    }
    let plan = ApplyPlan::read(plan_path)?;
    let regenerator = templates.map(TemplateDirRegenerator::new);
    let options = ApplyOptions::new()
        .with_dry_run(dry_run)
        .with_regen_owned(regen_owned);

    let report = apply_plan(
        &plan,
        &options,
        regenerator.as_ref().map(|r| r as &dyn Regenerator),
    )?;
    emit(json, &report, render)?;
    Ok(report.status.is_success())
}

fn render(report: &PlanReport) -> String {
    let mut out = format!(
        "{}: {} ({} applied, {} skipped, {} failed)",
        report.path.display(),
        report.status.as_str(),
        report.applied.len(),
        report.skipped.len(),
        report.failures.len()
    );
    for action in &report.applied {
        out.push_str(&format!("\n  {} {}", action.op, action.path));
        if let Some(detail) = &action.detail {
            out.push_str(&format!(" ({detail})"));
        }
    }
    for action in &report.skipped {
        out.push_str(&format!(
            "\n  skipped {} {}: {}",
            action.op,
            action.path,
            action.detail.as_deref().unwrap_or("")
        ));
    }
    for failure in &report.failures {
        out.push_str(&format!("\n  failed {}: {}", failure.path, failure.error));
    }
    for issue in &report.lineage {
        out.push_str(&format!("\n  lineage: {}", issue.message));
    }
    out
}
