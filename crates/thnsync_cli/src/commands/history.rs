//! History command implementation.

use std::path::Path;
use thnsync_history::{
    find_scaffold_root, load_sync_history, render_history_text, HistoryQuery, DEFAULT_MAX_DEPTH,
};
use tracing::warn;

use crate::error::CliResult;
use crate::output::emit;

/// Runs the history command.
pub fn run(
    path: &Path,
    target: Option<String>,
    tx_id: Option<String>,
    limit: i64,
    json: bool,
) -> CliResult<bool> {
    let Some(root) = find_scaffold_root(path, DEFAULT_MAX_DEPTH) else {
        warn!(path = %path.display(), "no scaffold found");
        let value = serde_json::json!({
            "status": "NOT_FOUND",
            "path": path.display().to_string(),
            "notes": ["No .thn directory found at or above path."],
        });
        emit(json, &value, |_| {
            format!("no scaffold found at or above {}", path.display())
        })?;
        return Ok(false);
    };

    let mut query = HistoryQuery::new().with_limit(limit);
    if let Some(target) = target {
        query = query.with_target(target);
    }
    if let Some(tx_id) = tx_id {
        query = query.with_tx_id(tx_id);
    }
    let report = load_sync_history(&root, &query);
    emit(json, &report, render_history_text)?;
    Ok(true)
}
