//! Snapshot lineage policy.
//!
//! Reads `.thn/registry/scaffold.json` for the policy mode and
//! `.thn/snapshots/index.json` for the accepted snapshot. Missing or
//! unparsable files count as empty.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

/// Registry file, relative to the scaffold root.
pub const REGISTRY_FILE: &str = ".thn/registry/scaffold.json";
/// Snapshot index file, relative to the scaffold root.
pub const SNAPSHOT_INDEX_FILE: &str = ".thn/snapshots/index.json";

/// What to do when lineage cannot be confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageMode {
    /// Do nothing.
    #[default]
    Ignore,
    /// Attach issues as notes and continue.
    Warn,
    /// Refuse to apply.
    Block,
}

impl LineageMode {
    /// Parses a mode name; unknown names are treated as `ignore`.
    pub fn parse(name: &str) -> Self {
        match name {
            "warn" => Self::Warn,
            "block" => Self::Block,
            _ => Self::Ignore,
        }
    }
}

/// A lineage problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageIssue {
    /// Stable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: &'static str,
    /// Blueprint id of the accepted snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<String>,
    /// Blueprint id of the plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
}

impl LineageIssue {
    fn new(code: &'static str, message: &'static str) -> Self {
        Self {
            code,
            message,
            accepted: None,
            current: None,
        }
    }

    /// Converts the issue into a plan note.
    pub fn to_note(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Result of a lineage check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageCheck {
    /// Policy mode in effect.
    pub mode: LineageMode,
    /// Problems found.
    pub issues: Vec<LineageIssue>,
}

impl LineageCheck {
    /// Returns true if the apply must not proceed.
    pub fn is_blocking(&self) -> bool {
        self.mode == LineageMode::Block && !self.issues.is_empty()
    }
}

/// Reads a JSON object, treating any failure as empty.
pub fn read_json_object(path: &Path) -> Map<String, Value> {
    fs::read(path)
        .ok()
        .and_then(|data| serde_json::from_slice::<Value>(&data).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default()
}

/// Reads the lineage policy mode for `root`.
pub fn lineage_mode(root: &Path) -> LineageMode {
    let registry = read_json_object(&root.join(REGISTRY_FILE));
    registry
        .get("policy")
        .and_then(|p| p.get("snapshot_lineage"))
        .and_then(|l| l.get("mode"))
        .and_then(Value::as_str)
        .map(LineageMode::parse)
        .unwrap_or_default()
}

/// Checks the accepted snapshot of `root` against `blueprint_id`.
///
/// Issues are collected regardless of mode; the caller decides what they
/// mean.
pub fn check_lineage(root: &Path, blueprint_id: Option<&str>) -> LineageCheck {
    let mode = lineage_mode(root);
    let index = read_json_object(&root.join(SNAPSHOT_INDEX_FILE));
    let mut issues = Vec::new();

    if index.is_empty() {
        issues.push(LineageIssue::new(
            "SNAPSHOT_INDEX_MISSING",
            "No snapshot index found; lineage cannot be verified.",
        ));
        return LineageCheck { mode, issues };
    }

    let accepted = index
        .get("accepted")
        .and_then(Value::as_object)
        .filter(|a| !a.is_empty());
    let Some(accepted) = accepted else {
        issues.push(LineageIssue::new(
            "NO_ACCEPTED_SNAPSHOT",
            "No accepted snapshot present for scaffold.",
        ));
        return LineageCheck { mode, issues };
    };

    if let Some(current) = blueprint_id {
        let accepted_id = accepted.get("blueprint_id").and_then(Value::as_str);
        if accepted_id != Some(current) {
            issues.push(LineageIssue {
                accepted: accepted_id.map(str::to_string),
                current: Some(current.to_string()),
                ..LineageIssue::new(
                    "BLUEPRINT_MISMATCH",
                    "Accepted snapshot blueprint does not match current scaffold blueprint.",
                )
            });
        }
    }

    LineageCheck { mode, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, value: Value) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_vec(&value).unwrap()).unwrap();
    }

    #[test]
    fn defaults_to_ignore_with_missing_index() {
        let dir = tempdir().unwrap();
        let check = check_lineage(dir.path(), Some("bp"));
        assert_eq!(check.mode, LineageMode::Ignore);
        assert_eq!(check.issues[0].code, "SNAPSHOT_INDEX_MISSING");
        assert!(!check.is_blocking());
    }

    #[test]
    fn block_on_mismatch() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            REGISTRY_FILE,
            json!({"policy": {"snapshot_lineage": {"mode": "block"}}}),
        );
        write(
            dir.path(),
            SNAPSHOT_INDEX_FILE,
            json!({"accepted": {"blueprint_id": "old"}}),
        );

        let check = check_lineage(dir.path(), Some("new"));
        assert!(check.is_blocking());
        let issue = &check.issues[0];
        assert_eq!(issue.code, "BLUEPRINT_MISMATCH");
        assert_eq!(issue.accepted.as_deref(), Some("old"));
        assert_eq!(issue.current.as_deref(), Some("new"));

        assert!(check_lineage(dir.path(), Some("old")).issues.is_empty());
        assert!(check_lineage(dir.path(), None).issues.is_empty());
    }

    #[test]
    fn index_without_accepted_snapshot() {
        let dir = tempdir().unwrap();
        write(dir.path(), SNAPSHOT_INDEX_FILE, json!({"snapshots": []}));
        let check = check_lineage(dir.path(), None);
        assert_eq!(check.issues[0].code, "NO_ACCEPTED_SNAPSHOT");
    }

    #[test]
    fn unparsable_registry_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{not json").unwrap();
        assert_eq!(lineage_mode(dir.path()), LineageMode::Ignore);
    }

    #[test]
    fn issue_note_shape() {
        let note = LineageIssue::new("X", "msg").to_note();
        assert_eq!(Value::Object(note), json!({"code": "X", "message": "msg"}));
    }
}
