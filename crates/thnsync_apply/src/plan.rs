//! Recovery plan documents.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApplyError, ApplyResult};
use crate::path::normalize_rel;

/// Plan statuses meaning there is nothing to execute.
pub const NOOP_PLAN_STATUSES: [&str; 2] = ["nothing_to_recover", "noop"];

/// A primitive operation a plan may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionOp {
    /// Create an empty file that must not exist yet.
    Touch,
    /// Ensure a directory exists.
    Mkdir,
    /// Regenerate a blueprint-owned file.
    Regen,
}

impl ActionOp {
    /// Parses an operation name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "touch" => Some(Self::Touch),
            "mkdir" => Some(Self::Mkdir),
            "regen" => Some(Self::Regen),
            _ => None,
        }
    }

    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Touch => "touch",
            Self::Mkdir => "mkdir",
            Self::Regen => "regen",
        }
    }
}

impl fmt::Display for ActionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned action as declared, before any checking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanAction {
    /// Operation name.
    pub op: Option<String>,
    /// Relative path.
    pub path: Option<String>,
    /// Absolute path the planner resolved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
}

impl PlanAction {
    /// Creates an action.
    pub fn new(op: &str, path: &str) -> Self {
        Self {
            op: Some(op.to_string()),
            path: Some(path.to_string()),
            abs_path: None,
        }
    }

    /// Sets the absolute path.
    pub fn with_abs_path(mut self, abs_path: impl Into<String>) -> Self {
        self.abs_path = Some(abs_path.into());
        self
    }

    /// Execution order key: op, normalized path, abs_path.
    pub fn sort_key(&self) -> (String, String, String) {
        (
            self.op.clone().unwrap_or_default(),
            normalize_rel(self.path.as_deref().unwrap_or_default()),
            self.abs_path.clone().unwrap_or_default(),
        )
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            op: non_blank(object.get("op")),
            path: non_blank(object.get("path")),
            abs_path: non_blank(object.get("abs_path")),
        }
    }
}

/// A recovery plan.
///
/// Decoding is lenient: non-object actions and notes are dropped, and
/// blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplyPlan {
    /// Scaffold root the plan applies to; relative paths resolve against
    /// the working directory.
    pub path: Option<String>,
    /// Blueprint descriptor, usually `{"id": ..}`.
    pub blueprint: Option<Value>,
    /// Plan schema version.
    pub schema_version: Option<Value>,
    /// Planner status.
    pub status: Option<String>,
    /// Declared actions.
    pub actions: Vec<PlanAction>,
    /// Planner notes.
    pub notes: Vec<Map<String, Value>>,
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn objects(value: Option<&Value>) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

impl ApplyPlan {
    /// Creates an empty plan for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Adds an action.
    pub fn with_action(mut self, action: PlanAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the blueprint id.
    pub fn with_blueprint_id(mut self, id: &str) -> Self {
        self.blueprint = Some(serde_json::json!({ "id": id }));
        self
    }

    /// Decodes a plan document.
    ///
    /// # Errors
    ///
    /// Fails only if `value` is not a JSON object.
    pub fn from_value(value: &Value) -> ApplyResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ApplyError::invalid_plan("plan must be a JSON object"))?;
        Ok(Self {
            path: non_blank(object.get("path")),
            blueprint: object.get("blueprint").filter(|v| !v.is_null()).cloned(),
            schema_version: object.get("schema_version").filter(|v| !v.is_null()).cloned(),
            status: non_blank(object.get("status")),
            actions: objects(object.get("actions"))
                .map(PlanAction::from_object)
                .collect(),
            notes: objects(object.get("notes")).cloned().collect(),
        })
    }

    /// Reads and decodes a plan file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not JSON, or is not an object.
    pub fn read(path: &Path) -> ApplyResult<Self> {
        let data = fs::read(path)?;
        let value: Value = serde_json::from_slice(&data)?;
        Self::from_value(&value)
    }

    /// Returns the blueprint id, if the plan names one.
    pub fn blueprint_id(&self) -> Option<&str> {
        self.blueprint
            .as_ref()
            .and_then(|b| b.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Returns true if the planner said there is nothing to do.
    pub fn is_noop(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| NOOP_PLAN_STATUSES.contains(&s))
    }

    /// Returns the actions in execution order.
    pub fn sorted_actions(&self) -> Vec<PlanAction> {
        let mut actions = self.actions.clone();
        actions.sort_by_cached_key(PlanAction::sort_key);
        actions
    }
}
