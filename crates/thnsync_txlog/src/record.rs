//! TXLOG line format.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current UTC time as RFC 3339 with a `Z` suffix.
pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Event type of a TXLOG line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxEvent {
    /// Transaction start.
    Begin,
    /// One executed action.
    Action,
    /// Successful end.
    Commit,
    /// Failed or rejected end.
    Abort,
}

impl TxEvent {
    /// Returns true for `commit` and `abort`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Commit | Self::Abort)
    }
}

/// One TXLOG line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Event type.
    pub event: TxEvent,
    /// Transaction id (opaque).
    pub tx_id: String,
    /// Operation name, e.g. `sync_apply`.
    pub op: String,
    /// Target the operation acts on.
    pub target: String,
    /// Time the line was written.
    pub at: String,
    /// Start time, on `begin` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Caller metadata, on `begin` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    /// Action description, on `action` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Value>,
    /// Outcome summary, on `commit` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    /// Abort reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Abort error detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TxRecord {
    pub(crate) fn new(event: TxEvent, tx_id: &str, op: &str, target: &str) -> Self {
        Self {
            event,
            tx_id: tx_id.to_string(),
            op: op.to_string(),
            target: target.to_string(),
            at: utc_now_iso(),
            started_at: None,
            meta: None,
            action: None,
            summary: None,
            reason: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn timestamp_is_utc_z() {
        let now = utc_now_iso();
        assert!(now.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[test]
    fn commit_line_shape() {
        let mut record = TxRecord::new(TxEvent::Commit, "abc123", "sync_apply", "/dest");
        record.summary = Some(serde_json::json!({"applied": 2}));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["event"], "commit");
        assert_eq!(value["tx_id"], "abc123");
        assert_eq!(value["summary"]["applied"], 2);
        assert!(value.get("reason").is_none());
        assert!(value.get("started_at").is_none());
    }

    #[test]
    fn terminal_events() {
        assert!(TxEvent::Commit.is_terminal());
        assert!(TxEvent::Abort.is_terminal());
        assert!(!TxEvent::Begin.is_terminal());
        assert!(!TxEvent::Action.is_terminal());
    }
}
