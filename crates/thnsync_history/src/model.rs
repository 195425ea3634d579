//! History query and report types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result limit used when the query does not set a positive one.
pub const DEFAULT_LIMIT: usize = 50;

/// Filters for [`crate::load_sync_history`].
///
/// Filters are exact string matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Largest number of transactions returned; `<= 0` means the default.
    pub limit: i64,
    /// Keep only transactions with this target.
    pub target: Option<String>,
    /// Keep only this transaction.
    pub tx_id: Option<String>,
}

impl HistoryQuery {
    /// A query with the default limit and no filters.
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT as i64,
            target: None,
            tx_id: None,
        }
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Filters by target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Filters by transaction id.
    pub fn with_tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = Some(tx_id.into());
        self
    }

    /// The limit actually applied.
    pub fn effective_limit(&self) -> usize {
        usize::try_from(self.limit)
            .ok()
            .filter(|&l| l > 0)
            .unwrap_or(DEFAULT_LIMIT)
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// A `commit` line was seen.
    Commit,
    /// An `abort` line was seen.
    Abort,
    /// No terminal line was seen.
    Unknown,
}

impl Outcome {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Abort => "abort",
            Self::Unknown => "unknown",
        }
    }
}

/// How much of a transaction was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Integrity {
    /// Start and terminal event observed.
    Complete,
    /// Some events missing.
    Partial,
    /// Malformed lines were involved.
    Unknown,
}

impl Integrity {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Unknown => "unknown",
        }
    }
}

/// One reconstructed transaction.
///
/// Absent strings are empty rather than null so the JSON shape is stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction id, or `"unknown"`.
    pub tx_id: String,
    /// First non-empty `op` seen.
    pub op: String,
    /// First non-empty `target` seen.
    pub target: String,
    /// From the `begin` event.
    pub started_at: String,
    /// From the terminal event.
    pub ended_at: String,
    /// Terminal outcome.
    pub outcome: Outcome,
    /// Observed completeness.
    pub integrity: Integrity,
    /// Commit summary, or `{reason, error}` for aborts.
    pub summary: Map<String, Value>,
    /// When the history was read.
    pub observed_at: String,
    /// Why the `unknown` group exists.
    pub reason: String,
}

/// Result of [`crate::load_sync_history`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    /// Always `"OK"`; reading does not fail.
    pub status: String,
    /// Scaffold root as given.
    pub scaffold_root: String,
    /// Directory that was read.
    pub txlog_dir: String,
    /// Transactions, most recent first.
    pub history: Vec<TransactionSummary>,
    /// Length of `history`.
    pub count: usize,
    /// Whether the limit cut the list.
    pub truncated: bool,
    /// Informational notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}
