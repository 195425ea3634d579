//! TXLOG parsing and aggregation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::model::{HistoryQuery, HistoryReport, Integrity, Outcome, TransactionSummary};

/// Bucket for records without a usable transaction id.
pub const UNKNOWN_TX_ID: &str = "unknown";

/// Default number of parent directories searched by [`find_scaffold_root`].
pub const DEFAULT_MAX_DEPTH: usize = 10;

const MALFORMED: &str = "malformed";

fn txlog_dir(scaffold_root: &Path) -> PathBuf {
    scaffold_root.join(".thn").join("txlog")
}

/// Searches upward from `start`, at most `max_depth` parents, for a
/// directory containing `.thn/txlog`.
pub fn find_scaffold_root(start: &Path, max_depth: usize) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .take(max_depth + 1)
        .find(|dir| txlog_dir(dir).is_dir())
        .map(Path::to_path_buf)
}

fn malformed(line: &str) -> Value {
    json!({"event": MALFORMED, "raw": line, "tx_id": UNKNOWN_TX_ID})
}

/// Reads the records of one TXLOG file.
///
/// Lines that are not JSON objects are kept as
/// `{"event": "malformed", "raw": ..., "tx_id": "unknown"}`. An unreadable
/// file yields no records.
pub fn read_records(path: &Path) -> Vec<Value> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable txlog");
            return Vec::new();
        }
    };
    String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) if value.is_object() => value,
            _ => malformed(line),
        })
        .collect()
}

fn txlog_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    files.sort();
    files
}

fn str_field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).map(str::trim).unwrap_or("")
}

struct Group {
    tx: TransactionSummary,
    saw_malformed: bool,
}

fn aggregate(records: &[Value], observed_at: &str) -> Vec<TransactionSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for record in records {
        let tx_id = match str_field(record, "tx_id") {
            "" => UNKNOWN_TX_ID,
            id => id,
        };
        let group = groups.entry(tx_id.to_string()).or_insert_with(|| {
            order.push(tx_id.to_string());
            Group {
                tx: TransactionSummary {
                    tx_id: tx_id.to_string(),
                    op: String::new(),
                    target: String::new(),
                    started_at: String::new(),
                    ended_at: String::new(),
                    outcome: Outcome::Unknown,
                    integrity: Integrity::Partial,
                    summary: Map::new(),
                    observed_at: observed_at.to_string(),
                    reason: String::new(),
                },
                saw_malformed: false,
            }
        });
        let tx = &mut group.tx;

        if tx.op.is_empty() {
            tx.op = str_field(record, "op").to_string();
        }
        if tx.target.is_empty() {
            tx.target = str_field(record, "target").to_string();
        }

        let at = str_field(record, "at");
        match str_field(record, "event") {
            MALFORMED => {
                group.saw_malformed = true;
                if tx.tx_id == UNKNOWN_TX_ID && tx.reason.is_empty() {
                    tx.reason = "malformed_jsonl_line".to_string();
                }
            }
            "begin" => {
                let started = match str_field(record, "started_at") {
                    "" => at,
                    s => s,
                };
                if tx.started_at.is_empty() {
                    tx.started_at = started.to_string();
                }
            }
            "commit" => {
                tx.outcome = Outcome::Commit;
                if !at.is_empty() {
                    tx.ended_at = at.to_string();
                }
                if let Some(summary) = record.get("summary").and_then(Value::as_object) {
                    tx.summary = summary.clone();
                }
            }
            "abort" => {
                tx.outcome = Outcome::Abort;
                if !at.is_empty() {
                    tx.ended_at = at.to_string();
                }
                let mut summary = Map::new();
                summary.insert("reason".into(), str_field(record, "reason").into());
                summary.insert("error".into(), str_field(record, "error").into());
                tx.summary = summary;
            }
            "action" => {}
            _ => {
                if tx.tx_id == UNKNOWN_TX_ID && tx.reason.is_empty() {
                    tx.reason = "unknown_event_type".to_string();
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .map(|group| {
            let mut tx = group.tx;
            tx.integrity = if group.saw_malformed {
                Integrity::Unknown
            } else if !tx.started_at.is_empty() && tx.outcome != Outcome::Unknown {
                Integrity::Complete
            } else {
                Integrity::Partial
            };
            tx
        })
        .collect()
}

/// Best-effort ISO-8601 parse: RFC 3339 (with `Z` or an offset) or a naive
/// timestamp taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn sort_key(tx: &TransactionSummary) -> Option<DateTime<Utc>> {
    parse_timestamp(&tx.ended_at).or_else(|| parse_timestamp(&tx.started_at))
}

/// Reconstructs the transaction history of `scaffold_root`.
///
/// Transactions are filtered, sorted most recent first (by `ended_at`,
/// falling back to `started_at`; unparsable times last) and cut to the
/// query limit.
pub fn load_sync_history(scaffold_root: &Path, query: &HistoryQuery) -> HistoryReport {
    let dir = txlog_dir(scaffold_root);
    let observed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let root = scaffold_root
        .canonicalize()
        .unwrap_or_else(|_| scaffold_root.to_path_buf());

    let mut report = HistoryReport {
        status: "OK".to_string(),
        scaffold_root: root.display().to_string(),
        txlog_dir: dir.display().to_string(),
        history: Vec::new(),
        count: 0,
        truncated: false,
        notes: Vec::new(),
    };

    let files = txlog_files(&dir);
    if files.is_empty() {
        report.notes.push("No txlog files found.".to_string());
        return report;
    }

    let records: Vec<Value> = files.iter().flat_map(|f| read_records(f)).collect();
    let mut items = aggregate(&records, &observed_at);

    if let Some(tx_id) = &query.tx_id {
        items.retain(|t| &t.tx_id == tx_id);
    }
    if let Some(target) = &query.target {
        items.retain(|t| &t.target == target);
    }

    // Stable sort keeps file order among equal keys.
    items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));

    let limit = query.effective_limit();
    report.truncated = items.len() > limit;
    items.truncate(limit);
    report.count = items.len();
    report.history = items;
    debug!(
        files = files.len(),
        records = records.len(),
        count = report.count,
        "loaded txlog history"
    );
    report
}
