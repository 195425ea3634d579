//! # thnsync History
//!
//! Read-only reconstruction of transactions from TXLOG files.
//!
//! The reader shares nothing with the writer but the JSONL line format, and
//! tolerates writers it has never seen:
//!
//! - lines that are not JSON objects become synthetic `malformed` records
//!   under `tx_id = "unknown"`
//! - records without a usable `tx_id` are grouped under `"unknown"`
//! - unknown event types are ignored
//!
//! Integrity is computed from what was observed, never inferred:
//! `complete` when both a start and a terminal event were seen, `unknown`
//! when a malformed line touched the group, `partial` otherwise.
//!
//! Reading never fails. A scaffold without a log directory yields an empty
//! report.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod model;
mod reader;
mod render;

pub use model::{HistoryQuery, HistoryReport, Integrity, Outcome, TransactionSummary, DEFAULT_LIMIT};
pub use reader::{
    find_scaffold_root, load_sync_history, read_records, DEFAULT_MAX_DEPTH, UNKNOWN_TX_ID,
};
pub use render::render_history_text;
