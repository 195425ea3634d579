//! Explicit TXLOG writer.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::{TxLogError, TxLogResult};
use crate::record::{TxEvent, TxRecord};
use crate::scaffold::txlog_dir;

/// Generates a transaction id (32 lowercase hex characters).
pub fn new_tx_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn validate_op(op: &str) -> TxLogResult<()> {
    let ok = !op.is_empty()
        && op
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'));
    if ok {
        Ok(())
    } else {
        Err(TxLogError::InvalidOp(op.to_string()))
    }
}

/// Returned by [`TxLogWriter::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    /// Transaction id.
    pub tx_id: String,
    /// Start timestamp.
    pub started_at: String,
    /// Log file.
    pub log_path: PathBuf,
}

/// Writer for one transaction's log file.
///
/// The file is created exclusively and locked for the writer's lifetime.
/// Every line is flushed as soon as it is written.
#[derive(Debug)]
pub struct TxLogWriter {
    path: PathBuf,
    tx_id: String,
    op: String,
    target: String,
    file: File,
}

impl TxLogWriter {
    /// Creates a log file for a new transaction under `scaffold_root`.
    ///
    /// # Errors
    ///
    /// Fails for an invalid `op`, an I/O error, or a locked file.
    pub fn create(scaffold_root: &Path, op: &str, target: &str) -> TxLogResult<Self> {
        Self::create_with_id(&txlog_dir(scaffold_root), op, target, &new_tx_id())
    }

    /// Creates `<dir>/<op>-<tx_id>.jsonl` for a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Fails for an invalid `op` or `tx_id`, an I/O error, or a locked file.
    pub fn create_with_id(dir: &Path, op: &str, target: &str, tx_id: &str) -> TxLogResult<Self> {
        validate_op(op)?;
        validate_op(tx_id)?;
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("{op}-{tx_id}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        if file.try_lock_exclusive().is_err() {
            return Err(TxLogError::Locked(path));
        }

        debug!(path = %path.display(), tx_id, "opened txlog");
        Ok(Self {
            path,
            tx_id: tx_id.to_string(),
            op: op.to_string(),
            target: target.to_string(),
            file,
        })
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the transaction id.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn record(&self, event: TxEvent) -> TxRecord {
        TxRecord::new(event, &self.tx_id, &self.op, &self.target)
    }

    fn write(&mut self, record: &TxRecord) -> TxLogResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    /// Writes the `begin` line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn begin(&mut self, meta: Map<String, Value>) -> TxLogResult<TxContext> {
        let mut record = self.record(TxEvent::Begin);
        record.started_at = Some(record.at.clone());
        record.meta = Some(meta);
        self.write(&record)?;
        Ok(TxContext {
            tx_id: self.tx_id.clone(),
            started_at: record.at,
            log_path: self.path.clone(),
        })
    }

    /// Writes an `action` line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn action(&mut self, action: Value) -> TxLogResult<()> {
        let mut record = self.record(TxEvent::Action);
        record.action = Some(action);
        self.write(&record)
    }

    /// Writes the `commit` line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn commit(&mut self, summary: Value) -> TxLogResult<()> {
        let mut record = self.record(TxEvent::Commit);
        record.summary = Some(summary);
        self.write(&record)
    }

    /// Writes the `abort` line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn abort(&mut self, reason: &str, error: Option<&str>) -> TxLogResult<()> {
        let mut record = self.record(TxEvent::Abort);
        record.reason = Some(reason.to_string());
        record.error = Some(error.unwrap_or_default().to_string());
        self.write(&record)
    }

    /// Syncs the file to disk and releases the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn close(self) -> TxLogResult<()> {
        self.file.sync_all()?;
        FileExt::unlock(&self.file)?;
        Ok(())
    }
}
