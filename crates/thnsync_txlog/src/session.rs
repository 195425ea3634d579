//! Best-effort TXLOG session.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::TxLogResult;
use crate::scaffold::{discover_scaffold_root, txlog_dir};
use crate::writer::{new_tx_id, TxLogWriter};

/// TXLOG state reported alongside an operation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TxLogDiagnostic {
    /// Whether a scaffold was found and logging was attempted.
    pub enabled: bool,
    /// Transaction id.
    pub tx_id: String,
    /// Log file, when one was opened.
    pub path: Option<PathBuf>,
    /// First write failure.
    pub error: Option<String>,
}

/// A transaction log that never fails.
///
/// Write errors are logged with `tracing` and the first one is kept for
/// [`diagnostic`](Self::diagnostic). After a failure the session stops
/// writing. Without a scaffold every call is a no-op.
#[derive(Debug)]
pub struct TxLogSession {
    tx_id: String,
    enabled: bool,
    path: Option<PathBuf>,
    writer: Option<TxLogWriter>,
    error: Option<String>,
}

impl TxLogSession {
    /// Starts a session for the scaffold enclosing `working_dir`.
    pub fn start(working_dir: &Path, op: &str, target: &str) -> Self {
        match discover_scaffold_root(working_dir) {
            Some(root) => Self::at_root(&root, op, target),
            None => Self::disabled(),
        }
    }

    /// Starts a session logging under `scaffold_root`.
    pub fn at_root(scaffold_root: &Path, op: &str, target: &str) -> Self {
        let tx_id = new_tx_id();
        let opened = TxLogWriter::create_with_id(&txlog_dir(scaffold_root), op, target, &tx_id);
        match opened {
            Ok(writer) => Self {
                tx_id,
                enabled: true,
                path: Some(writer.path().to_path_buf()),
                writer: Some(writer),
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "txlog unavailable");
                Self {
                    tx_id,
                    enabled: true,
                    path: None,
                    writer: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// A session that writes nothing.
    pub fn disabled() -> Self {
        Self {
            tx_id: new_tx_id(),
            enabled: false,
            path: None,
            writer: None,
            error: None,
        }
    }

    /// Returns the transaction id. Disabled sessions still have one.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Returns true while lines are being written.
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    fn attempt<F>(&mut self, write: F)
    where
        F: FnOnce(&mut TxLogWriter) -> TxLogResult<()>,
    {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(e) = write(writer) {
            warn!(tx_id = %self.tx_id, error = %e, "txlog write failed");
            self.error.get_or_insert_with(|| e.to_string());
            self.writer = None;
        }
    }

    /// Writes `begin`.
    pub fn begin(&mut self, meta: Map<String, Value>) {
        self.attempt(|w| w.begin(meta).map(|_| ()));
    }

    /// Writes an `action` line.
    pub fn action(&mut self, action: Value) {
        self.attempt(|w| w.action(action));
    }

    /// Writes `commit` and closes the log.
    pub fn commit(&mut self, summary: Value) {
        self.attempt(|w| w.commit(summary));
        self.close();
    }

    /// Writes `abort` and closes the log.
    pub fn abort(&mut self, reason: &str, error: Option<&str>) {
        self.attempt(|w| w.abort(reason, error));
        self.close();
    }

    fn close(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.close() {
                warn!(tx_id = %self.tx_id, error = %e, "txlog close failed");
                self.error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    /// Snapshot of the session state for reports.
    pub fn diagnostic(&self) -> TxLogDiagnostic {
        TxLogDiagnostic {
            enabled: self.enabled,
            tx_id: self.tx_id.clone(),
            path: self.path.clone(),
            error: self.error.clone(),
        }
    }
}
