//! # thnsync TXLOG
//!
//! Scaffold-local, append-only transaction log.
//!
//! Every apply writes one JSONL file under `<scaffold_root>/.thn/txlog/`
//! named `<op>-<tx_id>.jsonl`. Each line is one event:
//!
//! ```text
//! {"event":"begin","started_at":"...","at":"...","tx_id":"...","op":"...","target":"...","meta":{}}
//! {"event":"action","action":{...},"at":"...",...}
//! {"event":"commit","summary":{...},"at":"...",...}
//! {"event":"abort","reason":"...","error":"...","at":"...",...}
//! ```
//!
//! Logging is scaffold-scoped: without a `.thn` marker above the working
//! directory nothing is written and no marker is created.
//!
//! Two APIs are provided:
//! - [`TxLogWriter`] is explicit and fallible
//! - [`TxLogSession`] is best-effort; write failures are kept as a
//!   diagnostic and never reach the caller's control flow
//!
//! The writer holds an exclusive advisory lock on its file while open, so
//! records of one transaction are never interleaved with another process.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;
mod scaffold;
mod session;
mod writer;

pub use error::{TxLogError, TxLogResult};
pub use record::{utc_now_iso, TxEvent, TxRecord};
pub use scaffold::{discover_scaffold_root, txlog_dir, SCAFFOLD_MARKER, TXLOG_DIR};
pub use session::{TxLogDiagnostic, TxLogSession};
pub use writer::{new_tx_id, TxContext, TxLogWriter};
