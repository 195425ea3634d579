//! Several transactions in one scaffold.

use std::fs;

use serde_json::{json, Map, Value};
use tempfile::tempdir;
use thnsync_txlog::{txlog_dir, TxLogSession, TxLogWriter, TxRecord};

#[test]
fn one_file_per_transaction() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".thn")).unwrap();
    let nested = dir.path().join("src/deep");
    fs::create_dir_all(&nested).unwrap();

    let mut ids = Vec::new();
    for i in 0..3 {
        let mut session = TxLogSession::start(&nested, "recover", "scaffold");
        ids.push(session.tx_id().to_string());
        session.begin(Map::new());
        session.commit(json!({"run": i}));
    }

    let mut names: Vec<String> = fs::read_dir(txlog_dir(dir.path()))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    let mut expected: Vec<String> = ids.iter().map(|id| format!("recover-{id}.jsonl")).collect();
    expected.sort();
    assert_eq!(names, expected);
}

#[test]
fn lines_decode_as_records() {
    let dir = tempdir().unwrap();
    let mut writer = TxLogWriter::create(dir.path(), "sync_apply", "/dest").unwrap();
    let mut meta = Map::new();
    meta.insert("dry_run".into(), Value::Bool(false));
    writer.begin(meta).unwrap();
    writer.abort("apply_failed", Some("disk full")).unwrap();
    let path = writer.path().to_path_buf();
    writer.close().unwrap();

    let records: Vec<TxRecord> = fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].meta.as_ref().unwrap()["dry_run"], false);
    assert!(records[1].event.is_terminal());
    assert_eq!(records[1].error.as_deref(), Some("disk full"));
}
