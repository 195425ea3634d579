//! Envelope apply scenarios: raw and CDC deltas, with stores and TXLOG.

use std::fs;
use thnsync_apply::{apply_envelope, ApplyOptions, DirectoryTarget, SYNC_APPLY_OP};
use thnsync_chunker::{Chunker, ChunkerConfig};
use thnsync_history::{load_sync_history, HistoryQuery, Integrity, Outcome};
use thnsync_manifest::{build_cdc_envelope, build_raw_envelope, Envelope, Manifest};
use thnsync_store::{ChunkStore, FileChunkStore};
use thnsync_testkit::{pseudo_random_bytes, SourceTree, TempScaffold};

fn chunker() -> Chunker {
    Chunker::new(ChunkerConfig::new(64, 128, 256)).unwrap()
}

#[test]
fn raw_envelope_apply_is_logged() {
    let source = SourceTree::with_files(&[("index.html", "<h1>hi</h1>"), ("js/app.js", "run()")]);
    let dest = TempScaffold::new();
    let envelope = build_raw_envelope(source.path(), Some("web")).unwrap();

    let target = DirectoryTarget::new("web", dest.path());
    let report = apply_envelope(&envelope, &target, None, &ApplyOptions::new());
    assert!(report.success, "{:?}", report.errors);
    assert_eq!(report.applied_count, 2);
    assert_eq!(fs::read(dest.path().join("js/app.js")).unwrap(), b"run()");

    let records = dest.txlog_records();
    let canonical = dest.path().canonicalize().unwrap();
    assert_eq!(records[0]["op"], SYNC_APPLY_OP);
    assert_eq!(records[0]["target"], canonical.display().to_string());
    assert_eq!(records.last().unwrap()["event"], "commit");

    let history = load_sync_history(dest.path(), &HistoryQuery::new());
    let tx = &history.history[0];
    assert_eq!(tx.outcome, Outcome::Commit);
    assert_eq!(tx.integrity, Integrity::Complete);
    assert_eq!(tx.summary["applied_count"], 2);
}

#[test]
fn cdc_delta_round_trip_through_disk_and_store() {
    let source = SourceTree::with_files(&[
        ("big.bin", pseudo_random_bytes(4096, 1)),
        ("small.txt", b"small".to_vec()),
        ("gone.txt", b"bye".to_vec()),
    ]);
    let dest = TempScaffold::new();
    let store_dir = tempfile::tempdir().unwrap();
    let store = FileChunkStore::open(store_dir.path()).unwrap();
    let target = DirectoryTarget::new("web", dest.path());

    // Initial full transfer, through an on-disk envelope.
    let first = build_cdc_envelope(source.path(), Some("web"), &chunker(), None).unwrap();
    let path = store_dir.path().join("first.tar");
    first.write_to(&path).unwrap();
    let first = Envelope::read_from(&path).unwrap();
    let report = apply_envelope(&first, &target, Some(&store), &ApplyOptions::new());
    assert!(report.success, "{:?}", report.errors);
    assert_eq!(report.applied_count, 3);

    // Change one region of the big file, drop a file, add a file.
    let mut big = source.read("big.bin");
    big[2000..2010].copy_from_slice(b"0123456789");
    source.write("big.bin", &big);
    source.remove("gone.txt");
    source.write("new.txt", b"new");

    let previous = match &first.manifest {
        Manifest::CdcDelta(m) => m.snapshot_index(),
        Manifest::RawZip(_) => unreachable!(),
    };
    let mut delta =
        build_cdc_envelope(source.path(), Some("web"), &chunker(), Some(&previous)).unwrap();
    let before = delta.chunks.len();
    let needed: Vec<String> = delta
        .chunks
        .keys()
        .filter(|id| !store.contains("web", id).unwrap())
        .cloned()
        .collect();
    delta.retain_chunks(needed.iter().map(String::as_str));
    assert!(delta.chunks.len() < before, "store should already hold some chunks");

    let report = apply_envelope(&delta, &target, Some(&store), &ApplyOptions::new());
    assert!(report.success, "{:?}", report.errors);
    assert_eq!(report.deleted_files, 1);
    assert_eq!(fs::read(dest.path().join("big.bin")).unwrap(), big);
    assert_eq!(fs::read(dest.path().join("new.txt")).unwrap(), b"new");
    assert_eq!(fs::read(dest.path().join("small.txt")).unwrap(), b"small");
    assert!(!dest.path().join("gone.txt").exists());

    let diag = report.cdc_diagnostics.unwrap();
    assert!(!diag.payload_completeness.missing.is_empty());
    assert!(diag.chunk_health.missing_chunks.is_empty());

    let history = load_sync_history(dest.path(), &HistoryQuery::new().with_target(
        dest.path().canonicalize().unwrap().display().to_string(),
    ));
    assert_eq!(history.count, 2);
}

#[test]
fn tampered_payload_aborts_and_is_logged() {
    let source = SourceTree::with_files(&[("a.txt", "alpha")]);
    let dest = TempScaffold::new();
    let mut envelope = build_raw_envelope(source.path(), Some("web")).unwrap();
    envelope.files.insert("a.txt".into(), b"omega".to_vec());

    let target = DirectoryTarget::new("web", dest.path());
    let report = apply_envelope(&envelope, &target, None, &ApplyOptions::new());
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("Envelope validation failed"));
    assert!(!dest.path().join("a.txt").exists());

    let history = load_sync_history(dest.path(), &HistoryQuery::new());
    let tx = &history.history[0];
    assert_eq!(tx.outcome, Outcome::Abort);
    assert_eq!(tx.summary["reason"], "validation_failed");
}

#[cfg(unix)]
#[test]
fn envelope_cannot_write_through_symlink() {
    let source = SourceTree::with_files(&[("link/pwn.txt", "owned"), ("ok.txt", "fine")]);
    let dest = TempScaffold::new();
    let outside = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path(), dest.path().join("link")).unwrap();
    let envelope = build_raw_envelope(source.path(), Some("web")).unwrap();

    let target = DirectoryTarget::new("web", dest.path());
    let report = apply_envelope(&envelope, &target, None, &ApplyOptions::new());
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("Unsafe path in envelope"));
    assert!(report.errors.iter().any(|e| e.starts_with("link/pwn.txt")));
    assert!(!dest.path().join("ok.txt").exists());
    assert_eq!(fs::read_dir(outside.path()).unwrap().count(), 0);

    let history = load_sync_history(dest.path(), &HistoryQuery::new());
    assert_eq!(history.history[0].summary["reason"], "preflight_failed");
}
