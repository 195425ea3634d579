//! End-to-end envelope tests.

use proptest::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::tempdir;
use thnsync_chunker::{Chunker, ChunkerConfig};
use thnsync_manifest::{
    build_cdc_envelope, build_raw_envelope, summarize_cdc_files, summarize_manifest, validate,
    Envelope, Manifest, ManifestValidationError,
};

#[test]
fn raw_envelope_survives_disk() {
    let src = tempdir().unwrap();
    fs::create_dir_all(src.path().join("assets/img")).unwrap();
    fs::write(src.path().join("index.html"), b"<html></html>").unwrap();
    fs::write(src.path().join("assets/img/logo.svg"), b"<svg/>").unwrap();

    let out = tempdir().unwrap();
    let path = out.path().join("web.tar");
    build_raw_envelope(src.path(), Some("web"))
        .unwrap()
        .write_to(&path)
        .unwrap();

    let envelope = Envelope::read_from(&path).unwrap();
    envelope.verify_payload().unwrap();
    assert_eq!(envelope.files["assets/img/logo.svg"], b"<svg/>");

    let summary = summarize_manifest(&envelope.manifest.to_value());
    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.total_size, 19);
}

#[test]
fn cdc_envelope_survives_disk() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("big.bin"), vec![9u8; 5_000]).unwrap();
    let chunker = Chunker::new(ChunkerConfig::new(256, 512, 1024)).unwrap();

    let out = tempdir().unwrap();
    let path = out.path().join("delta.tar");
    let built = build_cdc_envelope(src.path(), Some("web"), &chunker, None).unwrap();
    built.write_to(&path).unwrap();

    let loaded = Envelope::read_from(&path).unwrap();
    assert_eq!(loaded, built);
    let listing = summarize_cdc_files(&loaded.manifest.to_value(), 10);
    assert!(listing.present);
    assert_eq!(listing.files[0].name.as_deref(), Some("big.bin"));
    assert_eq!(listing.files[0].size, Some(5_000));
}

#[test]
fn unknown_keys_survive_typed_decode_rules() {
    let value = json!({
        "version": 2,
        "mode": "cdc-delta",
        "files": [{"path": "a", "size": 1, "chunks": [], "future_field": {"x": 1}}],
        "signature": "abc"
    });
    assert!(Manifest::from_value(&value).is_ok());
}

proptest! {
    #[test]
    fn size_accepted_iff_non_negative_integer(size in any::<i64>()) {
        let value = json!({
            "version": 2,
            "mode": "cdc-delta",
            "files": [{"path": "f", "size": size}]
        });
        let result = validate(&value);
        if size >= 0 {
            prop_assert!(result.is_ok());
        } else {
            let is_invalid_size = matches!(result, Err(ManifestValidationError::InvalidFileSize { .. }));
            prop_assert!(is_invalid_size);
        }
    }

    #[test]
    fn validate_never_panics(key in "[a-z_]{1,12}", n in any::<i64>(), s in ".{0,16}") {
        let value = json!({ "version": 2, "mode": s, key: n });
        let _ = validate(&value);
        let _ = summarize_manifest(&value);
        let _ = summarize_cdc_files(&value, 5);
    }
}
