//! Structural manifest validation.
//!
//! Checks the minimum shape downstream stages rely on. Signatures, routing
//! metadata and chunk integrity are out of scope here, and unknown keys are
//! always tolerated.

use crate::error::ManifestValidationError;
use crate::manifest::MANIFEST_VERSION;
use serde_json::{Map, Value};

/// Accepted `mode` values, sorted.
pub const VALID_MODES: [&str; 2] = ["cdc-delta", "raw-zip"];

/// Validates an untyped manifest.
///
/// Rules:
/// - the manifest is a JSON object with numeric `version == 2` (`2.0` counts)
/// - `mode` is one of [`VALID_MODES`]
/// - `raw-zip`: `file_count` and `total_size` are non-negative integers and
///   `file_hashes`, when present and non-null, maps paths to strings
/// - `cdc-delta`: `files` is a list of objects, each with a non-empty string
///   `path` and a non-negative integer `size`
///
/// # Errors
///
/// Returns the first violated rule. The input is never modified.
pub fn validate(manifest: &Value) -> Result<(), ManifestValidationError> {
    let result = validate_inner(manifest);
    if let Err(e) = &result {
        tracing::debug!(reason = %e, "manifest rejected");
    }
    result
}

fn validate_inner(manifest: &Value) -> Result<(), ManifestValidationError> {
    let object = manifest
        .as_object()
        .ok_or(ManifestValidationError::NotAnObject)?;

    let version = object.get("version").cloned().unwrap_or(Value::Null);
    if !is_supported_version(&version) {
        return Err(ManifestValidationError::UnsupportedVersion(version));
    }

    let mode = object.get("mode").cloned().unwrap_or(Value::Null);
    match mode.as_str() {
        Some("raw-zip") => validate_raw_zip(object),
        Some("cdc-delta") => validate_cdc_delta(object),
        _ => Err(ManifestValidationError::UnsupportedMode(mode)),
    }
}

/// `2` and `2.0` are the same number in JSON.
fn is_supported_version(version: &Value) -> bool {
    version.as_u64() == Some(u64::from(MANIFEST_VERSION))
        || version.as_f64() == Some(f64::from(MANIFEST_VERSION))
}

fn is_non_negative_integer(value: &Value) -> bool {
    value.as_u64().is_some()
}

fn validate_raw_zip(object: &Map<String, Value>) -> Result<(), ManifestValidationError> {
    let file_count = object
        .get("file_count")
        .ok_or(ManifestValidationError::MissingField("file_count"))?;
    let total_size = object
        .get("total_size")
        .ok_or(ManifestValidationError::MissingField("total_size"))?;

    if !is_non_negative_integer(file_count) {
        return Err(ManifestValidationError::InvalidFileCount(file_count.clone()));
    }
    if !is_non_negative_integer(total_size) {
        return Err(ManifestValidationError::InvalidTotalSize(total_size.clone()));
    }

    match object.get("file_hashes") {
        None | Some(Value::Null) => {}
        Some(Value::Object(hashes)) => {
            if let Some((path, _)) = hashes.iter().find(|(_, v)| !v.is_string()) {
                return Err(ManifestValidationError::InvalidFileHash(path.clone()));
            }
        }
        Some(_) => return Err(ManifestValidationError::InvalidFileHashes),
    }
    Ok(())
}

fn validate_cdc_delta(object: &Map<String, Value>) -> Result<(), ManifestValidationError> {
    let files = object
        .get("files")
        .and_then(Value::as_array)
        .ok_or(ManifestValidationError::FilesNotList)?;

    for entry in files {
        let entry = entry
            .as_object()
            .ok_or(ManifestValidationError::FileEntryNotObject)?;

        let path = match entry.get("path").and_then(Value::as_str) {
            Some(path) if !path.is_empty() => path,
            _ => return Err(ManifestValidationError::InvalidFilePath),
        };

        let size = entry.get("size").cloned().unwrap_or(Value::Null);
        if !is_non_negative_integer(&size) {
            return Err(ManifestValidationError::InvalidFileSize {
                path: path.to_string(),
                size,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(extra: Value) -> Value {
        let mut base = json!({"version": 2, "mode": "raw-zip", "file_count": 0, "total_size": 0});
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        base
    }

    #[test]
    fn accepts_minimal_raw_zip() {
        assert!(validate(&raw(json!({}))).is_ok());
    }

    #[test]
    fn accepts_unknown_keys() {
        assert!(validate(&raw(json!({"source_zip": "x.zip", "routing": {"a": 1}}))).is_ok());
        let cdc = json!({
            "version": 2, "mode": "cdc-delta",
            "files": [{"path": "a", "size": 0, "fingerprint": [1, 2]}],
            "anything": null
        });
        assert!(validate(&cdc).is_ok());
    }

    #[test]
    fn rejects_non_object() {
        assert_eq!(
            validate(&json!([1, 2])),
            Err(ManifestValidationError::NotAnObject)
        );
    }

    #[test]
    fn integral_float_version_is_accepted() {
        let mut m = raw(json!({}));
        m["version"] = json!(2.0);
        assert_eq!(validate(&m), Ok(()));
    }

    #[test]
    fn rejects_bad_version() {
        for version in [
            json!(1),
            json!(3),
            json!("2"),
            json!(2.5),
            json!(true),
            json!(-2),
            Value::Null,
        ] {
            let mut m = raw(json!({}));
            m["version"] = version.clone();
            assert_eq!(
                validate(&m),
                Err(ManifestValidationError::UnsupportedVersion(version))
            );
        }
        let missing = json!({"mode": "raw-zip", "file_count": 0, "total_size": 0});
        assert_eq!(
            validate(&missing),
            Err(ManifestValidationError::UnsupportedVersion(Value::Null))
        );
    }

    #[test]
    fn rejects_bad_mode() {
        let m = json!({"version": 2, "mode": "zip"});
        let err = validate(&m).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported manifest mode: \"zip\". Valid modes: [\"cdc-delta\", \"raw-zip\"]"
        );
        let m = json!({"version": 2});
        assert_eq!(
            validate(&m),
            Err(ManifestValidationError::UnsupportedMode(Value::Null))
        );
    }

    #[test]
    fn raw_zip_requires_counts() {
        let m = json!({"version": 2, "mode": "raw-zip", "total_size": 1});
        assert_eq!(
            validate(&m),
            Err(ManifestValidationError::MissingField("file_count"))
        );
        let m = json!({"version": 2, "mode": "raw-zip", "file_count": 1});
        assert_eq!(
            validate(&m),
            Err(ManifestValidationError::MissingField("total_size"))
        );
    }

    #[test]
    fn raw_zip_rejects_negative_or_non_integer_counts() {
        assert_eq!(
            validate(&raw(json!({"file_count": -1}))),
            Err(ManifestValidationError::InvalidFileCount(json!(-1)))
        );
        assert_eq!(
            validate(&raw(json!({"file_count": true}))),
            Err(ManifestValidationError::InvalidFileCount(json!(true)))
        );
        assert_eq!(
            validate(&raw(json!({"total_size": 1.5}))),
            Err(ManifestValidationError::InvalidTotalSize(json!(1.5)))
        );
    }

    #[test]
    fn raw_zip_file_hashes_shape() {
        assert!(validate(&raw(json!({"file_hashes": null}))).is_ok());
        assert!(validate(&raw(json!({"file_hashes": {"a": "ff"}}))).is_ok());
        assert_eq!(
            validate(&raw(json!({"file_hashes": ["a"]}))),
            Err(ManifestValidationError::InvalidFileHashes)
        );
        assert_eq!(
            validate(&raw(json!({"file_hashes": {"a": {"nested": 1}}}))),
            Err(ManifestValidationError::InvalidFileHash("a".into()))
        );
    }

    #[test]
    fn raw_zip_does_not_require_files() {
        assert!(validate(&raw(json!({"files": "not a list"}))).is_ok());
    }

    #[test]
    fn cdc_delta_requires_files_list() {
        let m = json!({"version": 2, "mode": "cdc-delta"});
        assert_eq!(validate(&m), Err(ManifestValidationError::FilesNotList));
        let m = json!({"version": 2, "mode": "cdc-delta", "files": {}});
        assert_eq!(validate(&m), Err(ManifestValidationError::FilesNotList));
        let m = json!({"version": 2, "mode": "cdc-delta", "files": []});
        assert!(validate(&m).is_ok());
    }

    #[test]
    fn cdc_delta_entry_rules() {
        let check = |entry: Value| {
            validate(&json!({"version": 2, "mode": "cdc-delta", "files": [entry]}))
        };
        assert_eq!(
            check(json!("a.txt")),
            Err(ManifestValidationError::FileEntryNotObject)
        );
        assert_eq!(
            check(json!({"path": "", "size": 1})),
            Err(ManifestValidationError::InvalidFilePath)
        );
        assert_eq!(
            check(json!({"size": 1})),
            Err(ManifestValidationError::InvalidFilePath)
        );
        assert_eq!(
            check(json!({"path": "a"})),
            Err(ManifestValidationError::InvalidFileSize {
                path: "a".into(),
                size: Value::Null
            })
        );
        assert_eq!(
            check(json!({"path": "a", "size": -4})),
            Err(ManifestValidationError::InvalidFileSize {
                path: "a".into(),
                size: json!(-4)
            })
        );
    }

    #[test]
    fn validation_does_not_mutate() {
        let m = raw(json!({"zzz": 1}));
        let before = m.clone();
        validate(&m).unwrap();
        assert_eq!(m, before);
    }
}
