//! Relative path normalization and safety checks.

use std::path::Path;

use serde::Serialize;

use crate::context::RootContext;

/// Failure reason for paths that are empty, absolute or traverse upward.
pub const UNSAFE_PATH: &str = "Unsafe or invalid path";
/// Failure reason for a target that leaves the root, directly or through a
/// symlink.
pub const OUTSIDE_ROOT: &str = "Target outside scaffold root";
/// Failure reason for an `abs_path` that is not absolute.
pub const INVALID_ABS_PATH: &str = "Invalid abs_path";

/// Normalizes a relative path.
///
/// Backslashes become `/`, surrounding whitespace and leading `./` are
/// removed, then leading and trailing `/` are stripped.
pub fn normalize_rel(raw: &str) -> String {
    let slashed = raw.replace('\\', "/");
    let mut rest = slashed.trim();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.trim_matches('/').to_string()
}

fn is_drive_qualified(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Returns true if `raw` must never be joined onto a root.
///
/// Checked on the raw input so that `/etc/passwd` is rejected rather than
/// silently normalized to `etc/passwd`.
pub fn is_unsafe_rel(raw: &str) -> bool {
    let slashed = raw.replace('\\', "/");
    let trimmed = slashed.trim();
    if trimmed.starts_with('/') || is_drive_qualified(trimmed) {
        return true;
    }
    let rel = normalize_rel(trimmed);
    rel.is_empty() || rel.split('/').any(|segment| segment == "..")
}

/// Checks one declared path against `ctx`.
///
/// Returns the normalized relative path, or the failure reason.
pub fn check_path(
    ctx: &RootContext,
    raw: &str,
    abs_path: Option<&str>,
) -> Result<String, &'static str> {
    if is_unsafe_rel(raw) {
        return Err(UNSAFE_PATH);
    }
    let rel = normalize_rel(raw);
    if let Some(abs) = abs_path.map(str::trim).filter(|a| !a.is_empty()) {
        let abs = Path::new(abs);
        if !abs.is_absolute() {
            return Err(INVALID_ABS_PATH);
        }
        if !ctx.contains(abs) {
            return Err(OUTSIDE_ROOT);
        }
    }
    if !ctx.contains(&ctx.resolve(&rel)) {
        return Err(OUTSIDE_ROOT);
    }
    Ok(rel)
}

/// One rejected path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathFailure {
    /// Operation of the rejected item, when it has one.
    pub op: Option<String>,
    /// Normalized path.
    pub path: String,
    /// Failure reason.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn normalization() {
        assert_eq!(normalize_rel("./a/b/"), "a/b");
        assert_eq!(normalize_rel("././a"), "a");
        assert_eq!(normalize_rel("a\\b\\c"), "a/b/c");
        assert_eq!(normalize_rel("  /a/  "), "a");
        assert_eq!(normalize_rel("./"), "");
    }

    #[test]
    fn unsafe_paths() {
        for raw in [
            "",
            "   ",
            "./",
            "/etc/passwd",
            "//server/share",
            "\\windows",
            "C:/x",
            "c:\\x",
            "..",
            "../../etc/passwd",
            "a/../b",
            "a\\..\\b",
        ] {
            assert!(is_unsafe_rel(raw), "{raw:?} should be unsafe");
        }
        for raw in ["a", "a/b.txt", "./a", "a/..b", "..a/b", "a/./b"] {
            assert!(!is_unsafe_rel(raw), "{raw:?} should be safe");
        }
    }

    #[test]
    fn abs_path_checks() {
        let dir = tempdir().unwrap();
        let ctx = RootContext::new(dir.path()).unwrap();
        let inside = ctx.root().join("a.txt");
        let outside = PathBuf::from("/definitely/elsewhere");

        assert_eq!(
            check_path(&ctx, "a.txt", inside.to_str()),
            Ok("a.txt".to_string())
        );
        assert_eq!(check_path(&ctx, "a.txt", outside.to_str()), Err(OUTSIDE_ROOT));
        assert_eq!(check_path(&ctx, "a.txt", Some("rel/a.txt")), Err(INVALID_ABS_PATH));
        assert_eq!(check_path(&ctx, "a.txt", Some("  ")), Ok("a.txt".to_string()));
        assert_eq!(check_path(&ctx, "../a", inside.to_str()), Err(UNSAFE_PATH));
    }

    #[cfg(unix)]
    #[test]
    fn links_out_of_root_are_rejected() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let ctx = RootContext::new(dir.path()).unwrap();
        std::os::unix::fs::symlink(outside.path(), ctx.root().join("link")).unwrap();
        let through = ctx.root().join("link/pwn.txt");

        assert_eq!(check_path(&ctx, "link/pwn.txt", None), Err(OUTSIDE_ROOT));
        assert_eq!(
            check_path(&ctx, "a.txt", through.to_str()),
            Err(OUTSIDE_ROOT)
        );
        assert_eq!(check_path(&ctx, "linked", None), Ok("linked".to_string()));
    }
}
