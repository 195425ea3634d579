//! Root-bound path context.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::{ApplyError, ApplyResult};

/// An absolute destination root.
///
/// Every path an apply touches is derived from this context. Containment
/// checks follow symlinks in the part of a path that already exists, so a
/// link inside the root cannot carry writes outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootContext {
    root: PathBuf,
}

/// Lexically resolves `.` and `..` in an absolute path.
///
/// `..` never climbs above the filesystem root.
pub fn normalize_absolute(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
        }
    }
    out
}

/// Resolves symlinks in the longest existing prefix of `path` and appends
/// the remaining components.
///
/// `None` when that prefix cannot be resolved, e.g. a dangling link.
fn resolve_links(path: &Path) -> Option<PathBuf> {
    let lexical = normalize_absolute(path);
    let mut existing = lexical.as_path();
    let mut rest = Vec::new();
    while existing.symlink_metadata().is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name);
                existing = parent;
            }
            _ => return Some(lexical.clone()),
        }
    }
    let mut resolved = existing.canonicalize().ok()?;
    resolved.extend(rest.iter().rev());
    Some(resolved)
}

impl RootContext {
    /// Resolves `path` to an absolute root.
    ///
    /// Existing directories are canonicalized; otherwise the path is made
    /// absolute against the current directory.
    ///
    /// # Errors
    ///
    /// Fails if the current directory is unavailable or `path` names a
    /// non-directory.
    pub fn new(path: &Path) -> ApplyResult<Self> {
        let root = match path.canonicalize() {
            Ok(canonical) => {
                if !canonical.is_dir() {
                    return Err(ApplyError::InvalidRoot {
                        path: path.to_path_buf(),
                        reason: "not a directory".to_string(),
                    });
                }
                canonical
            }
            Err(_) if path.is_absolute() => normalize_absolute(path),
            Err(_) => normalize_absolute(&env::current_dir()?.join(path)),
        };
        Ok(Self { root })
    }

    /// Returns the root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins a normalized relative path onto the root.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        let mut out = self.root.clone();
        for part in rel.split('/').filter(|p| !p.is_empty() && *p != ".") {
            out.push(part);
        }
        out
    }

    /// Returns true if the absolute `path` lies at or below the root once
    /// existing symlinks are followed.
    pub fn contains(&self, path: &Path) -> bool {
        if !path.is_absolute() {
            return false;
        }
        match (resolve_links(path), resolve_links(&self.root)) {
            (Some(path), Some(root)) => path.starts_with(root),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn canonicalizes_existing_root() {
        let dir = tempdir().unwrap();
        let ctx = RootContext::new(&dir.path().join(".")).unwrap();
        assert_eq!(ctx.root(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn missing_root_is_made_absolute() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("not/yet/../here");
        let ctx = RootContext::new(&missing).unwrap();
        assert!(ctx.root().is_absolute());
        assert!(ctx.root().ends_with("not/here"));
    }

    #[test]
    fn file_is_not_a_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            RootContext::new(&file),
            Err(ApplyError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn containment_without_links() {
        let ctx = RootContext {
            root: PathBuf::from("/srv/site"),
        };
        assert!(ctx.contains(Path::new("/srv/site")));
        assert!(ctx.contains(Path::new("/srv/site/a/b")));
        assert!(ctx.contains(Path::new("/srv/site/a/../b")));
        assert!(!ctx.contains(Path::new("/srv/site/../other")));
        assert!(!ctx.contains(Path::new("/srv/sitex")));
        assert!(!ctx.contains(Path::new("site/a")));
    }

    #[cfg(unix)]
    #[test]
    fn containment_follows_links() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let ctx = RootContext::new(dir.path()).unwrap();
        std::os::unix::fs::symlink(outside.path(), ctx.root().join("out")).unwrap();
        std::os::unix::fs::symlink(ctx.root().join("sub"), ctx.root().join("in")).unwrap();
        std::fs::create_dir(ctx.root().join("sub")).unwrap();
        std::os::unix::fs::symlink(ctx.root().join("gone"), ctx.root().join("dangling")).unwrap();

        assert!(!ctx.contains(&ctx.root().join("out")));
        assert!(!ctx.contains(&ctx.root().join("out/new/file.txt")));
        assert!(ctx.contains(&ctx.root().join("in/new/file.txt")));
        assert!(!ctx.contains(&ctx.root().join("dangling")));
        assert!(ctx.contains(&ctx.root().join("not/yet/here")));
    }

    #[test]
    fn resolve_skips_dot_segments() {
        let ctx = RootContext {
            root: PathBuf::from("/r"),
        };
        assert_eq!(ctx.resolve("a/./b"), PathBuf::from("/r/a/b"));
        assert_eq!(ctx.resolve("a//b"), PathBuf::from("/r/a/b"));
    }

    #[test]
    fn normalize_never_climbs_above_root() {
        assert_eq!(normalize_absolute(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_absolute(Path::new("/a/./b/..")), PathBuf::from("/a"));
    }
}
