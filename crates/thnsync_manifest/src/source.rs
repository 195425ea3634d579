//! Source tree scanning.

use crate::error::{EnvelopeError, EnvelopeResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the scaffold metadata directory, never shipped as payload.
const SCAFFOLD_MARKER: &str = ".thn";

/// A regular file found under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// POSIX-style path relative to the source root.
    pub rel_path: String,
    /// Absolute (or root-joined) filesystem path.
    pub abs_path: PathBuf,
    /// File size in bytes at scan time.
    pub size: u64,
}

/// Lists every regular file below `root`, sorted by relative path.
///
/// Symlinks are not followed and the `.thn` metadata directory is skipped.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked or a path is not UTF-8.
pub fn scan_source_tree(root: &Path) -> EnvelopeResult<Vec<SourceFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != SCAFFOLD_MARKER);

    for entry in walker {
        let entry = entry.map_err(|e| EnvelopeError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| EnvelopeError::InvalidEntry(entry.path().display().to_string()))?;
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| EnvelopeError::InvalidEntry(rel.display().to_string()))?
            .join("/");
        files.push(SourceFile {
            rel_path,
            abs_path: entry.path().to_path_buf(),
            size: entry.metadata().map_err(|e| EnvelopeError::Io(e.into()))?.len(),
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn scans_sorted_posix_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::write(dir.path().join("b/nested/z.txt"), b"zz").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b/c.txt"), b"ccc").unwrap();

        let files = scan_source_tree(dir.path()).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b/c.txt", "b/nested/z.txt"]);
        assert_eq!(files[1].size, 3);
    }

    #[test]
    fn skips_scaffold_metadata() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".thn/txlog")).unwrap();
        fs::write(dir.path().join(".thn/txlog/x.jsonl"), b"{}").unwrap();
        fs::write(dir.path().join("keep.txt"), b"k").unwrap();

        let files = scan_source_tree(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel_path, "keep.txt");
    }

    #[test]
    fn empty_tree() {
        let dir = tempdir().unwrap();
        assert!(scan_source_tree(dir.path()).unwrap().is_empty());
    }
}
