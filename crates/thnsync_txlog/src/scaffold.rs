//! Scaffold discovery.

use std::path::{Path, PathBuf};

/// Marker directory identifying a scaffold root.
pub const SCAFFOLD_MARKER: &str = ".thn";

/// Log directory inside the marker.
pub const TXLOG_DIR: &str = "txlog";

/// Returns the TXLOG directory of `scaffold_root`.
pub fn txlog_dir(scaffold_root: &Path) -> PathBuf {
    scaffold_root.join(SCAFFOLD_MARKER).join(TXLOG_DIR)
}

/// Walks upward from `start` to the first directory containing `.thn/`.
///
/// Returns `None` when no ancestor carries the marker.
pub fn discover_scaffold_root(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| dir.join(SCAFFOLD_MARKER).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_marker_above() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join(".thn")).unwrap();
        let nested = root.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(discover_scaffold_root(&nested), Some(root.clone()));
        assert_eq!(discover_scaffold_root(&root), Some(root));
    }

    #[test]
    fn marker_must_be_a_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".thn"), b"").unwrap();
        let found = discover_scaffold_root(dir.path());
        assert_ne!(found, Some(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn txlog_dir_layout() {
        assert_eq!(
            txlog_dir(Path::new("/s")),
            Path::new("/s").join(".thn").join("txlog")
        );
    }
}
