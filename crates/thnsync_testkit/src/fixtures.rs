//! Filesystem fixtures.
//!
//! Fixtures panic on setup failure; they are only used from tests.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory marked as a scaffold (contains `.thn/`).
pub struct TempScaffold {
    dir: TempDir,
}

impl TempScaffold {
    /// Creates an empty scaffold.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(dir.path().join(".thn")).expect("Failed to create .thn marker");
        Self { dir }
    }

    /// Returns the scaffold root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns `<root>/.thn/txlog`.
    pub fn txlog_dir(&self) -> PathBuf {
        self.path().join(".thn").join("txlog")
    }

    /// Returns the TXLOG files, sorted by name.
    pub fn txlog_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.txlog_dir()) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .map(|e| e.expect("Failed to read txlog entry").path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "jsonl"))
            .collect();
        files.sort();
        files
    }

    /// Returns every TXLOG line of every file, parsed.
    pub fn txlog_records(&self) -> Vec<Value> {
        self.txlog_files()
            .iter()
            .flat_map(|path| read_jsonl(path))
            .collect()
    }

    /// Writes a JSON file relative to the root, creating parents.
    pub fn write_json(&self, rel: &str, value: &Value) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, serde_json::to_vec_pretty(value).expect("Failed to encode JSON"))
            .expect("Failed to write JSON file");
    }

    /// Sets `policy.snapshot_lineage.mode` in the registry file.
    pub fn set_lineage_mode(&self, mode: &str) {
        self.write_json(
            ".thn/registry/scaffold.json",
            &serde_json::json!({"policy": {"snapshot_lineage": {"mode": mode}}}),
        );
    }

    /// Records an accepted snapshot for `blueprint_id`.
    pub fn accept_snapshot(&self, blueprint_id: &str) {
        self.write_json(
            ".thn/snapshots/index.json",
            &serde_json::json!({"accepted": {"blueprint_id": blueprint_id}}),
        );
    }
}

impl Default for TempScaffold {
    fn default() -> Self {
        Self::new()
    }
}

/// A temporary directory populated with files.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Creates a tree holding `files` (relative path, contents).
    pub fn with_files<P, D>(files: &[(P, D)]) -> Self
    where
        P: AsRef<str>,
        D: AsRef<[u8]>,
    {
        let tree = Self::new();
        for (rel, data) in files {
            tree.write(rel.as_ref(), data.as_ref());
        }
        tree
    }

    /// Returns the tree root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes one file, creating parents.
    pub fn write(&self, rel: &str, data: &[u8]) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, data).expect("Failed to write file");
    }

    /// Removes one file.
    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path().join(rel)).expect("Failed to remove file");
    }

    /// Reads one file.
    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path().join(rel)).expect("Failed to read file")
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses every line of a JSONL file.
pub fn read_jsonl(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .expect("Failed to read JSONL file")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("Invalid JSONL line"))
        .collect()
}

/// Deterministic pseudo-random bytes (LCG), for payloads that must not
/// repeat.
pub fn pseudo_random_bytes(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}
