//! Benchmark utilities.

use thnsync_testkit::{pseudo_random_bytes, SourceTree};

/// Generate deterministic data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    pseudo_random_bytes(size, 0x5eed)
}

/// Generate `count` distinct payloads of `size` bytes.
pub fn generate_payloads(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| pseudo_random_bytes(size, i as u32 + 1))
        .collect()
}

/// Build a source tree of `files` files, each `size` bytes.
pub fn source_tree(files: usize, size: usize) -> SourceTree {
    let tree = SourceTree::new();
    for (i, data) in generate_payloads(files, size).iter().enumerate() {
        tree.write(&format!("dir{}/file{i}.bin", i % 4), data);
    }
    tree
}
