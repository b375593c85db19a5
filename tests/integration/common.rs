//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dupscan::duplicates::{DuplicateGroup, ScanStrategy};

pub const ALL_STRATEGIES: [ScanStrategy; 3] = [
    ScanStrategy::Sequential,
    ScanStrategy::Hybrid,
    ScanStrategy::Pipelined,
];

/// Write `content` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path.canonicalize().unwrap()
}

/// Groups as sorted lists of paths, in a stable order.
pub fn group_paths(groups: &[DuplicateGroup]) -> Vec<Vec<PathBuf>> {
    let mut out: Vec<Vec<PathBuf>> = groups
        .iter()
        .map(|g| {
            let mut paths = g.paths();
            paths.sort();
            paths
        })
        .collect();
    out.sort();
    out
}

/// A mixed tree: several duplicate sets, size-only collisions, empty files
/// and unique files spread over a few levels.
pub fn create_mixed_tree(root: &Path) {
    write(root, "a/one.txt", "alpha alpha alpha");
    write(root, "b/c/one-copy.txt", "alpha alpha alpha");
    write(root, "d/one-again.txt", "alpha alpha alpha");

    // Same size as the alpha set, different content
    write(root, "a/decoy.txt", "omega omega omega");

    write(root, "two.bin", vec![7u8; 20_000]);
    write(root, "b/two.bin", vec![7u8; 20_000]);

    // Same size and prefix, differs in the last byte
    let mut tail = vec![7u8; 20_000];
    tail[19_999] = 8;
    write(root, "d/e/f/two-tail.bin", tail);

    write(root, "empty1", "");
    write(root, "a/empty2", "");
    write(root, "unique-1.txt", "just one");
    write(root, "b/c/unique-2.txt", "only me, longer");
}
