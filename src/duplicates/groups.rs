//! Digest-keyed grouping and confirmed duplicate groups.
//!
//! # Overview
//!
//! [`ChecksumIndex`] collects every digested candidate under its
//! `(size, digest)` key. Groups only grow. Once all candidates are in,
//! [`ChecksumIndex::into_groups`] keeps the keys holding two or more files
//! and turns them into [`DuplicateGroup`]s.
//!
//! The key includes the size so that two files of different length that
//! happen to collide on a 64-bit digest never share a group.
//!
//! # Example
//!
//! ```
//! use dupscan::duplicates::ChecksumIndex;
//! use dupscan::scanner::FileRef;
//! use std::path::PathBuf;
//!
//! let index = ChecksumIndex::new();
//! index.insert(FileRef::new(PathBuf::from("/a"), 10), 0xabc);
//! index.insert(FileRef::new(PathBuf::from("/b"), 10), 0xabc);
//! index.insert(FileRef::new(PathBuf::from("/c"), 10), 0xdef);
//!
//! let groups = index.into_groups();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].len(), 2);
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use super::candidates::DEFAULT_SHARDS;
use crate::scanner::{digest_to_hex, FileRef};

/// Confirmed duplicate group of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Content digest shared by all files
    pub digest: u64,
    /// File size in bytes, shared by all files
    pub size: u64,
    /// Files in the group (two or more)
    pub files: Vec<FileRef>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: u64, size: u64, files: Vec<FileRef>) -> Self {
        Self {
            digest,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space taken by all copies beyond the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_to_hex(self.digest)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Sort files by path for stable output.
    pub fn sort(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

type DigestKey = (u64, u64);

/// Concurrent `(size, digest)` → files index, lock-striped by digest.
#[derive(Debug)]
pub struct ChecksumIndex {
    shards: Box<[Mutex<HashMap<DigestKey, Vec<FileRef>>>]>,
}

impl Default for ChecksumIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecksumIndex {
    /// Create an index with the default number of stripes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create an index with the given number of lock stripes (at least 1).
    #[must_use]
    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards }
    }

    /// Record a digested file.
    pub fn insert(&self, file: FileRef, digest: u64) {
        // Digests are already well mixed; the low bits pick the stripe
        let shard = &self.shards[(digest as usize) % self.shards.len()];
        shard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((file.size, digest))
            .or_default()
            .push(file);
    }

    /// Number of files recorded so far.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.shards
            .iter()
            .map(|s| {
                s.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .map(Vec::len)
                    .sum::<usize>()
            })
            .sum()
    }

    /// Consume the index and return every group of two or more files.
    ///
    /// Groups are ordered by descending wasted space, then by digest, and
    /// files inside a group are sorted by path.
    #[must_use]
    pub fn into_groups(self) -> Vec<DuplicateGroup> {
        let mut groups: Vec<DuplicateGroup> = self
            .shards
            .into_vec()
            .into_iter()
            .flat_map(|s| s.into_inner().unwrap_or_else(PoisonError::into_inner))
            .filter(|(_, files)| files.len() > 1)
            .map(|((size, digest), files)| {
                log::debug!(
                    "Duplicate group {}: {} files, {} bytes each",
                    digest_to_hex(digest),
                    files.len(),
                    size
                );
                let mut group = DuplicateGroup::new(digest, size, files);
                group.sort();
                group
            })
            .collect();

        groups.sort_by(|a, b| {
            b.wasted_space()
                .cmp(&a.wasted_space())
                .then(a.digest.cmp(&b.digest))
                .then(a.size.cmp(&b.size))
        });
        groups
    }
}
