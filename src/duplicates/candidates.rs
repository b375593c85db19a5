//! Size-keyed candidate filtering.
//!
//! # Overview
//!
//! A file can only have a duplicate if another file has the same size.
//! [`CandidateIndex`] tracks one state per observed size:
//!
//! ```text
//! (absent) --f--> FirstSeen(f) --g--> Promoted --h--> Promoted
//!   emit: none          emit: f, g          emit: h
//! ```
//!
//! The first file of a size is held back as a witness. The second file
//! promotes the size: both are emitted, and the witness is dropped. Every
//! later file of that size is emitted directly.
//!
//! # Concurrency
//!
//! The index is lock-striped by size. [`CandidateIndex::observe`] holds
//! exactly one stripe lock, only for the check-and-transition of one size,
//! and returns the files to emit so the caller forwards them after the lock
//! is released. Two workers racing on the same size are serialized by the
//! stripe, so a size is promoted exactly once and no witness is lost or
//! emitted twice.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::scanner::FileRef;

/// Default number of lock stripes.
pub const DEFAULT_SHARDS: usize = 64;

/// Per-size state. A size that was never observed has no entry.
#[derive(Debug)]
enum SizeState {
    /// Exactly one file of this size has been seen.
    FirstSeen(FileRef),
    /// Two or more files of this size have been seen and emitted.
    Promoted,
}

/// Files released into the digest phase by one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emit {
    /// Nothing to digest yet (first file of its size, or an empty file).
    None,
    /// The observed file, for an already promoted size.
    One(FileRef),
    /// The held witness and the observed file, on promotion.
    Two(FileRef, FileRef),
}

impl Emit {
    /// Number of files released.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Two(_, _) => 2,
        }
    }

    /// Whether nothing was released.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Iterator over the files of an [`Emit`].
#[derive(Debug)]
pub struct EmitIter {
    first: Option<FileRef>,
    second: Option<FileRef>,
}

impl Iterator for EmitIter {
    type Item = FileRef;

    fn next(&mut self) -> Option<FileRef> {
        self.first.take().or_else(|| self.second.take())
    }
}

impl IntoIterator for Emit {
    type Item = FileRef;
    type IntoIter = EmitIter;

    fn into_iter(self) -> EmitIter {
        let (first, second) = match self {
            Self::None => (None, None),
            Self::One(f) => (Some(f), None),
            Self::Two(a, b) => (Some(a), Some(b)),
        };
        EmitIter { first, second }
    }
}

/// Snapshot of index counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateStats {
    /// Non-empty files observed
    pub observed: usize,
    /// Empty files ignored
    pub empty: usize,
    /// Files released into the digest phase
    pub emitted: usize,
    /// Sizes promoted
    pub promoted_sizes: usize,
}

/// Concurrent size-bucket promotion index.
#[derive(Debug)]
pub struct CandidateIndex {
    shards: Box<[Mutex<HashMap<u64, SizeState>>]>,
    observed: AtomicUsize,
    empty: AtomicUsize,
    emitted: AtomicUsize,
    promoted: AtomicUsize,
}

impl Default for CandidateIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateIndex {
    /// Create an index with [`DEFAULT_SHARDS`] stripes.
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
        Self {
            shards,
            observed: AtomicUsize::new(0),
            empty: AtomicUsize::new(0),
            emitted: AtomicUsize::new(0),
            promoted: AtomicUsize::new(0),
        }
    }

    fn shard_for(&self, size: u64) -> &Mutex<HashMap<u64, SizeState>> {
        &self.shards[shard_index(size, self.shards.len())]
    }

    /// Record one file and return what it releases into the digest phase.
    ///
    /// Empty files are counted and never become candidates.
    pub fn observe(&self, file: FileRef) -> Emit {
        if file.is_empty() {
            self.empty.fetch_add(1, Ordering::Relaxed);
            log::trace!("Ignoring empty file: {}", file.path.display());
            return Emit::None;
        }
        self.observed.fetch_add(1, Ordering::Relaxed);

        let size = file.size;
        let emit = {
            let mut shard = self
                .shard_for(size)
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match shard.entry(size) {
                Entry::Vacant(slot) => {
                    slot.insert(SizeState::FirstSeen(file));
                    Emit::None
                }
                Entry::Occupied(mut slot) => {
                    match std::mem::replace(slot.get_mut(), SizeState::Promoted) {
                        SizeState::FirstSeen(witness) => Emit::Two(witness, file),
                        SizeState::Promoted => Emit::One(file),
                    }
                }
            }
        };

        if let Emit::Two(witness, _) = &emit {
            self.promoted.fetch_add(1, Ordering::Relaxed);
            log::trace!(
                "Promoted size {} (witness {})",
                size,
                witness.path.display()
            );
        }
        self.emitted.fetch_add(emit.len(), Ordering::Relaxed);
        emit
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CandidateStats {
        CandidateStats {
            observed: self.observed.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            promoted_sizes: self.promoted.load(Ordering::Relaxed),
        }
    }

    /// Number of sizes still held by a single witness.
    #[must_use]
    pub fn unique_sizes(&self) -> usize {
        self.shards
            .iter()
            .map(|s| {
                s.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .filter(|v| matches!(v, SizeState::FirstSeen(_)))
                    .count()
            })
            .sum()
    }
}

/// Map a size to a stripe in `[0, shards)`.
///
/// Sizes cluster heavily (small files, block multiples), so the size is
/// mixed with a Fibonacci multiplier before the multiply-high reduction.
fn shard_index(size: u64, shards: usize) -> usize {
    let mixed = size.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ((u128::from(mixed) * shards as u128) >> 64) as usize
}
