//! Reusable traversal walkers.
//!
//! The pipelined strategy walks one directory level per work item, so a deep
//! tree turns into many short walks. [`WorkerPool`] keeps finished
//! [`TreeWalker`]s on a lock-free bounded free-list and hands them back out
//! redirected at the next directory instead of building a new one per item.
//!
//! Walkers are interchangeable: checkout takes whichever one is free, and a
//! walker returned to a full pool is simply dropped.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::scanner::TreeWalker;

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Walkers built because the free-list was empty
    pub created: usize,
    /// Checkouts served from the free-list
    pub reused: usize,
    /// Returns dropped because the free-list was full
    pub discarded: usize,
}

/// Bounded free-list of [`TreeWalker`]s.
#[derive(Debug)]
pub struct WorkerPool {
    free: ArrayQueue<TreeWalker>,
    follow_links: bool,
    shutdown_flag: Option<Arc<AtomicBool>>,
    created: AtomicUsize,
    reused: AtomicUsize,
    discarded: AtomicUsize,
}

impl WorkerPool {
    /// Create a pool holding at most `capacity` idle walkers (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free: ArrayQueue::new(capacity.max(1)),
            follow_links: false,
            shutdown_flag: None,
            created: AtomicUsize::new(0),
            reused: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        }
    }

    /// Build new walkers with symlink following enabled or disabled.
    #[must_use]
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Give new walkers a shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Take a walker pointed at `root`.
    pub fn checkout(&self, root: &Path) -> TreeWalker {
        if let Some(mut walker) = self.free.pop() {
            self.reused.fetch_add(1, Ordering::Relaxed);
            walker.redirect(root);
            return walker;
        }

        self.created.fetch_add(1, Ordering::Relaxed);
        let walker = TreeWalker::new(root).with_follow_links(self.follow_links);
        match &self.shutdown_flag {
            Some(flag) => walker.with_shutdown_flag(Arc::clone(flag)),
            None => walker,
        }
    }

    /// Return a walker to the free-list.
    pub fn give_back(&self, walker: TreeWalker) {
        if self.free.push(walker).is_err() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of idle walkers.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}
