//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! [`TreeWalker`] enumerates a directory subtree and hands every decision to
//! the caller:
//!
//! - each subdirectory is passed to a decision closure that returns
//!   [`DirDecision::Descend`] (walk into it now) or [`DirDecision::Defer`]
//!   (skip it; the caller records it for later)
//! - each regular file is passed to a record closure as a [`FileRef`]
//! - each failed entry is passed to an error closure, and the walk continues
//!   with the next sibling
//!
//! Zero-length files are still reported; filtering them is the caller's job.
//!
//! A walker carries no shared state, so a finished walker can be pointed at
//! a new root with [`TreeWalker::redirect`] and reused. The pipelined
//! strategy pools walkers this way.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{DirDecision, TreeWalker};
//! use std::path::{Path, PathBuf};
//!
//! // Walk only the top level, collecting subdirectories for later
//! let mut deferred: Vec<PathBuf> = Vec::new();
//! let mut walker = TreeWalker::new(Path::new("/home/user/Downloads"));
//! let stats = walker
//!     .walk(
//!         |dir| {
//!             deferred.push(dir.to_path_buf());
//!             DirDecision::Defer
//!         },
//!         |file| println!("{}: {} bytes", file.path.display(), file.size),
//!         |err| eprintln!("Warning: {}", err),
//!     )
//!     .unwrap();
//! println!("{} files, {} deferred", stats.files, deferred.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileRef, ScanError};

/// What to do with a subdirectory met during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirDecision {
    /// Walk into the directory as part of the current traversal.
    Descend,
    /// Do not walk into the directory now.
    Defer,
}

/// Counters for a single walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Subdirectories walked into
    pub descended: usize,
    /// Subdirectories handed back to the caller
    pub deferred: usize,
    /// Regular files reported (including empty ones)
    pub files: usize,
    /// Entries that could not be read
    pub errors: usize,
}

/// Reusable directory walker.
#[derive(Debug)]
pub struct TreeWalker {
    /// Root of the current traversal
    root: PathBuf,
    /// Follow symbolic links to files and directories
    follow_links: bool,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Set once `walk` has returned for the current root
    finished: bool,
    /// Counters for the current root
    stats: WalkStats,
}

impl TreeWalker {
    /// Create a walker for the given root.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            follow_links: false,
            shutdown_flag: None,
            finished: false,
            stats: WalkStats::default(),
        }
    }

    /// Follow symbolic links during traversal.
    ///
    /// walkdir detects link cycles and reports them as errors, which the
    /// walker passes to the error closure like any other failed entry.
    #[must_use]
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// The flag is checked before every entry; once set the walk returns
    /// early with the counters gathered so far.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Point the walker at a new root and reset its per-walk state.
    pub fn redirect(&mut self, root: &Path) -> &mut Self {
        if !self.finished {
            log::debug!(
                "Redirecting walker from unfinished root {} to {}",
                self.root.display(),
                root.display()
            );
        }
        root.clone_into(&mut self.root);
        self.finished = false;
        self.stats = WalkStats::default();
        self
    }

    /// Root of the current traversal.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the walk over the current root has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Counters for the current root.
    #[must_use]
    pub fn stats(&self) -> WalkStats {
        self.stats
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the current root.
    ///
    /// The root itself is always entered; `on_dir` is only consulted for the
    /// directories below it.
    ///
    /// # Errors
    ///
    /// Fails before any entry is read if the root is missing or is not a
    /// directory. Errors on entries below the root go to `on_error` instead.
    pub fn walk<D, F, E>(
        &mut self,
        mut on_dir: D,
        mut on_file: F,
        mut on_error: E,
    ) -> Result<WalkStats, ScanError>
    where
        D: FnMut(&Path) -> DirDecision,
        F: FnMut(FileRef),
        E: FnMut(ScanError),
    {
        let metadata = std::fs::metadata(&self.root)
            .map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        self.stats = WalkStats::default();
        let mut entries = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .into_iter();

        while let Some(result) = entries.next() {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping at {}", self.root.display());
                break;
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    self.stats.errors += 1;
                    let err = ScanError::from(e);
                    log::debug!("Skipping unreadable entry: {}", err);
                    on_error(err);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                match on_dir(entry.path()) {
                    DirDecision::Descend => self.stats.descended += 1,
                    DirDecision::Defer => {
                        self.stats.deferred += 1;
                        entries.skip_current_dir();
                    }
                }
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(meta) => {
                        self.stats.files += 1;
                        on_file(FileRef::new(entry.into_path(), meta.len()));
                    }
                    Err(e) => {
                        self.stats.errors += 1;
                        on_error(ScanError::from(e));
                    }
                }
            } else {
                log::trace!("Skipping non-regular entry: {}", entry.path().display());
            }
        }

        self.finished = true;
        Ok(self.stats)
    }
}
