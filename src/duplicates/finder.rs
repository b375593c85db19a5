//! Strategy contract, configuration and shared scan plumbing.
//!
//! # Overview
//!
//! Every strategy runs the same two-phase pipeline:
//! 1. **Traversal**: walk the roots and feed each file through the
//!    [`CandidateIndex`]. Only files sharing their size with another file
//!    come out.
//! 2. **Digest**: digest every candidate and record it in the
//!    [`ChecksumIndex`]. Keys holding two or more files are the result.
//!
//! The strategies differ only in scheduling:
//! - [`ScanStrategy::Sequential`]: one thread, traversal then digest.
//! - [`ScanStrategy::Hybrid`]: one traversal thread, then a fixed pool
//!   digests the candidates in parallel.
//! - [`ScanStrategy::Pipelined`]: a traversal pool and a digest pool run at
//!   the same time, one directory level per traversal work item.
//!
//! All of them implement [`DuplicateScanner`], and for a static tree they
//! return the same groups.
//!
//! # Error policy
//!
//! Unreadable entries and files that fail to digest are skipped, logged and
//! counted in [`ScanSummary`]; they never fail a scan. The result is a
//! best-effort view: a missing group may mean "no duplicates" or "some
//! duplicates were unreadable". Check [`ScanSummary::is_partial`] to tell
//! the two apart.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::{DuplicateFinder, FinderConfig, ScanStrategy};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default().with_digest_threads(8);
//! let finder = DuplicateFinder::new(ScanStrategy::Pipelined, config);
//!
//! let (groups, summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//! println!("Found {} duplicate groups", groups.len());
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::candidates::{CandidateIndex, CandidateStats, DEFAULT_SHARDS};
use super::groups::{ChecksumIndex, DuplicateGroup};
use super::hybrid::HybridScanner;
use super::pipelined::PipelinedScanner;
use super::sequential::SequentialScanner;
use crate::progress::{Phase, ProgressCallback};
use crate::scanner::{
    ContentDigest, DigestAlgorithm, DigestError, DirDecision, FileRef, ScanError, TreeWalker,
};

/// Scheduling policy for a scan.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ScanStrategy {
    /// Single thread: walk everything, then digest everything
    Sequential,
    /// Single-threaded walk, parallel digesting
    Hybrid,
    /// Concurrent traversal and digest pools
    #[default]
    Pipelined,
}

impl std::fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Hybrid => write!(f, "hybrid"),
            Self::Pipelined => write!(f, "pipelined"),
        }
    }
}

/// Configuration shared by all strategies.
#[derive(Clone)]
pub struct FinderConfig {
    /// Threads walking directories (pipelined only).
    pub traversal_threads: usize,
    /// Threads digesting candidates (hybrid and pipelined).
    pub digest_threads: usize,
    /// Digest used as the content equality oracle.
    pub digest: DigestAlgorithm,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Lock stripes in the candidate and checksum indexes.
    pub shards: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("traversal_threads", &self.traversal_threads)
            .field("digest_threads", &self.digest_threads)
            .field("digest", &self.digest)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("shards", &self.shards)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            traversal_threads: 4,
            digest_threads: 4,
            digest: DigestAlgorithm::default(),
            follow_symlinks: false,
            shards: DEFAULT_SHARDS,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the traversal thread count (minimum 1).
    #[must_use]
    pub fn with_traversal_threads(mut self, threads: usize) -> Self {
        self.traversal_threads = threads.max(1);
        self
    }

    /// Set the digest thread count (minimum 1).
    #[must_use]
    pub fn with_digest_threads(mut self, threads: usize) -> Self {
        self.digest_threads = threads.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// Follow symbolic links during traversal.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the number of lock stripes (minimum 1).
    #[must_use]
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digester wired to the shutdown flag.
    pub(crate) fn digester(&self) -> ContentDigest {
        let digest = ContentDigest::new(self.digest);
        match &self.shutdown_flag {
            Some(flag) => digest.with_shutdown_flag(Arc::clone(flag)),
            None => digest,
        }
    }

    /// Walker for a whole subtree, wired to the shutdown flag.
    pub(crate) fn walker(&self, root: &Path) -> TreeWalker {
        let walker = TreeWalker::new(root).with_follow_links(self.follow_symlinks);
        match &self.shutdown_flag {
            Some(flag) => walker.with_shutdown_flag(Arc::clone(flag)),
            None => walker,
        }
    }

    /// Build a fixed-size rayon pool, falling back to rayon's default size.
    pub(crate) fn build_pool(&self, threads: usize, name: &str) -> Result<rayon::ThreadPool, FinderError> {
        let label = name.to_string();
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{label}-{i}"))
            .build()
            .or_else(|e| {
                log::warn!(
                    "Failed to create {} pool with {} threads ({}), using default size",
                    name,
                    threads,
                    e
                );
                rayon::ThreadPoolBuilder::new().build()
            })
            .map_err(|e| FinderError::ThreadPool(e.to_string()))
    }

    pub(crate) fn report_start(&self, phase: Phase, total: Option<usize>) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start(phase, total);
        }
    }

    pub(crate) fn report_end(&self, phase: Phase) {
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end(phase);
        }
    }
}

/// Errors that end a scan early.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A worker pool could not be created.
    #[error("Failed to create worker pool: {0}")]
    ThreadPool(String),

    /// A component expecting a directory was handed something else.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Roots walked after normalization
    pub roots: usize,
    /// Directories whose entries were classified
    pub directories: usize,
    /// Regular files seen, including empty ones
    pub files_seen: usize,
    /// Empty files ignored
    pub empty_files: usize,
    /// Files that passed size filtering
    pub candidates: usize,
    /// Candidates digested successfully
    pub digested: usize,
    /// Candidates dropped because they could not be read
    pub digest_failures: usize,
    /// Entries skipped during traversal because they could not be read
    pub skipped_entries: usize,
    /// Confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files (excluding one original per group)
    pub duplicate_files: usize,
    /// Space that could be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Walkers built by the pool (pipelined only)
    pub walkers_created: usize,
    /// Walker checkouts served from the pool (pipelined only)
    pub walkers_reused: usize,
}

impl ScanSummary {
    /// Whether some entries or candidates were skipped due to I/O errors.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.skipped_entries > 0 || self.digest_failures > 0
    }

    /// Fill the group-derived fields.
    pub fn record_groups(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }
}

/// Receiver for the paths that pass size filtering.
pub trait CandidateSink {
    /// Accept one candidate.
    fn accept(&mut self, file: FileRef);
}

impl CandidateSink for Vec<FileRef> {
    fn accept(&mut self, file: FileRef) {
        self.push(file);
    }
}

impl CandidateSink for Vec<PathBuf> {
    fn accept(&mut self, file: FileRef) {
        self.push(file.path);
    }
}

impl CandidateSink for HashSet<PathBuf> {
    fn accept(&mut self, file: FileRef) {
        self.insert(file.path);
    }
}

impl CandidateSink for BTreeSet<PathBuf> {
    fn accept(&mut self, file: FileRef) {
        self.insert(file.path);
    }
}

/// The contract every strategy implements.
pub trait DuplicateScanner: Send + Sync {
    /// Which strategy this is.
    fn strategy(&self) -> ScanStrategy;

    /// Find groups of content-equal files under `roots`.
    ///
    /// Roots that are missing or not directories are skipped. Every returned
    /// group has at least two files, all of the same size and digest.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if the shutdown flag is raised,
    /// or [`FinderError::ThreadPool`] if a worker pool cannot be built.
    fn scan(&self, roots: &[PathBuf]) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError>;

    /// Run only the traversal phase and hand every candidate to `sink`.
    ///
    /// # Errors
    ///
    /// Same as [`DuplicateScanner::scan`].
    fn collect_candidates(
        &self,
        roots: &[PathBuf],
        sink: &mut dyn CandidateSink,
    ) -> Result<ScanSummary, FinderError>;
}

/// Build the scanner for a strategy.
#[must_use]
pub fn build_scanner(strategy: ScanStrategy, config: FinderConfig) -> Box<dyn DuplicateScanner> {
    match strategy {
        ScanStrategy::Sequential => Box::new(SequentialScanner::new(config)),
        ScanStrategy::Hybrid => Box::new(HybridScanner::new(config)),
        ScanStrategy::Pipelined => Box::new(PipelinedScanner::new(config)),
    }
}

/// Front door for callers that pick a strategy at runtime.
pub struct DuplicateFinder {
    scanner: Box<dyn DuplicateScanner>,
}

impl DuplicateFinder {
    /// Create a finder for the given strategy and configuration.
    #[must_use]
    pub fn new(strategy: ScanStrategy, config: FinderConfig) -> Self {
        Self {
            scanner: build_scanner(strategy, config),
        }
    }

    /// Create a pipelined finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ScanStrategy::default(), FinderConfig::default())
    }

    /// The strategy in use.
    #[must_use]
    pub fn strategy(&self) -> ScanStrategy {
        self.scanner.strategy()
    }

    /// Find all duplicate files under the given roots.
    ///
    /// # Errors
    ///
    /// See [`DuplicateScanner::scan`].
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        log::info!(
            "Starting {} duplicate scan of {} root(s)",
            self.strategy(),
            roots.len()
        );
        let (groups, summary) = self.scanner.scan(roots)?;
        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );
        Ok((groups, summary))
    }

    /// Collect every size-filtered candidate into `sink` and return it.
    ///
    /// # Errors
    ///
    /// See [`DuplicateScanner::scan`].
    pub fn collect_candidates<S: CandidateSink>(
        &self,
        roots: &[PathBuf],
        mut sink: S,
    ) -> Result<(S, ScanSummary), FinderError> {
        let summary = self.scanner.collect_candidates(roots, &mut sink)?;
        Ok((sink, summary))
    }
}

/// Counters updated by workers during a scan.
#[derive(Debug, Default)]
pub(crate) struct ScanCounters {
    pub directories: AtomicUsize,
    pub files_seen: AtomicUsize,
    pub skipped_entries: AtomicUsize,
    pub digested: AtomicUsize,
    pub digest_failures: AtomicUsize,
}

impl ScanCounters {
    pub(crate) fn summary(&self, roots: usize, candidates: CandidateStats) -> ScanSummary {
        ScanSummary {
            roots,
            directories: self.directories.load(Ordering::Relaxed),
            files_seen: self.files_seen.load(Ordering::Relaxed),
            empty_files: candidates.empty,
            candidates: candidates.emitted,
            digested: self.digested.load(Ordering::Relaxed),
            digest_failures: self.digest_failures.load(Ordering::Relaxed),
            skipped_entries: self.skipped_entries.load(Ordering::Relaxed),
            ..Default::default()
        }
    }

    pub(crate) fn skip(&self, err: &ScanError) {
        self.skipped_entries.fetch_add(1, Ordering::Relaxed);
        log::debug!("Skipping {}: {}", err.path().display(), err);
    }

    /// Count a classified file and report traversal progress.
    pub(crate) fn see_file(&self, config: &FinderConfig, file: &FileRef) {
        let seen = self.files_seen.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!("Classified {} ({} bytes)", file.path.display(), file.size);
        if let Some(ref callback) = config.progress_callback {
            callback.on_progress(Phase::Traversal, seen, &file.path);
        }
    }
}

/// Walk whole subtrees of every root on the calling thread.
///
/// Every candidate released by `candidates` is passed to `emit`.
pub(crate) fn walk_roots_inline<F>(
    config: &FinderConfig,
    roots: &[PathBuf],
    candidates: &CandidateIndex,
    counters: &ScanCounters,
    mut emit: F,
) -> Result<(), FinderError>
where
    F: FnMut(FileRef),
{
    config.report_start(Phase::Traversal, None);
    for root in roots {
        if config.is_shutdown_requested() {
            break;
        }
        let mut walker = config.walker(root);
        let result = walker.walk(
            |_| DirDecision::Descend,
            |file| {
                counters.see_file(config, &file);
                candidates.observe(file).into_iter().for_each(&mut emit);
            },
            |err| counters.skip(&err),
        );
        match result {
            Ok(stats) => {
                counters
                    .directories
                    .fetch_add(stats.descended + 1, Ordering::Relaxed);
            }
            Err(err) => counters.skip(&err),
        }
    }
    config.report_end(Phase::Traversal);

    if config.is_shutdown_requested() {
        log::info!("Traversal interrupted by shutdown signal");
        return Err(FinderError::Interrupted);
    }
    Ok(())
}

/// Digest one candidate into the checksum index.
///
/// A file that cannot be read is dropped and counted; it is never retried.
pub(crate) fn digest_candidate(
    config: &FinderConfig,
    digester: &ContentDigest,
    checksums: &ChecksumIndex,
    counters: &ScanCounters,
    file: FileRef,
) {
    match digester.digest(&file.path) {
        Ok(digest) => {
            let done = counters.digested.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref callback) = config.progress_callback {
                callback.on_progress(Phase::Digest, done, &file.path);
                callback.on_item_completed(file.size);
            }
            log::trace!("Digest computed: {}", file.path.display());
            checksums.insert(file, digest);
        }
        Err(DigestError::Interrupted(path)) => {
            log::debug!("Digest interrupted: {}", path.display());
        }
        Err(e) => {
            counters.digest_failures.fetch_add(1, Ordering::Relaxed);
            log::debug!("Dropping candidate {}: {}", file.path.display(), e);
        }
    }
}

/// Turn a finished checksum index into groups and a summary.
pub(crate) fn finish_scan(
    config: &FinderConfig,
    checksums: ChecksumIndex,
    counters: &ScanCounters,
    roots: usize,
    candidates: CandidateStats,
) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
    if config.is_shutdown_requested() {
        log::info!("Digest phase interrupted by shutdown signal");
        return Err(FinderError::Interrupted);
    }
    let groups = checksums.into_groups();
    let mut summary = counters.summary(roots, candidates);
    summary.record_groups(&groups);
    Ok((groups, summary))
}
