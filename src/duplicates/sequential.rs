//! Single-threaded strategy.
//!
//! Walks every root to completion on the calling thread, then digests the
//! collected candidates one after another. This is the reference the other
//! strategies are checked against.

use std::path::PathBuf;

use super::candidates::CandidateIndex;
use super::finder::{
    digest_candidate, finish_scan, walk_roots_inline, CandidateSink, DuplicateScanner,
    FinderConfig, FinderError, ScanCounters, ScanStrategy, ScanSummary,
};
use super::groups::{ChecksumIndex, DuplicateGroup};
use crate::progress::Phase;
use crate::scanner::{normalize_roots, FileRef};

/// Walk-then-digest on one thread.
#[derive(Debug, Clone, Default)]
pub struct SequentialScanner {
    config: FinderConfig,
}

impl SequentialScanner {
    /// Create a sequential scanner.
    ///
    /// Thread counts in `config` are ignored.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

impl DuplicateScanner for SequentialScanner {
    fn strategy(&self) -> ScanStrategy {
        ScanStrategy::Sequential
    }

    fn scan(&self, roots: &[PathBuf]) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let roots = normalize_roots(roots);
        let candidates = CandidateIndex::with_shards(self.config.shards);
        let counters = ScanCounters::default();

        let mut pending: Vec<FileRef> = Vec::new();
        walk_roots_inline(&self.config, &roots, &candidates, &counters, |file| {
            pending.push(file);
        })?;
        log::info!(
            "Traversal: {} files seen, {} candidates",
            counters.files_seen.load(std::sync::atomic::Ordering::Relaxed),
            pending.len()
        );

        let checksums = ChecksumIndex::with_shards(self.config.shards);
        let digester = self.config.digester();
        self.config.report_start(Phase::Digest, Some(pending.len()));
        for file in pending {
            if self.config.is_shutdown_requested() {
                break;
            }
            digest_candidate(&self.config, &digester, &checksums, &counters, file);
        }
        self.config.report_end(Phase::Digest);

        finish_scan(
            &self.config,
            checksums,
            &counters,
            roots.len(),
            candidates.stats(),
        )
    }

    fn collect_candidates(
        &self,
        roots: &[PathBuf],
        sink: &mut dyn CandidateSink,
    ) -> Result<ScanSummary, FinderError> {
        let roots = normalize_roots(roots);
        let candidates = CandidateIndex::with_shards(self.config.shards);
        let counters = ScanCounters::default();

        walk_roots_inline(&self.config, &roots, &candidates, &counters, |file| {
            sink.accept(file);
        })?;
        Ok(counters.summary(roots.len(), candidates.stats()))
    }
}
