//! Single-threaded traversal with parallel digesting.
//!
//! Directory walking is mostly metadata I/O and rarely benefits from many
//! threads on a single disk, while digesting reads whole files. This
//! strategy walks on the calling thread, then fans the candidates out over a
//! fixed rayon pool of `digest_threads` workers.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use rayon::prelude::*;

use super::candidates::CandidateIndex;
use super::finder::{
    digest_candidate, finish_scan, walk_roots_inline, CandidateSink, DuplicateScanner,
    FinderConfig, FinderError, ScanCounters, ScanStrategy, ScanSummary,
};
use super::groups::{ChecksumIndex, DuplicateGroup};
use crate::progress::Phase;
use crate::scanner::{normalize_roots, FileRef};

/// Sequential walk, parallel digest.
#[derive(Debug, Clone, Default)]
pub struct HybridScanner {
    config: FinderConfig,
}

impl HybridScanner {
    /// Create a hybrid scanner.
    ///
    /// Only `digest_threads` is used from the thread settings.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

impl DuplicateScanner for HybridScanner {
    fn strategy(&self) -> ScanStrategy {
        ScanStrategy::Hybrid
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
            counters.files_seen.load(Ordering::Relaxed),
            pending.len()
        );

        let checksums = ChecksumIndex::with_shards(self.config.shards);
        let pool = self.config.build_pool(self.config.digest_threads, "digest")?;
        log::debug!(
            "Digesting {} candidates on {} threads",
            pending.len(),
            pool.current_num_threads()
        );

        self.config.report_start(Phase::Digest, Some(pending.len()));
        pool.install(|| {
            pending.into_par_iter().for_each_init(
                || self.config.digester(),
                |digester, file| {
                    if self.config.is_shutdown_requested() {
                        return;
                    }
                    digest_candidate(&self.config, digester, &checksums, &counters, file);
                },
            );
        });
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
        // Candidate collection is traversal only, which this strategy runs on
        // the calling thread anyway
        let roots = normalize_roots(roots);
        let candidates = CandidateIndex::with_shards(self.config.shards);
        let counters = ScanCounters::default();

        walk_roots_inline(&self.config, &roots, &candidates, &counters, |file| {
            sink.accept(file);
        })?;
        Ok(counters.summary(roots.len(), candidates.stats()))
    }
}
