//! Concurrent traversal and digesting.
//!
//! # Overview
//!
//! Two fixed rayon pools run at the same time:
//!
//! - **Traversal workers** take one directory from the directory queue, walk
//!   exactly that level with a pooled [`TreeWalker`](crate::scanner::TreeWalker),
//!   push every subdirectory back on the queue and feed every file through
//!   the shared [`CandidateIndex`]. Released candidates go straight onto the
//!   file queue.
//! - **Digest workers** drain the file queue into the [`ChecksumIndex`] while
//!   traversal is still running.
//!
//! # Termination
//!
//! `pending_dirs` counts directories that are queued or being walked. It is
//! seeded with the number of roots, incremented before a subdirectory is
//! queued and decremented after a level is fully walked, so it can only
//! reach zero once no directory is left anywhere. The worker that takes it
//! to zero closes the `done` channel. Idle traversal workers block on the
//! directory queue and the `done` channel together and exit as soon as
//! `done` closes. Once every traversal worker has returned, the file queue
//! sender is dropped and the digest workers exit after draining it. No
//! worker ever polls or sleeps.
//!
//! With symlink following enabled, every queued directory carries the
//! canonical paths of its ancestors so a link back up the tree is reported
//! as a loop instead of being walked again.
//!
//! Cancellation closes `done` the same way, and digest workers stop taking
//! new files. Files already being read stop at their next buffer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};

use super::candidates::CandidateIndex;
use super::finder::{
    digest_candidate, finish_scan, CandidateSink, DuplicateScanner, FinderConfig, FinderError,
    ScanCounters, ScanStrategy, ScanSummary,
};
use super::groups::{ChecksumIndex, DuplicateGroup};
use super::pool::WorkerPool;
use crate::progress::Phase;
use crate::scanner::{normalize_roots, DirDecision, FileRef, ScanError};

/// Concurrent traversal and digest pools.
#[derive(Debug, Clone, Default)]
pub struct PipelinedScanner {
    config: FinderConfig,
}

impl PipelinedScanner {
    /// Create a pipelined scanner.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }
}

/// A directory waiting to be walked.
struct DirTask {
    path: PathBuf,
    /// Canonical paths from the root down to this directory, tracked only
    /// when symlinks are followed
    ancestry: Option<Arc<Vec<PathBuf>>>,
}

impl DirTask {
    fn root(path: &Path, follow_links: bool) -> Self {
        let ancestry = follow_links.then(|| {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            Arc::new(vec![canonical])
        });
        Self {
            path: path.to_path_buf(),
            ancestry,
        }
    }

    /// Task for a subdirectory, or the loop error if it leads back to an
    /// ancestor.
    ///
    /// Each level is a separate walk, so walkdir only sees one ancestor and
    /// cannot catch a link that points two or more levels up.
    fn child(&self, sub: &Path) -> Result<Self, ScanError> {
        let ancestry = match &self.ancestry {
            None => None,
            Some(chain) => {
                let canonical = sub
                    .canonicalize()
                    .map_err(|e| ScanError::from_io(sub, e))?;
                if chain.contains(&canonical) {
                    return Err(ScanError::Walk {
                        path: sub.to_path_buf(),
                        message: format!("symlink loop back to {}", canonical.display()),
                    });
                }
                let mut next = Vec::with_capacity(chain.len() + 1);
                next.extend(chain.iter().cloned());
                next.push(canonical);
                Some(Arc::new(next))
            }
        };
        Ok(Self {
            path: sub.to_path_buf(),
            ancestry,
        })
    }
}

/// State shared by the traversal workers of one scan.
struct Traversal<'a> {
    config: &'a FinderConfig,
    candidates: CandidateIndex,
    counters: ScanCounters,
    walkers: WorkerPool,
    pending_dirs: AtomicUsize,
    dir_tx: Sender<DirTask>,
    dir_rx: Receiver<DirTask>,
    done_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
}

impl<'a> Traversal<'a> {
    fn new(config: &'a FinderConfig, roots: &[PathBuf]) -> Self {
        let (dir_tx, dir_rx) = unbounded();
        let (done_tx, done_rx) = bounded(0);

        let mut walkers = WorkerPool::new(config.traversal_threads)
            .with_follow_links(config.follow_symlinks);
        if let Some(flag) = &config.shutdown_flag {
            walkers = walkers.with_shutdown_flag(Arc::clone(flag));
        }

        let traversal = Self {
            config,
            candidates: CandidateIndex::with_shards(config.shards),
            counters: ScanCounters::default(),
            walkers,
            pending_dirs: AtomicUsize::new(roots.len()),
            dir_tx,
            dir_rx,
            done_tx: Mutex::new(Some(done_tx)),
            done_rx,
        };

        for root in roots {
            // The receiver lives in `traversal`, so this cannot fail
            let _ = traversal
                .dir_tx
                .send(DirTask::root(root, config.follow_symlinks));
        }
        if roots.is_empty() {
            traversal.close();
        }
        traversal
    }

    /// Close the `done` channel, releasing every idle traversal worker.
    fn close(&self) {
        let sender = self
            .done_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_some() {
            log::debug!("Traversal complete, releasing workers");
        }
    }

    /// Body of one traversal worker.
    fn run(&self, file_tx: &Sender<FileRef>) {
        loop {
            let next = select! {
                recv(self.dir_rx) -> msg => msg.ok(),
                recv(self.done_rx) -> _ => None,
            };
            let Some(task) = next else {
                break;
            };
            self.walk_level(&task, file_tx);
        }
    }

    /// Walk a single directory level, queueing its subdirectories.
    fn walk_level(&self, task: &DirTask, file_tx: &Sender<FileRef>) {
        let mut walker = self.walkers.checkout(&task.path);
        let result = walker.walk(
            |sub| {
                match task.child(sub) {
                    Ok(child) => {
                        log::trace!("Deferring {}", sub.display());
                        self.pending_dirs.fetch_add(1, Ordering::SeqCst);
                        let _ = self.dir_tx.send(child);
                    }
                    Err(err) => self.counters.skip(&err),
                }
                DirDecision::Defer
            },
            |file| {
                self.counters.see_file(self.config, &file);
                for candidate in self.candidates.observe(file) {
                    let _ = file_tx.send(candidate);
                }
            },
            |err| self.counters.skip(&err),
        );
        self.walkers.give_back(walker);

        match result {
            Ok(_) => {
                self.counters.directories.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => self.counters.skip(&err),
        }

        if self.config.is_shutdown_requested() {
            log::debug!("Traversal worker: Shutdown requested");
            self.close();
        } else if self.pending_dirs.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.close();
        }
    }

    fn summary(&self, roots: usize) -> ScanSummary {
        let pool = self.walkers.stats();
        ScanSummary {
            walkers_created: pool.created,
            walkers_reused: pool.reused,
            ..self.counters.summary(roots, self.candidates.stats())
        }
    }
}

impl DuplicateScanner for PipelinedScanner {
    fn strategy(&self) -> ScanStrategy {
        ScanStrategy::Pipelined
    }

    fn scan(&self, roots: &[PathBuf]) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let roots = normalize_roots(roots);
        let traversal_pool = self
            .config
            .build_pool(self.config.traversal_threads, "traverse")?;
        let digest_pool = self.config.build_pool(self.config.digest_threads, "digest")?;
        log::debug!(
            "Pipelined scan: {} traversal threads, {} digest threads",
            traversal_pool.current_num_threads(),
            digest_pool.current_num_threads()
        );

        let traversal = Traversal::new(&self.config, &roots);
        let checksums = ChecksumIndex::with_shards(self.config.shards);
        let (file_tx, file_rx) = unbounded::<FileRef>();

        self.config.report_start(Phase::Traversal, None);
        self.config.report_start(Phase::Digest, None);

        let joined = std::thread::scope(|s| {
            let digesters = s.spawn(|| {
                digest_pool.broadcast(|_| {
                    let digester = self.config.digester();
                    for file in file_rx.iter() {
                        if self.config.is_shutdown_requested() {
                            break;
                        }
                        digest_candidate(
                            &self.config,
                            &digester,
                            &checksums,
                            &traversal.counters,
                            file,
                        );
                    }
                });
            });

            traversal_pool.broadcast(|_| traversal.run(&file_tx));
            self.config.report_end(Phase::Traversal);
            log::info!(
                "Traversal: {} files seen, {} candidates",
                traversal.counters.files_seen.load(Ordering::Relaxed),
                traversal.candidates.stats().emitted
            );

            // Digest workers exit once the queue is drained
            drop(file_tx);
            digesters.join()
        });
        self.config.report_end(Phase::Digest);

        if joined.is_err() {
            return Err(FinderError::ThreadPool("digest worker panicked".to_string()));
        }

        let summary = traversal.summary(roots.len());
        let (groups, mut result) = finish_scan(
            &self.config,
            checksums,
            &traversal.counters,
            roots.len(),
            traversal.candidates.stats(),
        )?;
        result.walkers_created = summary.walkers_created;
        result.walkers_reused = summary.walkers_reused;
        Ok((groups, result))
    }

    fn collect_candidates(
        &self,
        roots: &[PathBuf],
        sink: &mut dyn CandidateSink,
    ) -> Result<ScanSummary, FinderError> {
        let roots = normalize_roots(roots);
        let traversal_pool = self
            .config
            .build_pool(self.config.traversal_threads, "traverse")?;
        let traversal = Traversal::new(&self.config, &roots);
        let (file_tx, file_rx) = unbounded::<FileRef>();

        self.config.report_start(Phase::Traversal, None);
        let joined = std::thread::scope(|s| {
            let traversal = &traversal;
            let traversal_pool = &traversal_pool;
            let walkers = s.spawn(move || {
                traversal_pool.broadcast(|_| traversal.run(&file_tx));
            });

            // The sink stays on the calling thread
            for file in file_rx.iter() {
                sink.accept(file);
            }
            walkers.join()
        });
        self.config.report_end(Phase::Traversal);

        if joined.is_err() {
            return Err(FinderError::ThreadPool("traversal worker panicked".to_string()));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        Ok(traversal.summary(roots.len()))
    }
}
