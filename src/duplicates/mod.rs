//! Duplicate detection engine.
//!
//! This module provides:
//! - Size-based candidate filtering ([`CandidateIndex`])
//! - Digest-based grouping ([`ChecksumIndex`], [`DuplicateGroup`])
//! - Walker reuse for level-at-a-time traversal ([`WorkerPool`])
//! - Three scheduling strategies behind one contract ([`DuplicateScanner`])

pub mod candidates;
pub mod finder;
pub mod groups;
pub mod hybrid;
pub mod pipelined;
pub mod pool;
pub mod sequential;

pub use candidates::{CandidateIndex, CandidateStats, Emit, DEFAULT_SHARDS};
pub use finder::{
    build_scanner, CandidateSink, DuplicateFinder, DuplicateScanner, FinderConfig, FinderError,
    ScanStrategy, ScanSummary,
};
pub use groups::{ChecksumIndex, DuplicateGroup};
pub use hybrid::HybridScanner;
pub use pipelined::PipelinedScanner;
pub use pool::{PoolStats, WorkerPool};
pub use sequential::SequentialScanner;
