//! Output formatters for scan results.
//!
//! - [`text`]: human-readable listing
//! - [`json`]: machine-readable output for scripting

pub mod json;
pub mod text;

pub use json::{JsonCandidates, JsonOutput, JsonSummary};
pub use text::TextOutput;
