//! Progress reporting utilities using indicatif.
//!
//! The engine reports through the [`ProgressCallback`] trait. [`Progress`]
//! implements it with terminal progress bars for the binary.
//!
//! Traversal and digesting overlap in the pipelined strategy, so every
//! callback names the [`Phase`] it belongs to and both bars can be live at
//! the same time.

use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Engine phase being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Directory traversal and size filtering
    Traversal,
    /// Content digesting of candidates
    Digest,
}

impl Phase {
    /// Short display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Traversal => "traversal",
            Self::Digest => "digest",
        }
    }
}

/// Progress callback for the duplicate scan phases.
///
/// Implementations are called from worker threads and must be cheap.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// `total` is `None` when the amount of work is discovered while the
    /// phase runs (always the case for traversal, and for digesting in the
    /// pipelined strategy).
    fn on_phase_start(&self, phase: Phase, total: Option<usize>);

    /// Called for each item processed.
    ///
    /// * `current` - Items processed so far in this phase (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, phase: Phase, current: usize, path: &Path);

    /// Called when a file has been digested, with its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: Phase);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    traversal: Mutex<Option<ProgressBar>>,
    digest: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupscan::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            traversal: Mutex::new(None),
            digest: Mutex::new(None),
            quiet,
        }
    }

    fn slot(&self, phase: Phase) -> &Mutex<Option<ProgressBar>> {
        match phase {
            Phase::Traversal => &self.traversal,
            Phase::Digest => &self.digest,
        }
    }

    fn spinner_style(unit: &str) -> ProgressStyle {
        ProgressStyle::with_template(&format!(
            "{{spinner:.green}} {{msg}} [{{elapsed_precise}}] {{pos}} {unit}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: Phase, total: Option<usize>) {
        if self.quiet {
            return;
        }

        let pb = match (phase, total) {
            (Phase::Digest, Some(total)) => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::bar_style());
                pb
            }
            (Phase::Traversal, _) => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style("files"));
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            (Phase::Digest, None) => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style("digested"));
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };
        pb.set_message(match phase {
            Phase::Traversal => "Walking",
            Phase::Digest => "Digesting",
        });
        *self.slot(phase).lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_progress(&self, phase: Phase, current: usize, path: &Path) {
        if self.quiet {
            return;
        }
        if let Some(pb) = &*self.slot(phase).lock().unwrap_or_else(PoisonError::into_inner) {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_phase_end(&self, phase: Phase) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self
            .slot(phase)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_with_message(format!("{} complete", phase.name()));
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        for phase in [Phase::Digest, Phase::Traversal] {
            if let Some(pb) = &*self.slot(phase).lock().unwrap_or_else(PoisonError::into_inner) {
                pb.set_message(message.to_string());
                return;
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let full = path.to_string_lossy();
    if full.chars().count() <= max_len {
        return full.into_owned();
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
