//! Progress reporting for batch runs.

use crate::constants::{PROGRESS_BAR_CHARS, PROGRESS_BAR_TEMPLATE};
use indicatif::{ProgressBar, ProgressStyle};

/// How a single file in a batch settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Converted,
    Failed,
}

/// Published by the orchestrator after every file settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub file: String,
    pub outcome: FileOutcome,
    pub completed: usize,
    pub total: usize,
    /// `round(100 * completed / total)`
    pub percent: u8,
}

/// Receives progress from a running batch.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);

    /// Called once after every file has settled.
    fn on_finish(&self) {}
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

/// Terminal progress bar backed by indicatif.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: usize) -> Self {
        let bar = if crate::logger::is_quiet() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        bar.set_style(
            ProgressStyle::with_template(PROGRESS_BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(PROGRESS_BAR_CHARS),
        );
        bar.set_message("Converting...");
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_position(update.completed as u64);
        self.bar.set_message(update.file.clone());
    }

    fn on_finish(&self) {
        self.bar.finish_with_message("✅ Conversion complete");
    }
}
