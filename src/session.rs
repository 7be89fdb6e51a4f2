//! The converter's state record and the transitions that drive it.
//!
//! `ConverterState` holds everything the shell displays. Each user action is
//! a method on [`Session`], which locks the record only between suspension
//! points, never across an await.

use crate::archive::{save_result, write_archive};
use crate::batch::{run_batch, BatchOptions, BatchOutcome, BatchStatus, BatchSummary};
use crate::constants::{ARCHIVE_FAILED_MESSAGE, NO_IMAGES_MESSAGE};
use crate::convert::ConversionResult;
use crate::error::{ConverterError, Operation, Result};
use crate::preview::PreviewStore;
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::selection::{select, CandidateFile, Selection};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Everything the shell renders.
///
/// `run` identifies the current selection. A new selection or a reset
/// advances it, and writes tagged with an older run are ignored.
#[derive(Debug, Default)]
pub struct ConverterState {
    candidates: Vec<CandidateFile>,
    results: Vec<ConversionResult>,
    progress: u8,
    error: Option<String>,
    total_saved: i64,
    converting: bool,
    downloading: bool,
    run: u64,
}

impl ConverterState {
    pub fn candidates(&self) -> &[CandidateFile] {
        &self.candidates
    }

    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn total_saved(&self) -> i64 {
        self.total_saved
    }

    pub fn is_converting(&self) -> bool {
        self.converting
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Applies the outcome of a file selection.
    ///
    /// Any prior run is cleared either way and operations still in flight
    /// are superseded. Candidates are replaced only when the selection
    /// produced images.
    pub fn apply_selection(&mut self, selected: &Result<Vec<CandidateFile>>) {
        self.advance_run();
        self.error = None;

        match selected {
            Ok(files) if !files.is_empty() => self.candidates = files.clone(),
            Ok(_) => {}
            Err(ConverterError::NoImageFilesFound(_)) => {
                self.error = Some(NO_IMAGES_MESSAGE.to_string())
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Marks a conversion as running and returns the run it belongs to.
    pub fn begin_conversion(&mut self) -> Result<u64> {
        if self.converting {
            return Err(ConverterError::Busy(Operation::Conversion));
        }
        if self.candidates.is_empty() {
            return Err(ConverterError::NothingToConvert);
        }
        self.clear_run();
        self.converting = true;
        Ok(self.run)
    }

    /// Progress only moves forward within a run.
    pub fn record_progress(&mut self, run: u64, percent: u8) {
        if run == self.run {
            self.progress = self.progress.max(percent.min(100));
        }
    }

    /// Stores a finished run. A run where every file failed leaves a
    /// `Converted 0 of N files` message.
    ///
    /// Returns false, dropping the outcome, when `run` has been superseded.
    pub fn finish_conversion(&mut self, run: u64, outcome: BatchOutcome) -> bool {
        if run != self.run {
            return false;
        }
        let status = outcome.status();
        let summary = outcome.summary;
        self.results = outcome.results;
        self.total_saved = summary.saved();
        if status == BatchStatus::AllFailed {
            self.error = Some(ConverterError::AllConversionsFailed(summary.total).to_string());
        }
        true
    }

    /// Marks an archive build as running and returns the run it belongs to.
    pub fn begin_download(&mut self) -> Result<u64> {
        if self.downloading {
            return Err(ConverterError::Busy(Operation::ArchiveBuild));
        }
        if self.results.is_empty() {
            return Err(ConverterError::NoResults);
        }
        self.downloading = true;
        Ok(self.run)
    }

    pub fn fail_download(&mut self, run: u64) {
        if run == self.run {
            self.error = Some(ARCHIVE_FAILED_MESSAGE.to_string());
        }
    }

    pub fn end_operation(&mut self, run: u64, operation: Operation) {
        if run != self.run {
            return;
        }
        match operation {
            Operation::Conversion => self.converting = false,
            Operation::ArchiveBuild => self.downloading = false,
        }
    }

    /// Clears everything and supersedes any operation in flight.
    pub fn reset(&mut self) {
        drop(self.take_reset());
    }

    /// Resets the record and hands back the previous contents.
    fn take_reset(&mut self) -> ConverterState {
        let fresh = ConverterState {
            run: self.run.wrapping_add(1),
            ..ConverterState::default()
        };
        std::mem::replace(self, fresh)
    }

    fn advance_run(&mut self) {
        self.run = self.run.wrapping_add(1);
        self.converting = false;
        self.downloading = false;
        self.clear_run();
    }

    fn clear_run(&mut self) {
        self.results.clear();
        self.progress = 0;
        self.total_saved = 0;
    }
}

/// Owns the state record and the resources behind it.
#[derive(Debug)]
pub struct Session {
    state: Mutex<ConverterState>,
    previews: PreviewStore,
    options: BatchOptions,
}

impl Session {
    pub fn new(options: BatchOptions) -> Result<Self> {
        Ok(Self {
            state: Mutex::new(ConverterState::default()),
            previews: PreviewStore::new()?,
            options,
        })
    }

    pub fn state(&self) -> MutexGuard<'_, ConverterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Replaces the candidate set from `selection`.
    ///
    /// Returns the number of candidates selected. A selection without images
    /// is an error and leaves the message in the state.
    pub fn select(&self, selection: &Selection) -> Result<usize> {
        let selected = select(selection);
        let released = {
            let mut state = self.state();
            let previous = std::mem::take(&mut state.results);
            state.apply_selection(&selected);
            previous
        };
        drop(released);
        selected.map(|files| files.len())
    }

    /// Converts every candidate.
    ///
    /// Rejected while another conversion is running. Per-file failures are
    /// logged and skipped; a run where every file fails is an error. When a
    /// new selection or a reset lands mid-run, the outcome is discarded.
    pub async fn convert(&self, sink: &dyn ProgressSink) -> Result<BatchSummary> {
        let (candidates, guard) = {
            let mut state = self.state();
            let run = state.begin_conversion()?;
            (
                state.candidates.clone(),
                BusyGuard::new(self, run, Operation::Conversion),
            )
        };

        let mirror = StateProgress {
            session: self,
            run: guard.run,
            inner: sink,
        };
        let outcome = run_batch(&candidates, &self.previews, self.options, &mirror).await;
        let summary = outcome.summary;

        if !self.state().finish_conversion(guard.run, outcome) {
            crate::verbose!("Selection changed during conversion; discarding results");
            return Ok(summary);
        }

        match summary.status() {
            BatchStatus::AllFailed => Err(ConverterError::AllConversionsFailed(summary.total)),
            _ => Ok(summary),
        }
    }

    /// Packs every result into a timestamped archive inside `dest_dir`.
    ///
    /// Rejected while another archive build is running. A failed build leaves
    /// an error message but keeps the results.
    pub async fn download_all(&self, dest_dir: &Path) -> Result<PathBuf> {
        let (entries, guard) = {
            let mut state = self.state();
            let run = state.begin_download()?;
            let entries: Vec<_> = state.results.iter().map(|r| r.archive_entry()).collect();
            (entries, BusyGuard::new(self, run, Operation::ArchiveBuild))
        };

        let written = write_archive(entries, dest_dir, Utc::now()).await;
        if let Err(e) = &written {
            crate::error!("Error creating ZIP file: {}", e);
            self.state().fail_download(guard.run);
        }
        written
    }

    /// Writes the result at `index` on its own.
    pub fn download_one(&self, index: usize, dest_dir: &Path) -> Result<PathBuf> {
        let state = self.state();
        let result = state
            .results
            .get(index)
            .ok_or(ConverterError::ResultNotFound(index))?;
        save_result(result, dest_dir)
    }

    /// Clears the whole state, releasing every preview it held.
    pub fn reset(&self) {
        let released = self.state().take_reset();
        drop(released);
    }
}

/// Clears an operation's busy flag when dropped, whatever the outcome.
struct BusyGuard<'a> {
    session: &'a Session,
    run: u64,
    operation: Operation,
}

impl<'a> BusyGuard<'a> {
    fn new(session: &'a Session, run: u64, operation: Operation) -> Self {
        Self {
            session,
            run,
            operation,
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        // A superseded run no longer owns the flag.
        self.session.state().end_operation(self.run, self.operation);
    }
}

/// Mirrors batch progress into the state before forwarding it.
struct StateProgress<'a> {
    session: &'a Session,
    run: u64,
    inner: &'a dyn ProgressSink,
}

impl ProgressSink for StateProgress<'_> {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.session.state().record_progress(self.run, update.percent);
        self.inner.on_progress(update);
    }

    fn on_finish(&self) {
        self.inner.on_finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_png(path: &Path) {
        RgbaImage::from_pixel(12, 9, Rgba([1, 2, 3, 255]))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    fn image_selection(dir: &Path, names: &[&str]) -> Selection {
        Selection::Files(
            names
                .iter()
                .map(|name| {
                    let path = dir.join(name);
                    write_png(&path);
                    path.to_string_lossy().into_owned()
                })
                .collect(),
        )
    }

    #[test]
    fn test_state_reset_is_total() {
        let mut state = ConverterState {
            progress: 40,
            error: Some("boom".to_string()),
            total_saved: 99,
            converting: true,
            downloading: true,
            ..ConverterState::default()
        };
        state.reset();

        assert_eq!(state.progress(), 0);
        assert_eq!(state.error(), None);
        assert_eq!(state.total_saved(), 0);
        assert!(!state.is_converting());
        assert!(!state.is_downloading());
        assert!(state.candidates().is_empty());
        assert!(state.results().is_empty());
    }

    #[test]
    fn test_record_progress_never_moves_backwards() {
        let mut state = ConverterState::default();
        let run = state.run();
        state.record_progress(run, 50);
        state.record_progress(run, 25);
        assert_eq!(state.progress(), 50);
        state.record_progress(run, 200);
        assert_eq!(state.progress(), 100);
    }

    #[test]
    fn test_stale_run_cannot_write() {
        let mut state = ConverterState::default();
        let stale = state.run();
        state.apply_selection(&Ok(Vec::new()));
        assert_ne!(state.run(), stale);

        state.record_progress(stale, 60);
        assert_eq!(state.progress(), 0);

        let outcome = BatchOutcome {
            results: Vec::new(),
            failures: Vec::new(),
            summary: BatchSummary::from_results(&[], 2, std::time::Duration::ZERO),
        };
        assert!(!state.finish_conversion(stale, outcome));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_reset_supersedes_running_operations() {
        let mut state = ConverterState {
            converting: true,
            downloading: true,
            ..ConverterState::default()
        };
        let stale = state.run();
        state.reset();
        assert_ne!(state.run(), stale);

        state.converting = true;
        state.end_operation(stale, Operation::Conversion);
        assert!(state.is_converting());
        state.end_operation(state.run(), Operation::Conversion);
        assert!(!state.is_converting());
    }

    #[test]
    fn test_begin_conversion_requires_candidates() {
        let mut state = ConverterState::default();
        assert!(matches!(
            state.begin_conversion(),
            Err(ConverterError::NothingToConvert)
        ));
    }

    #[test]
    fn test_begin_download_rejects_overlap() {
        let mut state = ConverterState {
            downloading: true,
            ..ConverterState::default()
        };
        assert!(matches!(
            state.begin_download(),
            Err(ConverterError::Busy(Operation::ArchiveBuild))
        ));
    }

    #[test]
    fn test_select_without_images_sets_error() {
        let temp_dir = TempDir::new().unwrap();
        let notes = temp_dir.path().join("notes.txt");
        fs::write(&notes, b"hello").unwrap();

        let session = Session::new(BatchOptions::default()).unwrap();
        let result = session.select(&Selection::Files(vec![notes
            .to_string_lossy()
            .into_owned()]));

        assert!(matches!(result, Err(ConverterError::NoImageFilesFound(_))));
        assert_eq!(session.state().error(), Some("No valid image files found"));
    }

    #[tokio::test]
    async fn test_convert_then_reset() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::new(BatchOptions::default()).unwrap();
        let count = session
            .select(&image_selection(temp_dir.path(), &["a.png", "b.png"]))
            .unwrap();
        assert_eq!(count, 2);

        let summary = session.convert(&NoProgress).await.unwrap();
        assert_eq!(summary.converted, 2);
        {
            let state = session.state();
            assert_eq!(state.progress(), 100);
            assert_eq!(state.results().len(), 2);
            assert_eq!(state.total_saved(), summary.saved());
            assert!(!state.is_converting());
        }
        assert_eq!(session.previews().live_handles(), 2);

        session.reset();
        let state = session.state();
        assert!(state.candidates().is_empty());
        assert!(state.results().is_empty());
        assert_eq!(state.progress(), 0);
        assert_eq!(state.total_saved(), 0);
        assert_eq!(session.previews().live_handles(), 0);
    }

    #[tokio::test]
    async fn test_busy_flag_rejects_second_conversion() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::new(BatchOptions::default()).unwrap();
        session
            .select(&image_selection(temp_dir.path(), &["a.png"]))
            .unwrap();

        let guard = {
            let mut state = session.state();
            let run = state.begin_conversion().unwrap();
            BusyGuard::new(&session, run, Operation::Conversion)
        };
        let second = session.convert(&NoProgress).await;
        assert!(matches!(
            second,
            Err(ConverterError::Busy(Operation::Conversion))
        ));

        drop(guard);
        assert!(!session.state().is_converting());
        assert!(session.convert(&NoProgress).await.is_ok());
    }

    #[tokio::test]
    async fn test_busy_flag_rejects_second_archive_build() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("out");
        let session = Session::new(BatchOptions::default()).unwrap();
        session
            .select(&image_selection(temp_dir.path(), &["a.png"]))
            .unwrap();
        session.convert(&NoProgress).await.unwrap();

        let guard = {
            let mut state = session.state();
            let run = state.begin_download().unwrap();
            BusyGuard::new(&session, run, Operation::ArchiveBuild)
        };
        let second = session.download_all(&out_dir).await;
        assert!(matches!(
            second,
            Err(ConverterError::Busy(Operation::ArchiveBuild))
        ));
        assert!(!out_dir.exists());

        drop(guard);
        let archive = session.download_all(&out_dir).await.unwrap();
        assert!(archive.is_file());
        assert!(!session.state().is_downloading());
    }

    #[tokio::test]
    async fn test_all_failed_conversion_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let broken = temp_dir.path().join("broken.png");
        fs::write(&broken, b"nope").unwrap();

        let session = Session::new(BatchOptions::default()).unwrap();
        session
            .select(&Selection::Files(vec![broken.to_string_lossy().into_owned()]))
            .unwrap();

        let result = session.convert(&NoProgress).await;
        assert!(matches!(result, Err(ConverterError::AllConversionsFailed(1))));

        let state = session.state();
        assert!(state.results().is_empty());
        assert_eq!(state.error(), Some("Converted 0 of 1 files"));
        assert_eq!(state.progress(), 100);
        assert!(!state.is_converting());
    }

    #[tokio::test]
    async fn test_failed_archive_keeps_results() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::new(BatchOptions::default()).unwrap();
        session
            .select(&image_selection(temp_dir.path(), &["a.png"]))
            .unwrap();
        session.convert(&NoProgress).await.unwrap();

        // A regular file where the destination directory should be.
        let blocked = temp_dir.path().join("blocked");
        fs::write(&blocked, b"file").unwrap();

        assert!(session.download_all(&blocked).await.is_err());
        let state = session.state();
        assert_eq!(state.error(), Some("Failed to create ZIP file for download"));
        assert_eq!(state.results().len(), 1);
        assert!(!state.is_downloading());
    }

    #[tokio::test]
    async fn test_download_one() {
        let temp_dir = TempDir::new().unwrap();
        let out_dir = temp_dir.path().join("out");
        let session = Session::new(BatchOptions::default()).unwrap();
        session
            .select(&image_selection(temp_dir.path(), &["single.png"]))
            .unwrap();
        session.convert(&NoProgress).await.unwrap();

        let path = session.download_one(0, &out_dir).unwrap();
        assert_eq!(path, out_dir.join("single.webp"));
        assert_eq!(
            fs::read(&path).unwrap(),
            session.state().results()[0].payload()
        );
        assert!(matches!(
            session.download_one(5, &out_dir),
            Err(ConverterError::ResultNotFound(5))
        ));
    }

    #[tokio::test]
    async fn test_reselect_clears_results_and_keeps_handles_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let session = Session::new(BatchOptions::default()).unwrap();
        let selection = image_selection(temp_dir.path(), &["a.png", "b.png", "c.png"]);

        for _ in 0..3 {
            session.select(&selection).unwrap();
            assert_eq!(session.previews().live_handles(), 0);
            session.convert(&NoProgress).await.unwrap();
            assert_eq!(session.previews().live_handles(), 3);
        }
        session.reset();
        assert_eq!(session.previews().live_handles(), 0);
    }
}
