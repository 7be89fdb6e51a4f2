use crate::constants::{DEFAULT_JOBS, MAX_JOBS, MIN_JOBS};
use crate::convert::{convert_file, ConversionResult};
use crate::error::ConverterError;
use crate::preview::PreviewStore;
use crate::progress::{FileOutcome, ProgressSink, ProgressUpdate};
use crate::selection::CandidateFile;
use crate::utils::progress_percent;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Files converted at the same time. 1 means strictly sequential.
    pub jobs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { jobs: DEFAULT_JOBS }
    }
}

impl BatchOptions {
    pub fn new(jobs: Option<usize>) -> Self {
        Self {
            jobs: jobs.unwrap_or(DEFAULT_JOBS).clamp(MIN_JOBS, MAX_JOBS),
        }
    }
}

/// A file that failed to convert. Kept as a diagnostic only.
#[derive(Debug)]
pub struct FileFailure {
    pub name: String,
    pub error: ConverterError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Nothing was selected.
    Empty,
    Complete,
    /// Some files failed; the rest converted.
    Partial,
    AllFailed,
}

/// Totals for one run, computed from the final result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub converted: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub converted_bytes: u64,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn from_results(results: &[ConversionResult], total: usize, elapsed: Duration) -> Self {
        let original_bytes = results.iter().map(ConversionResult::original_size).sum();
        let converted_bytes = results.iter().map(ConversionResult::webp_size).sum();
        Self {
            total,
            converted: results.len(),
            failed: total.saturating_sub(results.len()),
            original_bytes,
            converted_bytes,
            elapsed,
        }
    }

    /// `sum(original) - sum(converted)`; negative when WebP grew the batch.
    pub fn saved(&self) -> i64 {
        self.original_bytes as i64 - self.converted_bytes as i64
    }

    pub fn status(&self) -> BatchStatus {
        if self.total == 0 {
            BatchStatus::Empty
        } else if self.converted == 0 {
            BatchStatus::AllFailed
        } else if self.failed > 0 {
            BatchStatus::Partial
        } else {
            BatchStatus::Complete
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Successful conversions in selection order.
    pub results: Vec<ConversionResult>,
    pub failures: Vec<FileFailure>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    pub fn status(&self) -> BatchStatus {
        self.summary.status()
    }
}

/// Converts every candidate and collects the results in selection order.
///
/// With `jobs == 1` each file is read, decoded and encoded before the next
/// one starts. Larger values keep up to `jobs` conversions in flight, still
/// started in selection order. Progress is published after every file,
/// success or failure; totals are computed only once all files settle.
pub async fn run_batch(
    files: &[CandidateFile],
    previews: &PreviewStore,
    options: BatchOptions,
    sink: &dyn ProgressSink,
) -> BatchOutcome {
    let start_time = Instant::now();
    let total = files.len();
    let jobs = options.jobs.clamp(MIN_JOBS, MAX_JOBS);

    crate::verbose!("Converting {} files with {} worker(s)", total, jobs);

    let mut slots: Vec<Option<ConversionResult>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);
    let mut failures = Vec::new();
    let mut completed = 0;

    let mut pending = files.iter().cloned().enumerate();
    let mut in_flight = JoinSet::new();

    loop {
        while in_flight.len() < jobs {
            let Some((index, file)) = pending.next() else {
                break;
            };
            let store = previews.clone();
            in_flight.spawn(async move {
                let result = convert_file(&file, &store).await;
                (index, file.name().to_string(), result)
            });
        }

        let Some(joined) = in_flight.join_next().await else {
            break;
        };
        completed += 1;

        let (name, outcome) = match joined {
            Ok((index, name, Ok(result))) => {
                slots[index] = Some(result);
                (name, FileOutcome::Converted)
            }
            Ok((_, name, Err(error))) => {
                crate::warn!("Failed to convert {}: {}", name, error);
                failures.push(FileFailure {
                    name: name.clone(),
                    error,
                });
                (name, FileOutcome::Failed)
            }
            Err(join_error) => {
                crate::warn!("Conversion task failed: {}", join_error);
                let name = "<unknown>".to_string();
                failures.push(FileFailure {
                    name: name.clone(),
                    error: ConverterError::Task(join_error),
                });
                (name, FileOutcome::Failed)
            }
        };

        sink.on_progress(&ProgressUpdate {
            file: name,
            outcome,
            completed,
            total,
            percent: progress_percent(completed, total),
        });
    }
    sink.on_finish();

    let results: Vec<ConversionResult> = slots.into_iter().flatten().collect();
    let summary = BatchSummary::from_results(&results, total, start_time.elapsed());

    crate::verbose!(
        "Batch finished: {} converted, {} failed in {:?}",
        summary.converted,
        summary.failed,
        summary.elapsed
    );

    BatchOutcome {
        results,
        failures,
        summary,
    }
}
