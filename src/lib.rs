#[macro_use]
pub mod logger;

pub mod archive;
pub mod batch;
pub mod cli;
pub mod constants;
pub mod convert;
pub mod error;
pub mod preview;
pub mod progress;
pub mod report;
pub mod selection;
pub mod session;
pub mod utils;

pub use archive::{archive_file_name, build_archive, save_result, write_archive, ArchiveEntry};
pub use batch::{run_batch, BatchOptions, BatchOutcome, BatchStatus, BatchSummary, FileFailure};
pub use convert::{convert_file, decode_surface, encode_webp, output_name_for, ConversionResult};
pub use error::{ConverterError, Operation, Result};
pub use preview::{PreviewHandle, PreviewStore};
pub use progress::{BarProgress, FileOutcome, NoProgress, ProgressSink, ProgressUpdate};
pub use selection::{filter_images, gather, select, CandidateFile, Selection};
pub use session::{ConverterState, Session};
pub use utils::{format_size, percentage_reduction, progress_percent};
