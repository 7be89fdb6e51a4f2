use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Long-running operations a session guards with a busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Conversion,
    ArchiveBuild,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Conversion => write!(f, "conversion"),
            Operation::ArchiveBuild => write!(f, "archive build"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {name} as WebP: {reason}")]
    Encode { name: String, reason: String },

    #[error("Failed to create preview for {name}: {source}")]
    Preview {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No image files found in selection: {0}")]
    NoImageFilesFound(String),

    #[error("No files selected for conversion")]
    NothingToConvert,

    #[error("Converted 0 of {0} files")]
    AllConversionsFailed(usize),

    #[error("No converted images to download")]
    NoResults,

    #[error("No converted image at index {0}")]
    ResultNotFound(usize),

    #[error("{0} already in progress")]
    Busy(Operation),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to write {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ConverterError {
    /// True for errors that only affect a single file in a batch.
    pub fn is_conversion_failure(&self) -> bool {
        matches!(
            self,
            ConverterError::Read { .. }
                | ConverterError::Decode { .. }
                | ConverterError::Encode { .. }
                | ConverterError::Preview { .. }
                | ConverterError::Task(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
