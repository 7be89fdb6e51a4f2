pub const WEBP_EXTENSION: &str = "webp";
pub const IMAGE_MIME_PREFIX: &str = "image/";

pub const ARCHIVE_PREFIX: &str = "webp-images-";
pub const ARCHIVE_EXTENSION: &str = "zip";

pub const DEFAULT_JOBS: usize = 1;
pub const MIN_JOBS: usize = 1;
pub const MAX_JOBS: usize = 64;

pub const SIZE_BASE: f64 = 1024.0;
pub const SIZE_UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];

pub const PREVIEW_DIR_PREFIX: &str = "webp-batch-previews-";
pub const TEMP_FILE_PREFIX: &str = ".webp-batch-";

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {percent:>3}% ({pos}/{len}) {msg}";
pub const PROGRESS_BAR_CHARS: &str = "=>-";

// Messages surfaced in session state
pub const NO_IMAGES_MESSAGE: &str = "No valid image files found";
pub const ARCHIVE_FAILED_MESSAGE: &str = "Failed to create ZIP file for download";

// Common output message prefixes
pub const SUCCESS_PREFIX: &str = "✅";
pub const SIZE_PREFIX: &str = "📊";
pub const SAVED_PREFIX: &str = "🎯";
pub const INFO_PREFIX: &str = "📋";
pub const OUTPUT_PREFIX: &str = "📁";
