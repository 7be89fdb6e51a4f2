use crate::constants::IMAGE_MIME_PREFIX;
use crate::error::{ConverterError, Result};
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A user-selected file that may be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    path: PathBuf,
    name: String,
    size: u64,
    content_type: String,
}

impl CandidateFile {
    /// Builds a candidate from a file on disk.
    ///
    /// The content type is declared from the file extension, the same way a
    /// browser fills in `File.type`; unknown extensions declare `""`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size,
            content_type: declared_content_type(path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with(IMAGE_MIME_PREFIX)
    }
}

/// The two ways a user can pick files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicit multi-select: file paths or glob patterns.
    Files(Vec<String>),
    /// A directory, flattened recursively.
    Directory(PathBuf),
}

impl Selection {
    pub fn describe(&self) -> String {
        match self {
            Selection::Files(inputs) => inputs.join(", "),
            Selection::Directory(dir) => dir.display().to_string(),
        }
    }
}

pub fn declared_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}

/// Collects every file in `selection`, images or not, in selection order.
pub fn gather(selection: &Selection) -> Result<Vec<CandidateFile>> {
    match selection {
        Selection::Files(inputs) => gather_files(inputs),
        Selection::Directory(dir) => gather_directory(dir),
    }
}

/// Keeps the entries whose declared content type is an image type.
pub fn filter_images(files: Vec<CandidateFile>) -> Vec<CandidateFile> {
    files.into_iter().filter(CandidateFile::is_image).collect()
}

/// Gathers and filters a selection.
///
/// A selection that contains files but no images is an error. An empty
/// selection yields an empty set.
pub fn select(selection: &Selection) -> Result<Vec<CandidateFile>> {
    let files = gather(selection)?;
    if files.is_empty() {
        return Ok(files);
    }

    let total = files.len();
    let images = filter_images(files);
    if images.is_empty() {
        return Err(ConverterError::NoImageFilesFound(selection.describe()));
    }

    crate::verbose!(
        "Selection kept {} of {} files as images",
        images.len(),
        total
    );
    Ok(images)
}

fn gather_files(inputs: &[String]) -> Result<Vec<CandidateFile>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_file() {
            files.push(CandidateFile::from_path(path)?);
        } else if path.is_dir() {
            crate::warn!("Skipping directory {:?}; select it as a folder instead", path);
        } else {
            let before = files.len();
            for entry in readable_matches(glob(input)?) {
                if entry.is_file() {
                    files.push(CandidateFile::from_path(&entry)?);
                }
            }
            if files.len() == before {
                crate::warn!("No files match {}", input);
            }
        }
    }

    Ok(files)
}

/// Glob matches that could be read; unreadable ones are logged and skipped.
fn readable_matches<E: std::fmt::Display>(
    entries: impl Iterator<Item = std::result::Result<PathBuf, E>>,
) -> Vec<PathBuf> {
    entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                crate::warn!("Skipping unreadable match: {}", e);
                None
            }
        })
        .collect()
}

fn gather_directory(dir: &Path) -> Result<Vec<CandidateFile>> {
    if !dir.is_dir() {
        return Err(ConverterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(CandidateFile::from_path(entry.path())?);
        }
    }

    Ok(files)
}
