use crate::constants::{ARCHIVE_EXTENSION, ARCHIVE_PREFIX, TEMP_FILE_PREFIX};
use crate::convert::ConversionResult;
use crate::error::{ConverterError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One file destined for the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    name: String,
    payload: Arc<[u8]>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, payload: Arc<[u8]>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// `webp-images-<ISO8601>.zip` with `:` and `.` replaced by `-`.
pub fn archive_file_name(now: DateTime<Utc>) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}{}.{}", ARCHIVE_PREFIX, timestamp, ARCHIVE_EXTENSION)
}

/// Builds a Deflate-compressed ZIP with one entry per result.
///
/// Entries sharing a name keep the last payload; the entry stays at the
/// position where the name first appeared.
pub fn build_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        if let Some(previous) = last_index.insert(entry.name(), index) {
            crate::warn!(
                "Duplicate archive entry {} (item {} replaced by item {})",
                entry.name(),
                previous + 1,
                index + 1
            );
        }
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut written: Vec<&str> = Vec::with_capacity(last_index.len());

    for entry in entries {
        if written.contains(&entry.name()) {
            continue;
        }
        let winner = &entries[last_index[entry.name()]];
        zip.start_file(winner.name(), options)?;
        zip.write_all(winner.payload())?;
        written.push(entry.name());
    }

    Ok(zip.finish()?.into_inner())
}

/// Builds the archive for `entries` and writes it into `dest_dir`.
///
/// The build runs on the blocking pool. The file only appears under its
/// final name once it is complete.
pub async fn write_archive(
    entries: Vec<ArchiveEntry>,
    dest_dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let dest = dest_dir.join(archive_file_name(now));
    let dir = dest_dir.to_path_buf();
    let target = dest.clone();

    tokio::task::spawn_blocking(move || {
        let bytes = build_archive(&entries)?;
        crate::verbose!("Archive holds {} entries, {} bytes", entries.len(), bytes.len());
        persist_bytes(&dir, &target, &bytes)
    })
    .await??;

    Ok(dest)
}

/// Writes one result, uncompressed, as `<dest_dir>/<output name>`.
pub fn save_result(result: &ConversionResult, dest_dir: &Path) -> Result<PathBuf> {
    let dest = dest_dir.join(result.output_name());
    persist_bytes(dest_dir, &dest, result.payload())?;
    Ok(dest)
}

/// Writes through a temporary file in `dir` that is renamed onto `dest`.
/// The temporary file is removed if anything fails.
fn persist_bytes(dir: &Path, dest: &Path, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    persist(temp, dest)
}

fn persist(temp: NamedTempFile, dest: &Path) -> Result<()> {
    temp.persist(dest)
        .map_err(|e| ConverterError::Persist {
            path: dest.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}
