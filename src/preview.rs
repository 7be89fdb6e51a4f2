//! Transient preview handles for converted payloads.
//!
//! A handle owns one file inside the store's temporary directory. Handles
//! are not `Clone`; dropping one deletes its file, so each preview is
//! released exactly once and its lifetime follows the result that holds it.

use crate::constants::PREVIEW_DIR_PREFIX;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug)]
struct StoreInner {
    dir: TempDir,
    live: AtomicUsize,
    next_id: AtomicU64,
}

/// Cheaply cloneable owner of the preview directory.
#[derive(Debug, Clone)]
pub struct PreviewStore {
    inner: Arc<StoreInner>,
}

impl PreviewStore {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(PREVIEW_DIR_PREFIX)
            .tempdir()?;
        Ok(Self {
            inner: Arc::new(StoreInner {
                dir,
                live: AtomicUsize::new(0),
                next_id: AtomicU64::new(0),
            }),
        })
    }

    /// Writes `payload` to a new preview file named after `name`.
    pub fn acquire(&self, name: &str, payload: &[u8]) -> io::Result<PreviewHandle> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let path = self.inner.dir.path().join(format!("{id}-{name}"));
        fs::write(&path, payload)?;
        self.inner.live.fetch_add(1, Ordering::Relaxed);

        Ok(PreviewHandle {
            path,
            store: Arc::clone(&self.inner),
        })
    }

    /// Number of handles acquired and not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.inner.live.load(Ordering::Relaxed)
    }

    pub fn dir(&self) -> &Path {
        self.inner.dir.path()
    }
}

/// A displayable reference to one converted payload.
#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
    store: Arc<StoreInner>,
}

impl PreviewHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        self.store.live.fetch_sub(1, Ordering::Relaxed);
    }
}
