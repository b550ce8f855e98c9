//! Shared scratch directory for jobs that need a file on disk.
//!
//! Every job gets its own collision-free file (random name, created atomically by
//! `tempfile`) that is removed when the handle drops, whether the job succeeded or not.
//! The directory itself is removed once, at pipeline teardown.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// The directory is created lazily, on the first `file` call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a fresh, empty scratch file ending in `suffix`.
    pub fn file(&self, suffix: &str) -> Result<NamedTempFile> {
        std::fs::create_dir_all(&self.path).map_err(|e| Error::io(&self.path, e))?;
        tempfile::Builder::new()
            .prefix("")
            .suffix(suffix)
            .rand_bytes(32)
            .tempfile_in(&self.path)
            .map_err(|e| Error::io(&self.path, e))
    }

    /// Recursively remove the directory. A directory that was never created is fine.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }
}
