//! Deferred file deletion
//!
//! A recording file that cannot be removed right away is queued here and
//! retried when the host shuts down.

use crate::error::AppError;
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PendingDeletes {
    paths: Vec<PathBuf>,
}

impl PendingDeletes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a file now, or queue it for deletion at shutdown
    ///
    /// Returns true if the file is gone.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        match try_remove(path) {
            Ok(()) => true,
            Err(source) => {
                let err = AppError::FileDelete {
                    path: path.to_path_buf(),
                    source,
                };
                warn!("{}; deferring until shutdown", err);
                if !self.paths.iter().any(|p| p == path) {
                    self.paths.push(path.to_path_buf());
                }
                false
            }
        }
    }

    /// Paths still waiting for deletion
    pub fn pending(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Retry every queued deletion, returning how many still failed
    pub fn flush(&mut self) -> usize {
        self.paths.retain(|path| match try_remove(path) {
            Ok(()) => {
                debug!("Deferred delete of {:?} done", path);
                false
            }
            Err(e) => {
                warn!("Deferred delete of {:?} failed: {}", path, e);
                true
            }
        });
        self.paths.len()
    }
}

fn try_remove(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
