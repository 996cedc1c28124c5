//! Session lock marker used for crash detection
//!
//! The marker exists exactly while a session holds modified display state.
//! Finding it at startup means the previous session never restored the
//! display, whatever the reason.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::GammaError;

#[derive(Debug, Clone)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a marker is present
    pub fn is_held(&self) -> bool {
        self.path.exists()
    }

    /// PID recorded by whoever created the marker (diagnostics only)
    pub fn holder_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.path).ok()?.trim().parse().ok()
    }

    /// Create the marker; fails if it cannot be created or already exists
    pub fn acquire(&self) -> Result<(), GammaError> {
        let lock_error = |source: io::Error| GammaError::Lock {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(lock_error)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(lock_error)?;
        let pid = std::process::id();
        if let Err(e) = writeln!(file, "{pid}") {
            // Existence is what counts; the PID is only informational
            warn!(path = %self.path.display(), error = %e, "Could not record PID in lock marker");
        }

        info!(path = %self.path.display(), pid, "Acquired session lock");
        Ok(())
    }

    /// Remove the marker; an absent marker is not an error
    pub fn release(&self) -> Result<(), GammaError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Released session lock");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GammaError::Lock {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
