use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::GammaError;
use crate::ramp::Ramp;

/// Durable home of the original ramp captured at session start
///
/// Holds exactly one backup record at a fixed path. Writes go through a
/// sibling temp file and a rename, so a reader never sees a half-written
/// record.
#[derive(Debug, Clone)]
pub struct RampStore {
    path: PathBuf,
}

impl RampStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `ramp` as the backup record, replacing any previous one
    pub fn save(&self, ramp: &Ramp) -> Result<(), GammaError> {
        let bytes = ramp.encode().map_err(|e| self.persistence_error(io::Error::other(e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.persistence_error(e))?;
        }

        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, &bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.persistence_error(e));
        }
        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            self.persistence_error(e)
        })?;

        info!(path = %self.path.display(), "Saved original gamma ramp backup");
        Ok(())
    }

    /// Read the backup record back
    ///
    /// A missing file is [`GammaError::NoBackup`]; anything that does not
    /// decode into a full ramp is [`GammaError::MalformedBackup`].
    pub fn load(&self) -> Result<Ramp, GammaError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(GammaError::NoBackup(self.path.clone()));
            }
            Err(e) => return Err(self.persistence_error(e)),
        };

        let ramp = Ramp::decode(&bytes)?;
        debug!(path = %self.path.display(), first_red = ?&ramp.red()[..5], "Loaded gamma ramp backup");
        Ok(ramp)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persistence_error(&self, source: io::Error) -> GammaError {
        GammaError::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
