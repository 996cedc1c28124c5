use std::path::{Path, PathBuf};

use crate::constants::paths;

/// Locations of the files that outlive a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub backup: PathBuf,
    pub lock: PathBuf,
}

impl StatePaths {
    /// Default state directory: `$XDG_STATE_HOME/gamma-dim`, falling back to
    /// the local data directory, then the working directory
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push(paths::APP_DIR);
        path
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            backup: dir.join(paths::BACKUP_FILENAME),
            lock: dir.join(paths::LOCK_FILENAME),
        }
    }

    /// Use `override_dir` if given, the default state directory otherwise
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        match override_dir {
            Some(dir) => Self::in_dir(dir),
            None => Self::in_dir(&Self::default_dir()),
        }
    }
}
