//! User settings stored as JSON in the config directory

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{levels, paths};

/// Settings read from `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory for the ramp backup and lock marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// Read the ramp back after every write and report driver clamping
    #[serde(default)]
    pub verify_writes: bool,

    /// Lowest level offered in the tray menu
    #[serde(default = "default_min_level")]
    pub min_level: u8,
}

fn default_min_level() -> u8 {
    levels::MENU_FLOOR
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: None,
            verify_writes: false,
            min_level: default_min_level(),
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(paths::APP_DIR);
        path.push(paths::CONFIG_FILENAME);
        path
    }

    /// Load settings from `path`, creating a default file if none exists
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default config");
            let settings = Settings::default();
            if let Err(e) = settings.save_to(path) {
                warn!(error = %e, "Could not write default config, continuing with defaults");
            }
            return Ok(settings);
        }
        Self::load_existing(path)
    }

    /// Load settings from `path` without writing anything; a missing file
    /// yields the defaults
    pub fn load_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;

        info!(path = %path.display(), "Loaded config");
        Ok(settings.validated())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {:?}", path))?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Replace out-of-range values with their defaults
    fn validated(mut self) -> Self {
        let valid = (levels::MENU_FLOOR..=levels::FULL).contains(&self.min_level)
            && self.min_level % levels::MENU_STEP == 0;
        if !valid {
            warn!(
                min_level = self.min_level,
                default = default_min_level(),
                "min_level must be 10-100 in steps of 10, using default"
            );
            self.min_level = default_min_level();
        }
        self
    }
}
