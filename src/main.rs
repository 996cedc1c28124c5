#![forbid(unsafe_code)]

mod config;
mod constants;
mod controller;
mod device;
mod error;
mod event_handler;
mod lock;
mod persistence;
mod ramp;
mod session;
#[cfg(unix)]
mod signals;
mod tray;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level as TraceLevel, error, info};
use tracing_subscriber::FmtSubscriber;

use config::{Settings, StatePaths};
use controller::RecoverySource;
use device::X11GammaDevice;
use lock::LockGuard;
use persistence::RampStore;

/// Dim the display through its gamma ramp, restoring it on exit or after a crash
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Restore the backed-up ramp from a previous session and exit
    #[arg(long)]
    restore: bool,

    /// Directory holding the ramp backup and session lock
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Settings file to use instead of the default config.json
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn parse_log_level(value: &str) -> TraceLevel {
    match value.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn init_tracing() -> Result<()> {
    let log_level = parse_log_level(&std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")
}

/// Read the settings file; only an interactive session creates a missing one
fn load_settings(path: Option<PathBuf>, create_default: bool) -> Settings {
    let path = path.unwrap_or_else(Settings::path);
    let loaded = if create_default {
        Settings::load_from(&path)
    } else {
        Settings::load_existing(&path)
    };
    loaded.unwrap_or_else(|e| {
        error!(error = ?e, "Ignoring unreadable config, using defaults");
        Settings::default()
    })
}

/// Put the backed-up ramp back without starting a session
fn run_restore(paths: &StatePaths) -> Result<()> {
    let device = X11GammaDevice::connect().context("Failed to open the display's gamma ramp")?;
    let store = RampStore::new(paths.backup.clone());
    let lock = LockGuard::new(paths.lock.clone());

    match controller::recover(&device, &store, &lock).context("Restore failed")? {
        RecoverySource::Backup => eprintln!("Restored gamma ramp from {}", store.path().display()),
        RecoverySource::Identity => eprintln!("No usable backup, restored the identity gamma ramp"),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let settings = load_settings(cli.config, !cli.restore);
    let state_dir = cli.state_dir.or_else(|| settings.state_dir.clone());
    let paths = StatePaths::resolve(state_dir.as_deref());
    info!(backup = %paths.backup.display(), lock = %paths.lock.display(), "Using state files");

    if cli.restore {
        return run_restore(&paths);
    }

    session::run(paths, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("trace"), TraceLevel::TRACE);
        assert_eq!(parse_log_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_log_level("Warn"), TraceLevel::WARN);
        assert_eq!(parse_log_level("error"), TraceLevel::ERROR);
        assert_eq!(parse_log_level("info"), TraceLevel::INFO);
        assert_eq!(parse_log_level("verbose"), TraceLevel::INFO);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["gamma-dim", "--restore", "--state-dir", "/tmp/gd"]);
        assert!(cli.restore);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/gd")));
        assert_eq!(cli.config, None);

        let cli = Cli::parse_from(["gamma-dim"]);
        assert!(!cli.restore);
    }

    #[test]
    fn test_load_settings_falls_back_on_bad_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(load_settings(Some(path.clone()), true), Settings::default());
        assert_eq!(load_settings(Some(path), false), Settings::default());
    }

    #[test]
    fn test_restore_leaves_config_untouched() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        assert_eq!(load_settings(Some(path.clone()), false), Settings::default());
        assert!(!path.exists());

        load_settings(Some(path.clone()), true);
        assert!(path.exists());
    }
}
