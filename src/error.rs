//! Error types for gamma ramp handling.

use std::path::PathBuf;

/// Errors raised by the ramp codec, the on-disk stores and the display device.
#[derive(Debug, thiserror::Error)]
pub enum GammaError {
    /// A brightness level outside `1..=100`.
    #[error("Invalid brightness level {0}% (expected 1-100)")]
    InvalidLevel(u8),

    /// The backup record could not be decoded into a full ramp.
    #[error("Malformed ramp backup: {0}")]
    MalformedBackup(String),

    /// No backup record exists on disk.
    #[error("No ramp backup at {}", .0.display())]
    NoBackup(PathBuf),

    /// Reading or writing the backup file failed.
    #[error("Failed to persist ramp backup at {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The display device context could not be obtained or refused the request.
    #[error("Display device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The session already restored the display and gave up control.
    #[error("Session has ended, the display is no longer controlled")]
    SessionEnded,

    /// The session lock marker could not be created or removed.
    #[error("Session lock error at {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
