//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Gamma ramp geometry
pub mod gamma {
    /// Number of entries per channel in a ramp
    pub const RAMP_SIZE: usize = 256;

    /// Identity ramp step (255 * 257 == 65535)
    pub const IDENTITY_STEP: u16 = 257;

    /// Largest value a channel entry can hold
    pub const MAX_CHANNEL: u32 = u16::MAX as u32;
}

/// Brightness level bounds (percent)
pub mod levels {
    /// Full brightness, i.e. the unscaled original ramp
    pub const FULL: u8 = 100;

    /// Lowest level offered in the tray menu
    pub const MENU_FLOOR: u8 = 10;

    /// Distance between neighbouring menu levels
    pub const MENU_STEP: u8 = 10;
}

/// Backup record format
pub mod backup {
    /// Version tag written into every backup record
    pub const FORMAT_VERSION: u32 = 1;
}

/// File and directory names
pub mod paths {
    /// Directory under the config/state roots
    pub const APP_DIR: &str = "gamma-dim";

    /// Settings file name inside the config directory
    pub const CONFIG_FILENAME: &str = "config.json";

    /// Original ramp backup inside the state directory
    pub const BACKUP_FILENAME: &str = "ramp-backup.json";

    /// Session lock marker inside the state directory
    pub const LOCK_FILENAME: &str = "session.lock";
}

/// X11 RandR constants
pub mod randr {
    /// Minimum RandR major version (CRTC gamma + primary output)
    pub const MIN_MAJOR: u32 = 1;

    /// Minimum RandR minor version
    pub const MIN_MINOR: u32 = 3;
}

/// Tray presentation constants
pub mod tray {
    /// Tray item id reported to the StatusNotifier host
    pub const ID: &str = "gamma-dim";

    /// Title shown by hosts that display one
    pub const TITLE: &str = "Gamma Dim";

    /// Edge length of the square icon pixmap
    pub const ICON_SIZE: i32 = 64;

    /// Inset of the sun disc from the icon edge
    pub const SUN_MARGIN: f32 = 16.0;

    /// Length of each sun ray beyond the disc
    pub const RAY_LENGTH: f32 = 10.0;

    /// Half of the ray stroke width
    pub const RAY_HALF_WIDTH: f32 = 1.0;

    /// Number of rays around the disc
    pub const RAY_COUNT: usize = 8;
}
