//! Configuration management for gamma-dim
//!
//! This module provides two pieces:
//! - **settings**: user settings loaded from the JSON config file
//! - **paths**: the fixed locations of the ramp backup and the lock marker

pub mod paths;
pub mod settings;

// Re-export commonly used types
pub use paths::StatePaths;
pub use settings::Settings;
