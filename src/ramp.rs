//! Gamma ramp values and the pure transformations on them
//!
//! A [`Ramp`] is the 256-entry per-channel lookup table the display driver
//! applies between the framebuffer and the panel. Nothing in this module
//! touches the device or the file system.

use serde::{Deserialize, Serialize};

use crate::constants::{backup, gamma, levels};
use crate::error::GammaError;

/// One channel of a ramp
pub type Channel = [u16; gamma::RAMP_SIZE];

/// A full red/green/blue gamma ramp
///
/// The fixed-size arrays make a short or over-long ramp unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ramp {
    red: Channel,
    green: Channel,
    blue: Channel,
}

/// On-disk shape of the backup record
#[derive(Debug, Serialize, Deserialize)]
struct BackupRecord {
    version: u32,
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
}

impl Ramp {
    pub fn from_channels(red: Channel, green: Channel, blue: Channel) -> Self {
        Self { red, green, blue }
    }

    /// Same table on all three channels
    pub fn uniform(channel: Channel) -> Self {
        Self::from_channels(channel, channel, channel)
    }

    /// Linear ramp that performs no color transformation
    pub fn identity() -> Self {
        Self::uniform(std::array::from_fn(|i| i as u16 * gamma::IDENTITY_STEP))
    }

    pub fn red(&self) -> &Channel {
        &self.red
    }

    pub fn green(&self) -> &Channel {
        &self.green
    }

    pub fn blue(&self) -> &Channel {
        &self.blue
    }

    /// `(red, green, blue)` at position `index`
    pub fn entry(&self, index: usize) -> (u16, u16, u16) {
        (self.red[index], self.green[index], self.blue[index])
    }

    /// Scale every channel by `level` percent
    ///
    /// Always applied to the ramp it is called on; callers pass the original
    /// ramp so repeated calls never compound.
    pub fn scale(&self, level: u8) -> Result<Self, GammaError> {
        if level == 0 || level > levels::FULL {
            return Err(GammaError::InvalidLevel(level));
        }
        let scale_channel = |channel: &Channel| -> Channel {
            std::array::from_fn(|i| scale_value(channel[i], level))
        };
        Ok(Self {
            red: scale_channel(&self.red),
            green: scale_channel(&self.green),
            blue: scale_channel(&self.blue),
        })
    }

    /// Serialize into the versioned backup record
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        let record = BackupRecord {
            version: backup::FORMAT_VERSION,
            red: self.red.to_vec(),
            green: self.green.to_vec(),
            blue: self.blue.to_vec(),
        };
        serde_json::to_vec(&record)
    }

    /// Parse a backup record, rejecting anything that is not a complete ramp
    pub fn decode(bytes: &[u8]) -> Result<Self, GammaError> {
        let record: BackupRecord = serde_json::from_slice(bytes)
            .map_err(|e| GammaError::MalformedBackup(e.to_string()))?;

        if record.version != backup::FORMAT_VERSION {
            return Err(GammaError::MalformedBackup(format!(
                "unsupported version {} (expected {})",
                record.version,
                backup::FORMAT_VERSION
            )));
        }

        Ok(Self {
            red: channel_from_vec("red", record.red)?,
            green: channel_from_vec("green", record.green)?,
            blue: channel_from_vec("blue", record.blue)?,
        })
    }
}

/// `round(value * level / 100)`, clamped to the channel range
fn scale_value(value: u16, level: u8) -> u16 {
    let full = u32::from(levels::FULL);
    let scaled = (u32::from(value) * u32::from(level) + full / 2) / full;
    scaled.min(gamma::MAX_CHANNEL) as u16
}

fn channel_from_vec(name: &str, values: Vec<u16>) -> Result<Channel, GammaError> {
    values.try_into().map_err(|values: Vec<u16>| {
        GammaError::MalformedBackup(format!(
            "{name} channel has {} entries (expected {})",
            values.len(),
            gamma::RAMP_SIZE
        ))
    })
}

/// Levels offered in the tray menu, brightest first, stopping at `floor`
pub fn menu_levels(floor: u8) -> impl Iterator<Item = u8> {
    (floor..=levels::FULL)
        .rev()
        .step_by(usize::from(levels::MENU_STEP))
}
