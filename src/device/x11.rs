use std::cell::OnceCell;
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{ConnectionExt as RandrExt, Crtc};
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use super::GammaDevice;
use crate::constants::{gamma, randr};
use crate::error::GammaError;
use crate::ramp::{Channel, Ramp};

/// Gamma table of the primary display's CRTC, driven through X11 RandR
pub struct X11GammaDevice {
    conn: RustConnection,
    crtc: Crtc,
    gamma_size: usize,
    /// First table read from the CRTC, written back verbatim whenever its
    /// 256-entry sample is requested
    captured: OnceCell<NativeTable>,
}

/// A CRTC gamma table at the driver's native size
#[derive(Debug, Clone, PartialEq, Eq)]
struct NativeTable {
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
    sampled: Ramp,
}

impl NativeTable {
    fn new(red: Vec<u16>, green: Vec<u16>, blue: Vec<u16>) -> Self {
        let sampled = Ramp::from_channels(sample_native(&red), sample_native(&green), sample_native(&blue));
        Self {
            red,
            green,
            blue,
            sampled,
        }
    }

    /// Native table for `ramp`: the captured one if `ramp` is its sample,
    /// a linear expansion otherwise
    fn for_ramp(captured: Option<&NativeTable>, ramp: &Ramp, size: usize) -> Self {
        match captured {
            Some(table) if &table.sampled == ramp && table.red.len() == size => table.clone(),
            _ => Self {
                red: expand_channel(ramp.red(), size),
                green: expand_channel(ramp.green(), size),
                blue: expand_channel(ramp.blue(), size),
                sampled: ramp.clone(),
            },
        }
    }
}

impl X11GammaDevice {
    /// Connect to `$DISPLAY` and pick the CRTC driving the primary output
    pub fn connect() -> Result<Self, GammaError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(unavailable("Failed to connect to X server"))?;
        let root = conn.setup().roots[screen_num].root;

        let version = conn
            .randr_query_version(randr::MIN_MAJOR, randr::MIN_MINOR)
            .map_err(unavailable("Failed to query RandR version"))?
            .reply()
            .map_err(unavailable("RandR extension not available"))?;
        if (version.major_version, version.minor_version) < (randr::MIN_MAJOR, randr::MIN_MINOR) {
            return Err(GammaError::DeviceUnavailable(format!(
                "RandR {}.{} is too old (need {}.{})",
                version.major_version, version.minor_version, randr::MIN_MAJOR, randr::MIN_MINOR
            )));
        }

        let crtc = find_display_crtc(&conn, root)?;
        let gamma_size = conn
            .randr_get_crtc_gamma_size(crtc)
            .map_err(unavailable("Failed to query gamma size"))?
            .reply()
            .map_err(unavailable("Failed to get reply for gamma size"))?
            .size as usize;
        if gamma_size < 2 {
            return Err(GammaError::DeviceUnavailable(format!(
                "CRTC {crtc} has no usable gamma table (size {gamma_size})"
            )));
        }

        info!(screen = screen_num, crtc, gamma_size, "Connected to display gamma table");
        Ok(Self {
            conn,
            crtc,
            gamma_size,
            captured: OnceCell::new(),
        })
    }
}

impl GammaDevice for X11GammaDevice {
    fn read(&self) -> Result<Ramp, GammaError> {
        let reply = self
            .conn
            .randr_get_crtc_gamma(self.crtc)
            .map_err(unavailable("Failed to request CRTC gamma"))?
            .reply()
            .map_err(unavailable("Failed to get reply for CRTC gamma"))?;

        for (name, channel) in [("red", &reply.red), ("green", &reply.green), ("blue", &reply.blue)] {
            if channel.len() != self.gamma_size {
                return Err(GammaError::DeviceUnavailable(format!(
                    "{name} gamma table has {} entries (expected {})",
                    channel.len(),
                    self.gamma_size
                )));
            }
        }

        let table = NativeTable::new(reply.red, reply.green, reply.blue);
        let ramp = table.sampled.clone();
        if self.captured.get().is_none() {
            debug!(gamma_size = self.gamma_size, "Captured native gamma table");
            let _ = self.captured.set(table);
        }
        Ok(ramp)
    }

    fn write(&self, ramp: &Ramp) -> Result<(), GammaError> {
        let table = NativeTable::for_ramp(self.captured.get(), ramp, self.gamma_size);

        self.conn
            .randr_set_crtc_gamma(self.crtc, &table.red, &table.green, &table.blue)
            .map_err(unavailable("Failed to send CRTC gamma"))?
            .check()
            .map_err(unavailable("X server rejected CRTC gamma"))?;
        debug!(crtc = self.crtc, top = ?ramp.entry(gamma::RAMP_SIZE - 1), "Applied gamma ramp");
        Ok(())
    }
}

/// Primary output's CRTC, else the first CRTC with an active mode
fn find_display_crtc(conn: &RustConnection, root: Window) -> Result<Crtc, GammaError> {
    let resources = conn
        .randr_get_screen_resources_current(root)
        .map_err(unavailable("Failed to query screen resources"))?
        .reply()
        .map_err(unavailable("Failed to get reply for screen resources"))?;

    let primary = conn
        .randr_get_output_primary(root)
        .map_err(unavailable("Failed to query primary output"))?
        .reply()
        .map_err(unavailable("Failed to get reply for primary output"))?
        .output;
    if primary != x11rb::NONE {
        let output = conn
            .randr_get_output_info(primary, resources.config_timestamp)
            .map_err(unavailable("Failed to query primary output info"))?
            .reply()
            .map_err(unavailable("Failed to get reply for primary output info"))?;
        if output.crtc != x11rb::NONE {
            debug!(output = primary, crtc = output.crtc, "Using primary output CRTC");
            return Ok(output.crtc);
        }
    }

    for &crtc in &resources.crtcs {
        let info = conn
            .randr_get_crtc_info(crtc, resources.config_timestamp)
            .map_err(unavailable("Failed to query CRTC info"))?
            .reply()
            .map_err(unavailable("Failed to get reply for CRTC info"))?;
        if info.mode != x11rb::NONE {
            debug!(crtc, "No primary output, using first active CRTC");
            return Ok(crtc);
        }
    }

    Err(GammaError::DeviceUnavailable("no active CRTC found".to_string()))
}

fn unavailable<E: std::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> GammaError {
    move |e| GammaError::DeviceUnavailable(format!("{what}: {e}"))
}

/// Nearest native entry for each of the 256 ramp positions
fn sample_native(native: &[u16]) -> Channel {
    let native_last = native.len() - 1;
    let ramp_last = gamma::RAMP_SIZE - 1;
    std::array::from_fn(|i| native[(i * native_last + ramp_last / 2) / ramp_last])
}

/// Linear interpolation of a 256-entry channel out to `size` entries
fn expand_channel(channel: &Channel, size: usize) -> Vec<u16> {
    let native_last = size - 1;
    let ramp_last = gamma::RAMP_SIZE - 1;
    (0..size)
        .map(|j| {
            let pos = j * ramp_last;
            let lo = pos / native_last;
            let frac = pos % native_last;
            if frac == 0 {
                return channel[lo];
            }
            let a = f64::from(channel[lo]);
            let b = f64::from(channel[lo + 1]);
            let t = frac as f64 / native_last as f64;
            (a + (b - a) * t).round() as u16
        })
        .collect()
}
