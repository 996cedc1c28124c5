//! Boundary to the display device's gamma lookup table
//!
//! The controller only ever talks to a [`GammaDevice`]. The X11 RandR
//! implementation drives the real hardware; tests use the in-memory mock.

#[cfg(test)]
pub mod mock;
mod x11;

pub use x11::X11GammaDevice;

use crate::error::GammaError;
use crate::ramp::Ramp;

/// Read and write the ramp of a single display
///
/// `write` means "the request was accepted", not "the ramp is now exactly
/// applied": drivers may clamp ramps that stray too far from identity
/// without reporting it.
pub trait GammaDevice {
    /// The ramp currently applied to the display
    fn read(&self) -> Result<Ramp, GammaError>;

    /// Ask the driver to apply `ramp`
    fn write(&self, ramp: &Ramp) -> Result<(), GammaError>;
}

impl<T: GammaDevice + ?Sized> GammaDevice for &T {
    fn read(&self) -> Result<Ramp, GammaError> {
        (**self).read()
    }

    fn write(&self, ramp: &Ramp) -> Result<(), GammaError> {
        (**self).write(ramp)
    }
}
