//! Brightness session state machine
//!
//! A session moves through `Uninitialized → Recovering (only after a crash)
//! → Active → Restoring → Terminated`. Every way out of `Active` ends in
//! [`BrightnessController::shutdown`], which writes the original ramp back
//! and releases the lock marker.

use tracing::{debug, error, info, warn};

use crate::constants::levels;
use crate::device::GammaDevice;
use crate::error::GammaError;
use crate::lock::LockGuard;
use crate::persistence::RampStore;
use crate::ramp::Ramp;

/// Where a session currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Recovering,
    Active,
    Restoring,
    Terminated,
}

/// Which ramp a recovery ended up writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    /// The backed-up original ramp
    Backup,
    /// The identity ramp, because the backup was missing, corrupt or rejected
    Identity,
}

/// Write whatever backup is on disk back to the display and drop the lock
///
/// Shared by startup crash recovery and the explicit `--restore` command.
/// The lock is released even when nothing could be written.
pub fn recover<D: GammaDevice>(
    device: &D,
    store: &RampStore,
    lock: &LockGuard,
) -> Result<RecoverySource, GammaError> {
    let outcome = apply_backup_or_identity(device, store);
    if let Err(e) = lock.release() {
        error!(error = %e, "Failed to remove stale lock marker");
    }
    outcome
}

fn apply_backup_or_identity<D: GammaDevice>(
    device: &D,
    store: &RampStore,
) -> Result<RecoverySource, GammaError> {
    match store.load() {
        Ok(backup) => match device.write(&backup) {
            Ok(()) => {
                info!(path = %store.path().display(), "Restored gamma ramp from backup");
                return Ok(RecoverySource::Backup);
            }
            Err(e) => {
                error!(error = %e, "Could not apply backup ramp, falling back to identity ramp");
            }
        },
        Err(e @ (GammaError::NoBackup(_) | GammaError::MalformedBackup(_))) => {
            warn!(error = %e, "No usable ramp backup, restoring identity ramp");
        }
        Err(e) => {
            error!(error = %e, "Failed to read ramp backup, restoring identity ramp");
        }
    }

    device.write(&Ramp::identity())?;
    info!("Restored identity gamma ramp");
    Ok(RecoverySource::Identity)
}

/// Owns the display's gamma state for one session
pub struct BrightnessController<D: GammaDevice> {
    device: D,
    lock: LockGuard,
    original: Ramp,
    level: u8,
    phase: SessionPhase,
    verify_writes: bool,
}

impl<D: GammaDevice> BrightnessController<D> {
    /// Recover from a crashed session if needed, then take over the display
    ///
    /// # Errors
    ///
    /// - [`GammaError::DeviceUnavailable`] if the live ramp cannot be read
    /// - [`GammaError::Lock`] if the lock marker cannot be created; the
    ///   display has not been touched by this session at that point
    pub fn start(
        device: D,
        store: RampStore,
        lock: LockGuard,
        verify_writes: bool,
    ) -> Result<Self, GammaError> {
        let mut phase = SessionPhase::Uninitialized;
        let mut unrecovered_backup = None;

        if lock.is_held() {
            phase = SessionPhase::Recovering;
            warn!(
                path = %lock.path().display(),
                previous_pid = ?lock.holder_pid(),
                "Found stale session lock, previous session did not restore the display"
            );
            match recover(&device, &store, &lock) {
                Ok(source) => info!(?source, "Recovered display from previous session"),
                Err(e) => {
                    error!(
                        error = %e,
                        "Crash recovery failed, display may stay dim (run with --restore to retry)"
                    );
                    // The live ramp is still the dimmed one
                    unrecovered_backup = store.load().ok();
                }
            }
        }
        debug!(?phase, "Entering active session");

        let live = device.read()?;
        let original = match unrecovered_backup {
            Some(backup) => {
                warn!(
                    live_top = ?live.entry(255),
                    backup_top = ?backup.entry(255),
                    "Keeping previous backup as the original ramp"
                );
                backup
            }
            None => {
                debug!(first_red = ?&live.red()[..5], "Captured original gamma ramp");
                if let Err(e) = store.save(&live) {
                    error!(error = %e, "Failed to back up original ramp, crash recovery will use identity ramp");
                }
                live
            }
        };

        lock.acquire()?;

        info!("Brightness session active");
        Ok(Self {
            device,
            lock,
            original,
            level: levels::FULL,
            phase: SessionPhase::Active,
            verify_writes,
        })
    }

    /// Currently selected level in percent
    pub fn level(&self) -> u8 {
        self.level
    }

    #[cfg(test)]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The ramp captured when the session started
    #[cfg(test)]
    pub fn original(&self) -> &Ramp {
        &self.original
    }

    #[cfg(test)]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Dim to `level` percent of the original ramp
    ///
    /// On a rejected write the previous selection is kept.
    pub fn set_level(&mut self, level: u8) -> Result<(), GammaError> {
        self.ensure_active()?;
        let scaled = self.original.scale(level)?;
        if let Err(e) = self.apply(&scaled) {
            warn!(
                level,
                current = self.level,
                error = %e,
                "Brightness level rejected, keeping current level"
            );
            return Err(e);
        }
        self.level = level;
        info!(level, "Set brightness");
        Ok(())
    }

    /// Put the unscaled original ramp back and select 100%
    pub fn restore_default(&mut self) -> Result<(), GammaError> {
        self.ensure_active()?;
        self.apply(&self.original)?;
        self.level = levels::FULL;
        info!("Restored default brightness");
        Ok(())
    }

    /// Restore the original ramp and release the lock
    ///
    /// Never fails and may be called any number of times; after the first
    /// call only the (idempotent) lock release runs again.
    pub fn shutdown(&mut self) {
        if self.phase == SessionPhase::Terminated {
            self.release_lock();
            return;
        }

        self.phase = SessionPhase::Restoring;
        info!("Restoring original gamma ramp");
        match self.device.write(&self.original) {
            Ok(()) => self.level = levels::FULL,
            Err(e) => error!(error = %e, "Failed to restore original gamma ramp"),
        }
        self.release_lock();
        self.phase = SessionPhase::Terminated;
        info!("Session cleanup complete");
    }

    fn release_lock(&self) {
        if let Err(e) = self.lock.release() {
            error!(error = %e, "Failed to release session lock");
        }
    }

    fn ensure_active(&self) -> Result<(), GammaError> {
        if self.phase == SessionPhase::Active {
            Ok(())
        } else {
            Err(GammaError::SessionEnded)
        }
    }

    fn apply(&self, ramp: &Ramp) -> Result<(), GammaError> {
        self.device.write(ramp)?;
        if self.verify_writes {
            self.verify(ramp);
        }
        Ok(())
    }

    /// Read the ramp back and report silent clamping by the driver
    fn verify(&self, requested: &Ramp) {
        match self.device.read() {
            Ok(live) if &live == requested => debug!("Gamma ramp applied as requested"),
            Ok(live) => warn!(
                requested_top = ?requested.entry(255),
                live_top = ?live.entry(255),
                "Driver altered the requested gamma ramp"
            ),
            Err(e) => warn!(error = %e, "Could not read back gamma ramp"),
        }
    }
}

impl<D: GammaDevice> Drop for BrightnessController<D> {
    fn drop(&mut self) {
        if self.phase != SessionPhase::Terminated {
            warn!("Session dropped without explicit shutdown");
            self.shutdown();
        }
    }
}
