use std::ops::ControlFlow;
use tracing::{error, info, warn};

use crate::controller::BrightnessController;
use crate::device::GammaDevice;

/// Everything that can happen to a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tray level item picked
    SetLevel(u8),
    /// Tray "Restore Default"
    RestoreDefault,
    /// Tray "Exit"
    Exit,
    /// Termination signal delivered to the process
    Signal(i32),
}

/// Apply one event to the controller
///
/// Exit and signal events run the restore routine before breaking out of
/// the session loop.
pub fn handle_event<D: GammaDevice>(
    controller: &mut BrightnessController<D>,
    event: SessionEvent,
) -> ControlFlow<()> {
    match event {
        SessionEvent::SetLevel(level) => {
            if let Err(e) = controller.set_level(level) {
                error!(level, error = %e, "Failed to set brightness");
            }
            ControlFlow::Continue(())
        }
        SessionEvent::RestoreDefault => {
            if let Err(e) = controller.restore_default() {
                error!(error = %e, "Failed to restore default brightness");
            }
            ControlFlow::Continue(())
        }
        SessionEvent::Exit => {
            info!("User exiting via tray menu");
            controller.shutdown();
            ControlFlow::Break(())
        }
        SessionEvent::Signal(signal) => {
            warn!(signal, "Termination signal, restoring gamma and exiting");
            controller.shutdown();
            ControlFlow::Break(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SessionPhase;
    use crate::device::mock::MockDevice;
    use crate::lock::LockGuard;
    use crate::persistence::RampStore;
    use crate::ramp::Ramp;
    use tempfile::TempDir;

    fn start_session(device: &MockDevice) -> (BrightnessController<&MockDevice>, LockGuard, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = RampStore::new(temp_dir.path().join("ramp-backup.json"));
        let lock = LockGuard::new(temp_dir.path().join("session.lock"));
        let controller = BrightnessController::start(device, store, lock.clone(), false).unwrap();
        (controller, lock, temp_dir)
    }

    #[test]
    fn test_level_events_continue() {
        let device = MockDevice::new(Ramp::identity());
        let (mut controller, _lock, _dir) = start_session(&device);

        assert!(handle_event(&mut controller, SessionEvent::SetLevel(70)).is_continue());
        assert_eq!(controller.level(), 70);
        assert_eq!(device.live(), Ramp::identity().scale(70).unwrap());

        assert!(handle_event(&mut controller, SessionEvent::RestoreDefault).is_continue());
        assert_eq!(controller.level(), 100);
        assert_eq!(device.live(), Ramp::identity());
    }

    #[test]
    fn test_failed_level_keeps_session_running() {
        let device = MockDevice::new(Ramp::identity());
        let (mut controller, lock, _dir) = start_session(&device);

        assert!(handle_event(&mut controller, SessionEvent::SetLevel(0)).is_continue());
        assert_eq!(controller.phase(), SessionPhase::Active);
        assert!(lock.is_held());
    }

    #[test]
    fn test_exit_restores_and_breaks() {
        let device = MockDevice::new(Ramp::identity());
        let (mut controller, lock, _dir) = start_session(&device);
        handle_event(&mut controller, SessionEvent::SetLevel(20));

        assert!(handle_event(&mut controller, SessionEvent::Exit).is_break());
        assert_eq!(device.live(), Ramp::identity());
        assert!(!lock.is_held());
        assert_eq!(controller.phase(), SessionPhase::Terminated);
    }

    #[test]
    fn test_signal_after_exit_is_harmless() {
        let device = MockDevice::new(Ramp::identity());
        let (mut controller, lock, _dir) = start_session(&device);
        handle_event(&mut controller, SessionEvent::SetLevel(40));

        assert!(handle_event(&mut controller, SessionEvent::Exit).is_break());
        assert!(handle_event(&mut controller, SessionEvent::Signal(15)).is_break());
        assert!(!lock.is_held());
        assert_eq!(device.writes().len(), 2);
    }
}
