//! The interactive dimming session: tray, signals and the controller
//! wired together around one event channel

use anyhow::{Context, Result};
use ksni::TrayMethods;
use std::ops::ControlFlow;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{Settings, StatePaths};
use crate::controller::BrightnessController;
use crate::device::X11GammaDevice;
use crate::event_handler::{SessionEvent, handle_event};
use crate::lock::LockGuard;
use crate::persistence::RampStore;
use crate::tray::BrightnessTray;

pub async fn run(paths: StatePaths, settings: Settings) -> Result<()> {
    let device = X11GammaDevice::connect().context("Failed to open the display's gamma ramp")?;

    let mut controller = BrightnessController::start(
        device,
        RampStore::new(paths.backup.clone()),
        LockGuard::new(paths.lock.clone()),
        settings.verify_writes,
    )
    .with_context(|| {
        format!(
            "Refusing to dim the display without crash protection (state in {:?})",
            paths.lock.parent().unwrap_or(&paths.lock)
        )
    })?;

    let (tx, mut rx) = mpsc::unbounded_channel::<SessionEvent>();

    #[cfg(unix)]
    let _signal_listener = crate::signals::spawn_listener(tx.clone())?;

    let tray = BrightnessTray::new(controller.level(), settings.min_level, tx.clone());
    let tray_handle = match tray.spawn().await {
        Ok(handle) => {
            info!("Tray icon registered");
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "No system tray available, running headless until signalled");
            None
        }
    };
    drop(tx);

    while let Some(event) = rx.recv().await {
        info!(?event, "Session event");
        let flow = handle_event(&mut controller, event);

        if let Some(handle) = &tray_handle {
            let level = controller.level();
            handle.update(move |tray: &mut BrightnessTray| tray.set_level(level)).await;
        }

        if let ControlFlow::Break(()) = flow {
            break;
        }
    }

    controller.shutdown();
    if let Some(handle) = tray_handle {
        handle.shutdown().await;
    }
    info!("Session ended");
    Ok(())
}
