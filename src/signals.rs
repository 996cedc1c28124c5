use anyhow::{Context, Result};
use nix::sys::signal::Signal;
use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use std::thread;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::event_handler::SessionEvent;

/// Signals that end a session (and must restore the display first)
pub const TERMINATION_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

/// `SIGTERM`-style name for logging
pub fn signal_name(signal: i32) -> &'static str {
    Signal::try_from(signal).map(Signal::as_str).unwrap_or("unknown")
}

/// Spawn a background thread forwarding termination signals to the session loop
pub fn spawn_listener(sender: UnboundedSender<SessionEvent>) -> Result<thread::JoinHandle<()>> {
    let mut signals = Signals::new(TERMINATION_SIGNALS)
        .context("Failed to register termination signal handlers")?;

    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            info!(signals = ?TERMINATION_SIGNALS.map(signal_name), "Signal listener started");
            for signal in signals.forever() {
                warn!(signal = signal_name(signal), "Received termination signal");
                if sender.send(SessionEvent::Signal(signal)).is_err() {
                    debug!("Session loop already finished, stopping signal listener");
                    break;
                }
            }
        })
        .context("Failed to spawn signal listener thread")
}
