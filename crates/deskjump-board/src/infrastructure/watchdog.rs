//! Software watchdog.
//!
//! Real boards carry a hardware watchdog that resets the chip when the
//! firmware stops feeding it. The software rendition keeps the same
//! contract: [`SoftwareWatchdog::refresh`] pushes a deadline out, and a
//! supervisor task ends the process when the deadline passes. Process
//! exit stands in for the chip reset; a service manager restarts the
//! board the way power-on restarts the chip.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::error;

use crate::application::health::Watchdog;

/// Watchdog with an explicit deadline, refreshed by the health monitor.
pub struct SoftwareWatchdog {
    timeout: Duration,
    deadline: Mutex<Instant>,
}

impl SoftwareWatchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: Mutex::new(Instant::now() + timeout),
        }
    }

    /// Whether the deadline has passed without a refresh.
    pub fn expired(&self) -> bool {
        match self.deadline.lock() {
            Ok(deadline) => Instant::now() >= *deadline,
            // A poisoned deadline means a panicked refresher; treat the
            // watchdog as expired and let the supervisor act.
            Err(_) => true,
        }
    }
}

impl Watchdog for SoftwareWatchdog {
    fn refresh(&self) {
        if let Ok(mut deadline) = self.deadline.lock() {
            *deadline = Instant::now() + self.timeout;
        }
    }
}

/// Spawns the supervisor that enforces expiry. Only the binary runs
/// this; tests exercise [`SoftwareWatchdog::expired`] directly.
pub fn spawn_supervisor(watchdog: Arc<SoftwareWatchdog>, running: Arc<AtomicBool>) -> JoinHandle<()> {
    const CHECK_EVERY: Duration = Duration::from_millis(50);

    tokio::spawn(async move {
        let mut tick = tokio::time::interval(CHECK_EVERY);
        loop {
            tick.tick().await;
            if !running.load(Ordering::Relaxed) {
                return;
            }
            if watchdog.expired() {
                error!("watchdog expired; resetting board process");
                std::process::exit(1);
            }
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
