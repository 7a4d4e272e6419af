//! The two long-running tasks every board spawns.
//!
//! The original hardware runs two cooperative polling loops, one per
//! CPU core: a host-side loop (physical peripherals + link RX) and a
//! device-side loop (emulated device bookkeeping + watchdog). Here they
//! are two tokio tasks with the same division of labour, stopped by a
//! shared [`AtomicBool`] the way the rest of the services shut down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskjump_core::protocol::packet::Packet;
use deskjump_core::DeviceState;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use crate::application::health::HealthMonitor;
use crate::application::link_dispatch::LinkDispatcher;
use crate::application::route_input::InputRouter;
use crate::infrastructure::indicator::DiagnosticSink;
use crate::infrastructure::usb::InputEvent;

/// Poll granularity of both loops when nothing else wakes them.
pub const LOOP_TICK: Duration = Duration::from_millis(100);

/// Trait for the host-mode stack: the stream of events from the
/// physical keyboard/mouse attached to this board.
#[async_trait]
pub trait HostInputSource: Send {
    /// Next captured event; `None` when the source is gone for good.
    async fn next_event(&mut self) -> Option<InputEvent>;
}

/// Host-side loop: drains link RX and local input until shutdown.
///
/// Every pass stamps the host-liveness marker; the health monitor in
/// [`device_loop`] withholds watchdog refreshes when those stamps stop.
pub async fn host_loop(
    state: Arc<DeviceState>,
    router: Arc<InputRouter>,
    dispatcher: Arc<LinkDispatcher>,
    mut link_rx: mpsc::UnboundedReceiver<Packet>,
    mut input: Box<dyn HostInputSource>,
    running: Arc<AtomicBool>,
) {
    let mut tick = tokio::time::interval(LOOP_TICK);
    while running.load(Ordering::Relaxed) {
        state.stamp_host_liveness();
        tokio::select! {
            maybe_packet = link_rx.recv() => match maybe_packet {
                Some(packet) => dispatcher.dispatch(packet).await,
                None => {
                    warn!("link receive channel closed; peer considered gone");
                    break;
                }
            },
            maybe_event = input.next_event() => match maybe_event {
                Some(event) => {
                    if let Err(err) = router.handle_event(event).await {
                        warn!(%err, "input routing failed");
                    }
                }
                None => {
                    info!("host input source ended");
                    break;
                }
            },
            _ = tick.tick() => {}
        }
    }
    info!("host loop stopped");
}

/// Device-side loop: health/watchdog bookkeeping once per tick, plus
/// the periodic diagnostic dump while debug is enabled.
pub async fn device_loop(
    state: Arc<DeviceState>,
    health: HealthMonitor,
    diagnostics: Arc<dyn DiagnosticSink>,
    running: Arc<AtomicBool>,
) {
    // Dump diagnostics roughly once a second at the default tick rate.
    const DIAG_EVERY: u32 = 10;

    let mut tick = tokio::time::interval(LOOP_TICK);
    let mut passes: u32 = 0;
    while running.load(Ordering::Relaxed) {
        tick.tick().await;
        health.tick();

        passes = passes.wrapping_add(1);
        if state.debug_enabled() && passes % DIAG_EVERY == 0 {
            diagnostics.emit(&state);
        } else {
            trace!(
                idle_ms = state.last_activity_age().as_millis() as u64,
                "device loop pass"
            );
        }
    }
    info!("device loop stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
