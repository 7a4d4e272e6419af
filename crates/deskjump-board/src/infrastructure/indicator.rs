//! Status indicators and diagnostics output.
//!
//! Real boards blink an RGB LED; this build writes log lines through
//! the same trait seam so the application layer stays identical.

use deskjump_core::DeviceState;
use tracing::{debug, info};

use crate::application::actions::Indicator;

/// Trait for the periodic diagnostics dump the device loop produces
/// while debug mode is on.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, state: &DeviceState);
}

/// [`Indicator`] backed by the log.
#[derive(Default)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn output_changed(&self, board: deskjump_core::Board) {
        info!(?board, "active output indicator");
    }

    fn debug_changed(&self, enabled: bool) {
        info!(enabled, "debug indicator");
    }
}

/// [`DiagnosticSink`] backed by the log.
#[derive(Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn emit(&self, state: &DeviceState) {
        debug!(
            active_output = ?state.active_output(),
            connected = state.connected(),
            idle_ms = state.last_activity_age().as_millis() as u64,
            host_liveness_ms = state.host_liveness_age().as_millis() as u64,
            "board diagnostics"
        );
    }
}
