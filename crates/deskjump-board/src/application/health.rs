//! HealthMonitor: watchdog refresh policy.
//!
//! The watchdog is the last line of defence: if it is not refreshed
//! within its timeout the board resets. The monitor refreshes it on
//! every device-loop tick, with two deliberate exceptions:
//!
//! - a reboot was requested (locally or by the peer): refresh stops and
//!   the watchdog firing *is* the reboot mechanism;
//! - the host loop has not stamped its liveness marker recently: the
//!   other half of the firmware is wedged, and a reset is the only way
//!   back to a working switch.

use std::sync::Arc;
use std::time::Duration;

use deskjump_core::DeviceState;
use tracing::{debug, warn};

/// Hardware watchdog timeout carried over from the original boards.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(500);

/// How stale the host loop's liveness stamp may get before refreshes
/// are withheld.
pub const DEFAULT_HOST_BUDGET: Duration = Duration::from_secs(2);

/// Trait for the reset watchdog. The infrastructure implementation arms
/// a timer that kills the process on expiry.
#[cfg_attr(test, mockall::automock)]
pub trait Watchdog: Send + Sync {
    /// Pushes the expiry deadline out by the full timeout.
    fn refresh(&self);
}

/// Decides, once per device-loop tick, whether the watchdog gets fed.
pub struct HealthMonitor {
    state: Arc<DeviceState>,
    watchdog: Arc<dyn Watchdog>,
    host_budget: Duration,
}

impl HealthMonitor {
    pub fn new(state: Arc<DeviceState>, watchdog: Arc<dyn Watchdog>, host_budget: Duration) -> Self {
        Self {
            state,
            watchdog,
            host_budget,
        }
    }

    /// One health pass. Withholding the refresh here is intentional;
    /// the watchdog firing afterwards is the designed reset path.
    pub fn tick(&self) {
        if self.state.reboot_requested() {
            debug!("reboot armed; watchdog refresh withheld");
            return;
        }
        let age = self.state.host_liveness_age();
        if age > self.host_budget {
            warn!(age_ms = age.as_millis() as u64, "host loop stalled; watchdog refresh withheld");
            return;
        }
        self.watchdog.refresh();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use deskjump_core::{Board, BoardConfig, OsKind};

    fn state() -> Arc<DeviceState> {
        Arc::new(DeviceState::new(BoardConfig {
            role: Board::A,
            os_a: OsKind::Linux,
            os_b: OsKind::Linux,
        }))
    }

    #[test]
    fn test_tick_refreshes_while_healthy() {
        // Arrange
        let state = state();
        state.stamp_host_liveness();
        let mut watchdog = MockWatchdog::new();
        watchdog.expect_refresh().times(1).return_const(());

        // Act
        let monitor = HealthMonitor::new(state, Arc::new(watchdog), DEFAULT_HOST_BUDGET);
        monitor.tick();
    }

    #[test]
    fn test_tick_withholds_refresh_after_reboot_request() {
        let state = state();
        state.stamp_host_liveness();
        state.request_reboot();
        let mut watchdog = MockWatchdog::new();
        watchdog.expect_refresh().times(0);

        let monitor = HealthMonitor::new(state, Arc::new(watchdog), DEFAULT_HOST_BUDGET);
        monitor.tick();
    }

    #[test]
    fn test_tick_withholds_refresh_when_host_loop_stalls() {
        let state = state();
        let mut watchdog = MockWatchdog::new();
        watchdog.expect_refresh().times(0);

        // A zero budget makes any elapsed time count as a stall.
        let monitor = HealthMonitor::new(
            Arc::clone(&state),
            Arc::new(watchdog),
            Duration::from_secs(0),
        );
        std::thread::sleep(Duration::from_millis(2));
        monitor.tick();
    }

    #[test]
    fn test_fresh_stamp_restores_refreshing() {
        let state = state();
        let mut watchdog = MockWatchdog::new();
        watchdog.expect_refresh().times(1).return_const(());

        let monitor = HealthMonitor::new(
            Arc::clone(&state),
            Arc::new(watchdog),
            Duration::from_millis(50),
        );
        state.stamp_host_liveness();
        monitor.tick();
    }
}
