//! Shared device state.
//!
//! One [`DeviceState`] exists per board and is shared by every task:
//! the link receive loop, the local input loop, and the health monitor
//! all read and write it concurrently. Every mutable field is a single
//! atomic and every operation is a single load, store, or RMW, so the
//! state needs no lock and can never deadlock a task. There are no
//! multi-field invariants to protect; each field is independently
//! meaningful and last-writer-wins is the intended semantics.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

// ── Board identity ────────────────────────────────────────────────────────────

/// Which of the two boards, also the wire encoding of "active output".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Board {
    A = 0,
    B = 1,
}

impl Board {
    /// Wire/index form, `0` or `1`.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Decodes a wire byte; anything nonzero selects board B, matching
    /// the forgiving decode the link has always used.
    pub const fn from_index(value: u8) -> Board {
        if value == 0 {
            Board::A
        } else {
            Board::B
        }
    }

    /// The opposite board.
    pub const fn other(self) -> Board {
        match self {
            Board::A => Board::B,
            Board::B => Board::A,
        }
    }
}

// ── Host operating system ─────────────────────────────────────────────────────

/// Operating system attached to a board's device port. Selects which
/// key chords implement "lock screen" and "suspend host"; on a board
/// left `Undefined` the chord actions do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Undefined,
    Linux,
    MacOs,
    Windows,
}

// ── Static per-board configuration ────────────────────────────────────────────

/// Immutable facts about this board, fixed at startup from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Which board this process is.
    pub role: Board,
    /// OS attached to board A's device port.
    pub os_a: OsKind,
    /// OS attached to board B's device port.
    pub os_b: OsKind,
}

impl BoardConfig {
    pub const fn os_for(&self, board: Board) -> OsKind {
        match board {
            Board::A => self.os_a,
            Board::B => self.os_b,
        }
    }

    /// OS of the host attached to this board.
    pub const fn local_os(&self) -> OsKind {
        self.os_for(self.role)
    }
}

// ── Shared mutable state ──────────────────────────────────────────────────────

/// All cross-task mutable state of one board.
#[derive(Debug)]
pub struct DeviceState {
    config: BoardConfig,
    /// Index of the board that currently owns the output, 0 or 1.
    active_output: AtomicU8,
    /// Whether the device-mode link to this board's own computer is
    /// mounted and not suspended. Driven by lifecycle notifications.
    connected: AtomicBool,
    /// Set once a reboot was requested; the health monitor then stops
    /// refreshing the watchdog and lets it fire.
    reboot_requested: AtomicBool,
    /// Verbose diagnostics toggle, flipped at runtime by hotkey.
    debug_enabled: AtomicBool,
    /// Microseconds since `epoch` of the last user input seen anywhere.
    last_activity_us: AtomicU64,
    /// Microseconds since `epoch` of the last proof the local host is
    /// still servicing us (report consumed, lifecycle event, ...).
    host_liveness_us: AtomicU64,
    /// Time zero for the two timestamps above.
    epoch: Instant,
}

impl DeviceState {
    /// Fresh state: board A active, device link not yet mounted, both
    /// timestamps stamped "now" so ages start at zero.
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config,
            active_output: AtomicU8::new(Board::A.index()),
            connected: AtomicBool::new(false),
            reboot_requested: AtomicBool::new(false),
            debug_enabled: AtomicBool::new(false),
            last_activity_us: AtomicU64::new(0),
            host_liveness_us: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn role(&self) -> Board {
        self.config.role
    }

    // ── Active output ─────────────────────────────────────────────────────────

    pub fn active_output(&self) -> Board {
        Board::from_index(self.active_output.load(Ordering::SeqCst))
    }

    pub fn set_active_output(&self, board: Board) {
        self.active_output.store(board.index(), Ordering::SeqCst);
    }

    /// Atomically flips the active output and returns the new owner.
    /// A single RMW, so two racing toggles net out to no change rather
    /// than ever losing one.
    pub fn toggle_output(&self) -> Board {
        let previous = self.active_output.fetch_xor(1, Ordering::SeqCst);
        Board::from_index(previous ^ 1)
    }

    /// Whether this board currently owns the output.
    pub fn is_active(&self) -> bool {
        self.active_output() == self.config.role
    }

    // ── Device connectivity ───────────────────────────────────────────────────

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    // ── Reboot / debug flags ──────────────────────────────────────────────────

    pub fn request_reboot(&self) {
        self.reboot_requested.store(true, Ordering::SeqCst);
    }

    pub fn reboot_requested(&self) -> bool {
        self.reboot_requested.load(Ordering::SeqCst)
    }

    pub fn set_debug_enabled(&self, enabled: bool) {
        self.debug_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled.load(Ordering::SeqCst)
    }

    // ── Timestamps ────────────────────────────────────────────────────────────

    fn now_us(&self) -> u64 {
        // 2^64 microseconds is ~584k years of uptime; truncation is fine.
        self.epoch.elapsed().as_micros() as u64
    }

    /// Records that user input was just seen (either board).
    pub fn touch_activity(&self) {
        self.last_activity_us.store(self.now_us(), Ordering::SeqCst);
    }

    pub fn last_activity_age(&self) -> Duration {
        let stamped = self.last_activity_us.load(Ordering::SeqCst);
        Duration::from_micros(self.now_us().saturating_sub(stamped))
    }

    /// Records proof that the local host is still responsive.
    pub fn stamp_host_liveness(&self) {
        self.host_liveness_us.store(self.now_us(), Ordering::SeqCst);
    }

    pub fn host_liveness_age(&self) -> Duration {
        let stamped = self.host_liveness_us.load(Ordering::SeqCst);
        Duration::from_micros(self.now_us().saturating_sub(stamped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(role: Board) -> DeviceState {
        DeviceState::new(BoardConfig {
            role,
            os_a: OsKind::Linux,
            os_b: OsKind::MacOs,
        })
    }

    #[test]
    fn test_initial_state() {
        let s = state(Board::A);
        assert_eq!(s.active_output(), Board::A);
        assert!(s.is_active());
        assert!(!s.connected());
        assert!(!s.reboot_requested());
        assert!(!s.debug_enabled());
    }

    #[test]
    fn test_toggle_flips_and_reports_new_owner() {
        let s = state(Board::A);
        assert_eq!(s.toggle_output(), Board::B);
        assert!(!s.is_active());
        assert_eq!(s.toggle_output(), Board::A);
        assert!(s.is_active());
    }

    #[test]
    fn test_is_active_tracks_role() {
        let s = state(Board::B);
        assert!(!s.is_active(), "board A owns output at startup");
        s.set_active_output(Board::B);
        assert!(s.is_active());
    }

    #[test]
    fn test_board_from_index_is_forgiving() {
        assert_eq!(Board::from_index(0), Board::A);
        assert_eq!(Board::from_index(1), Board::B);
        assert_eq!(Board::from_index(0xFF), Board::B);
    }

    #[test]
    fn test_os_lookup_per_board() {
        let s = state(Board::A);
        assert_eq!(s.config().os_for(Board::A), OsKind::Linux);
        assert_eq!(s.config().os_for(Board::B), OsKind::MacOs);
        assert_eq!(s.config().local_os(), OsKind::Linux);
    }

    #[test]
    fn test_liveness_stamp_resets_age() {
        let s = state(Board::A);
        std::thread::sleep(Duration::from_millis(5));
        let before = s.host_liveness_age();
        s.stamp_host_liveness();
        assert!(s.host_liveness_age() < before);
    }
}
