//! ActionDispatcher: executes hotkey actions and output-change effects.
//!
//! Actions arrive from two directions: the local hotkey matcher (the
//! user typed a combo on this board's keyboard) and the link dispatcher
//! (the peer asked this board to do something). The two entry points
//! are deliberately separate methods: the `run` path announces the
//! effect to the peer, the `apply_*`/`*_local` path does not, which is
//! what keeps two boards from ping-ponging announcements at each other.

use std::sync::Arc;

use deskjump_core::domain::report::BitmapKeyboardReport;
use deskjump_core::domain::state::OsKind;
use deskjump_core::keymap::hid::{consumer, modifier, HidKey};
use deskjump_core::protocol::packet::{MessageType, Packet};
use deskjump_core::{Board, DeviceState, HotkeyAction};
use tracing::{info, warn};

use crate::application::route_input::{
    DeviceOutput, HidInterface, LinkTransmitter, RouteError, REPORT_ID_CONSUMER,
    REPORT_ID_KEYBOARD,
};

// ── Indicator port ────────────────────────────────────────────────────────────

/// Trait for user-visible status signalling (LEDs on real hardware).
///
/// Infrastructure implementations drive an LED or a log line; test
/// implementations record calls.
pub trait Indicator: Send + Sync {
    /// The active output moved to `board`.
    fn output_changed(&self, board: Board);

    /// Verbose diagnostics were switched on or off.
    fn debug_changed(&self, enabled: bool);
}

// ── ActionDispatcher ──────────────────────────────────────────────────────────

/// Executes [`HotkeyAction`]s against the shared state, the local device
/// port, and the link.
pub struct ActionDispatcher {
    state: Arc<DeviceState>,
    link: Arc<dyn LinkTransmitter>,
    device: Arc<dyn DeviceOutput>,
    indicator: Arc<dyn Indicator>,
}

impl ActionDispatcher {
    pub fn new(
        state: Arc<DeviceState>,
        link: Arc<dyn LinkTransmitter>,
        device: Arc<dyn DeviceOutput>,
        indicator: Arc<dyn Indicator>,
    ) -> Self {
        Self {
            state,
            link,
            device,
            indicator,
        }
    }

    /// Runs an action triggered locally. Effects that concern the peer
    /// are announced over the link.
    pub async fn run(&self, action: HotkeyAction) -> Result<(), RouteError> {
        match action {
            HotkeyAction::ToggleOutput => self.toggle_output().await,
            HotkeyAction::LockScreen => self.lock_screen().await,
            HotkeyAction::SuspendHost => self.suspend_host().await,
            HotkeyAction::EnableDebug => {
                self.apply_debug(true);
                self.link
                    .send(Packet::value(MessageType::EnableDebug, 1))
                    .await
                    .map_err(RouteError::Link)
            }
            HotkeyAction::RequestReboot => {
                // The board that owns the output reboots itself; an
                // inactive board hands the request to the owner instead.
                if self.state.is_active() {
                    self.apply_reboot();
                    Ok(())
                } else {
                    self.link
                        .send(Packet::empty(MessageType::RequestReboot))
                        .await
                        .map_err(RouteError::Link)
                }
            }
        }
    }

    // ── Output ownership ──────────────────────────────────────────────────────

    /// Flips the active output and announces the new owner to the peer.
    pub async fn toggle_output(&self) -> Result<(), RouteError> {
        let owner = self.state.toggle_output();
        info!(?owner, "active output toggled");
        self.on_output_changed(owner).await;
        self.link
            .send(Packet::value(MessageType::OutputSelect, owner.index()))
            .await
            .map_err(RouteError::Link)
    }

    /// Applies an OutputSelect announcement from the peer. No
    /// re-announcement: the peer already owns this change.
    pub async fn apply_output_select(&self, owner: Board) {
        let previous = self.state.active_output();
        self.state.set_active_output(owner);
        if previous != owner {
            info!(?owner, "active output set by peer");
            self.on_output_changed(owner).await;
        }
    }

    /// Local side effects of an output change, shared by both paths:
    /// indicator, stuck-key flush, and wakeup of a suspended host that
    /// just became the target.
    async fn on_output_changed(&self, owner: Board) {
        self.indicator.output_changed(owner);
        self.release_local_keys().await;
        if owner == self.state.role() && !self.device.is_ready() {
            if let Err(err) = self.device.remote_wakeup().await {
                warn!(%err, "remote wakeup failed");
            }
        }
    }

    /// Sends an all-released keyboard report to the local host so no
    /// key stays logically held across an output switch.
    async fn release_local_keys(&self) {
        if !self.device.is_ready() {
            return;
        }
        let empty = BitmapKeyboardReport::empty();
        if let Err(err) = self
            .device
            .emit_report(HidInterface::Keyboard, REPORT_ID_KEYBOARD, &empty.as_bytes())
            .await
        {
            warn!(%err, "key release flush failed");
        }
    }

    // ── Lock screen ───────────────────────────────────────────────────────────

    /// Locks both hosts at once: emits the local chord and announces the
    /// action so the peer emits its own.
    pub async fn lock_screen(&self) -> Result<(), RouteError> {
        self.link
            .send(Packet::value(MessageType::LockScreen, 1))
            .await
            .map_err(RouteError::Link)?;
        self.lock_local().await
    }

    /// Emits the OS-specific lock chord to this board's own host.
    pub async fn lock_local(&self) -> Result<(), RouteError> {
        let os = self.state.config().local_os();
        info!(?os, "emitting lock-screen chord");
        match os {
            OsKind::MacOs => {
                self.press_and_release(modifier::LEFT_CTRL | modifier::LEFT_GUI, HidKey::Q)
                    .await
            }
            OsKind::Linux | OsKind::Windows => {
                self.press_and_release(modifier::LEFT_GUI, HidKey::L).await
            }
            OsKind::Undefined => {
                warn!("host OS not configured; lock chord skipped");
                Ok(())
            }
        }
    }

    // ── Suspend ───────────────────────────────────────────────────────────────

    /// Suspends the computer behind whichever board owns the output.
    pub async fn suspend_host(&self) -> Result<(), RouteError> {
        if self.state.is_active() {
            self.suspend_local().await
        } else {
            self.link
                .send(Packet::empty(MessageType::SuspendHost))
                .await
                .map_err(RouteError::Link)
        }
    }

    /// Emits the OS-specific suspend gesture to this board's own host.
    ///
    /// The macOS sequence fails the output over to board A before the
    /// chord (a sleeping macOS host must not keep receiving reports) and
    /// marks the device link gone once the gesture is out, since the
    /// host stops servicing the interface without an unmount event.
    pub async fn suspend_local(&self) -> Result<(), RouteError> {
        let os = self.state.config().local_os();
        info!(?os, "emitting suspend gesture");
        match os {
            OsKind::MacOs => {
                self.switch_output_to_a().await?;
                if !self.device.is_ready() {
                    return Err(RouteError::DeviceNotReady);
                }
                // Hold Option+Cmd, tap the consumer Eject usage, then
                // release everything.
                let mut chord = BitmapKeyboardReport::empty();
                chord.modifier = modifier::LEFT_ALT | modifier::LEFT_GUI;
                self.device
                    .emit_report(HidInterface::Keyboard, REPORT_ID_KEYBOARD, &chord.as_bytes())
                    .await
                    .map_err(RouteError::Device)?;

                let eject = consumer::EJECT.to_le_bytes();
                self.device
                    .emit_report(HidInterface::Consumer, REPORT_ID_CONSUMER, &eject)
                    .await
                    .map_err(RouteError::Device)?;
                self.device
                    .emit_report(HidInterface::Consumer, REPORT_ID_CONSUMER, &[0, 0])
                    .await
                    .map_err(RouteError::Device)?;

                self.release_local_keys().await;
                self.state.set_connected(false);
                Ok(())
            }
            OsKind::Linux | OsKind::Windows => {
                self.press_and_release(
                    modifier::LEFT_CTRL | modifier::LEFT_SHIFT | modifier::LEFT_GUI,
                    HidKey::Q,
                )
                .await
            }
            OsKind::Undefined => {
                warn!("host OS not configured; suspend gesture skipped");
                Ok(())
            }
        }
    }

    /// Moves the output to board A unconditionally and announces it.
    /// This is the failover path taken before suspending a macOS host.
    async fn switch_output_to_a(&self) -> Result<(), RouteError> {
        let previous = self.state.active_output();
        self.state.set_active_output(Board::A);
        if previous != Board::A {
            info!("output failed over to board A");
            self.on_output_changed(Board::A).await;
        }
        self.link
            .send(Packet::value(MessageType::OutputSelect, Board::A.index()))
            .await
            .map_err(RouteError::Link)
    }

    // ── Debug / reboot ────────────────────────────────────────────────────────

    /// Flips the diagnostics flag without announcing to the peer.
    pub fn apply_debug(&self, enabled: bool) {
        self.state.set_debug_enabled(enabled);
        self.indicator.debug_changed(enabled);
    }

    /// Arms the reboot path: the health monitor stops refreshing the
    /// watchdog and the board resets when it expires.
    pub fn apply_reboot(&self) {
        warn!("reboot requested; watchdog refresh withheld from now on");
        self.state.request_reboot();
    }

    // ── Chord helper ──────────────────────────────────────────────────────────

    async fn press_and_release(&self, modifiers: u8, key: HidKey) -> Result<(), RouteError> {
        if !self.device.is_ready() {
            return Err(RouteError::DeviceNotReady);
        }
        let mut chord = BitmapKeyboardReport::empty();
        chord.modifier = modifiers;
        chord.set_key(key.code());
        self.device
            .emit_report(HidInterface::Keyboard, REPORT_ID_KEYBOARD, &chord.as_bytes())
            .await
            .map_err(RouteError::Device)?;

        let empty = BitmapKeyboardReport::empty();
        self.device
            .emit_report(HidInterface::Keyboard, REPORT_ID_KEYBOARD, &empty.as_bytes())
            .await
            .map_err(RouteError::Device)?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
