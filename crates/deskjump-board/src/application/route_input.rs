//! InputRouter: routes locally captured input to the right destination.
//!
//! This use case is the heart of the board application. It receives raw
//! HID reports from the host-mode stack, translates keyboard reports to
//! the internal bitmap form, checks the hotkey table, and then either
//! emits the report on the local device port (this board owns the
//! output) or forwards it over the inter-board link (the other board
//! does).
//!
//! # Architecture
//!
//! The router depends only on traits (`LinkTransmitter`, `DeviceOutput`)
//! and domain types from `deskjump-core`. All infrastructure
//! implementations are injected at construction time, making the use
//! case fully unit-testable.

use std::sync::Arc;

use async_trait::async_trait;
use deskjump_core::domain::hotkey::{find_match, HotkeyAction, HotkeyCombo};
use deskjump_core::domain::report::{mouse_middle_click, BitmapKeyboardReport, BootKeyboardReport};
use deskjump_core::protocol::packet::{MessageType, Packet, PACKET_DATA_LEN};
use deskjump_core::{default_hotkeys, DeviceState};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::actions::ActionDispatcher;
use crate::infrastructure::usb::{InputEvent, LifecycleEvent};

// ── HID interfaces and report ids ─────────────────────────────────────────────

/// Report id used on the keyboard interface.
pub const REPORT_ID_KEYBOARD: u8 = 1;
/// Report id used on the mouse interface.
pub const REPORT_ID_MOUSE: u8 = 2;
/// Report id used on the consumer-control interface.
pub const REPORT_ID_CONSUMER: u8 = 3;

/// The three logical HID endpoints both boards expose. The numeric
/// value is the `interface` byte on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HidInterface {
    Keyboard = 0,
    Mouse = 1,
    Consumer = 2,
}

impl HidInterface {
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(value: u8) -> Option<Self> {
        match value {
            0 => Some(HidInterface::Keyboard),
            1 => Some(HidInterface::Mouse),
            2 => Some(HidInterface::Consumer),
            _ => None,
        }
    }

    /// Link message type used when a report on this interface is
    /// forwarded to the peer.
    pub const fn message_type(self) -> MessageType {
        match self {
            HidInterface::Keyboard => MessageType::KeyboardReport,
            HidInterface::Mouse => MessageType::MouseReport,
            HidInterface::Consumer => MessageType::ConsumerControl,
        }
    }

    pub const fn report_id(self) -> u8 {
        match self {
            HidInterface::Keyboard => REPORT_ID_KEYBOARD,
            HidInterface::Mouse => REPORT_ID_MOUSE,
            HidInterface::Consumer => REPORT_ID_CONSUMER,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error type for routing and action dispatch.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("empty input report")]
    EmptyReport,
    #[error("report of {0} bytes exceeds the link data region")]
    OversizedReport(usize),
    #[error("device port not ready")]
    DeviceNotReady,
    #[error("device port error: {0}")]
    Device(String),
    #[error("link error: {0}")]
    Link(String),
}

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Trait for sending packets to the peer board.
///
/// The infrastructure implementation hands frames to the link writer
/// task; test implementations record calls.
#[async_trait]
pub trait LinkTransmitter: Send + Sync {
    /// Queues one packet for transmission. The frame is written as a
    /// single unit; there is no acknowledgement.
    async fn send(&self, packet: Packet) -> Result<(), String>;
}

/// Trait for the device-mode stack: the emulated keyboard/mouse this
/// board presents to its computer.
#[async_trait]
pub trait DeviceOutput: Send + Sync {
    /// Whether the host has enumerated the device and reports can be
    /// delivered right now.
    fn is_ready(&self) -> bool;

    /// Delivers one HID report to the host.
    async fn emit_report(
        &self,
        interface: HidInterface,
        report_id: u8,
        data: &[u8],
    ) -> Result<(), String>;

    /// Signals USB remote wakeup towards a suspended host.
    async fn remote_wakeup(&self) -> Result<(), String>;

    /// Notifies the stack of a bus lifecycle change. Default no-op for
    /// implementations that track readiness elsewhere.
    fn handle_lifecycle(&self, _event: LifecycleEvent) {}
}

// ── InputRouter ───────────────────────────────────────────────────────────────

/// The route-input use case.
///
/// One instance per board, shared by the host loop (local capture) and
/// the link dispatcher (forwarded reports from the peer).
pub struct InputRouter {
    state: Arc<DeviceState>,
    link: Arc<dyn LinkTransmitter>,
    device: Arc<dyn DeviceOutput>,
    actions: Arc<ActionDispatcher>,
    hotkeys: Vec<HotkeyCombo>,
}

impl InputRouter {
    pub fn new(
        state: Arc<DeviceState>,
        link: Arc<dyn LinkTransmitter>,
        device: Arc<dyn DeviceOutput>,
        actions: Arc<ActionDispatcher>,
    ) -> Self {
        Self {
            state,
            link,
            device,
            actions,
            hotkeys: default_hotkeys(),
        }
    }

    /// Replaces the hotkey table (tests and future config-driven combos).
    pub fn with_hotkeys(mut self, hotkeys: Vec<HotkeyCombo>) -> Self {
        self.hotkeys = hotkeys;
        self
    }

    /// Handles one event from the local host-mode stack.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the destination rejects the report;
    /// malformed reports are dropped with a log line, not an error, so
    /// one odd peripheral cannot take down the loop.
    pub async fn handle_event(&self, event: InputEvent) -> Result<(), RouteError> {
        match event {
            InputEvent::Keyboard(raw) => self.handle_keyboard(&raw).await,
            InputEvent::Mouse(raw) => self.handle_mouse(&raw).await,
            InputEvent::Consumer(raw) => self.handle_consumer(&raw).await,
            InputEvent::Lifecycle(lifecycle) => {
                self.handle_lifecycle(lifecycle);
                Ok(())
            }
        }
    }

    // ── Per-interface handlers ────────────────────────────────────────────────

    async fn handle_keyboard(&self, raw: &[u8]) -> Result<(), RouteError> {
        // Accept either shape: the 16-byte bitmap form some capture
        // backends already produce, or the 8-byte boot form physical
        // keyboards send. Anything shorter is dropped.
        let report = if raw.len() >= PACKET_DATA_LEN {
            match BitmapKeyboardReport::from_bytes(raw) {
                Some(r) => r,
                None => return Ok(()),
            }
        } else {
            match BootKeyboardReport::from_bytes(raw) {
                Some(boot) => BitmapKeyboardReport::from_boot(&boot),
                None => {
                    warn!(len = raw.len(), "dropping malformed keyboard report");
                    return Ok(());
                }
            }
        };

        self.state.touch_activity();

        // Hotkeys fire on the capture board, before routing, so a combo
        // works regardless of which output is active.
        if let Some(combo) = find_match(&report, &self.hotkeys) {
            let action = combo.action;
            let swallow = !combo.pass_to_os;
            debug!(?action, "hotkey matched");
            self.actions.run(action).await?;
            if swallow {
                return Ok(());
            }
        }

        self.route(HidInterface::Keyboard, &report.as_bytes()).await
    }

    async fn handle_mouse(&self, raw: &[u8]) -> Result<(), RouteError> {
        // A bare middle click is the mouse-side output toggle gesture
        // and is swallowed so neither host sees a paste-click.
        if mouse_middle_click(raw) {
            self.state.touch_activity();
            self.actions.run(HotkeyAction::ToggleOutput).await?;
            return Ok(());
        }

        self.route(HidInterface::Mouse, raw).await
    }

    async fn handle_consumer(&self, raw: &[u8]) -> Result<(), RouteError> {
        self.route(HidInterface::Consumer, raw).await
    }

    fn handle_lifecycle(&self, event: LifecycleEvent) {
        info!(?event, "device lifecycle event");
        self.device.handle_lifecycle(event);
        match event {
            LifecycleEvent::Mounted | LifecycleEvent::Resumed => {
                self.state.set_connected(true);
                self.state.stamp_host_liveness();
            }
            LifecycleEvent::Unmounted | LifecycleEvent::Suspended => {
                self.state.set_connected(false);
            }
        }
    }

    // ── Routing core ──────────────────────────────────────────────────────────

    /// Delivers a report either locally or over the link, depending on
    /// who owns the output.
    ///
    /// # Errors
    ///
    /// [`RouteError::EmptyReport`] / [`RouteError::OversizedReport`] for
    /// reports the link could never carry; [`RouteError::DeviceNotReady`]
    /// when this board owns the output but its host has not enumerated
    /// the device; transport errors otherwise.
    pub async fn route(&self, interface: HidInterface, data: &[u8]) -> Result<(), RouteError> {
        if data.is_empty() {
            return Err(RouteError::EmptyReport);
        }
        if data.len() > PACKET_DATA_LEN {
            return Err(RouteError::OversizedReport(data.len()));
        }

        // A report rejected above must leave no trace; only input that
        // actually goes somewhere counts as user activity.
        self.state.touch_activity();

        if self.state.is_active() {
            self.emit_local(interface, interface.report_id(), data).await
        } else {
            let packet = Packet::new(
                interface.message_type(),
                interface.index(),
                interface.report_id(),
                data,
            )
            .map_err(|e| RouteError::Link(e.to_string()))?;
            self.link.send(packet).await.map_err(RouteError::Link)
        }
    }

    /// Emits a report forwarded by the peer board. The sender already
    /// decided this board owns the output; no second ownership check
    /// happens here, so a report in flight across an output switch is
    /// delivered rather than lost.
    pub async fn inject_remote(&self, packet: &Packet) -> Result<(), RouteError> {
        let Some(interface) = HidInterface::from_index(packet.interface) else {
            warn!(interface = packet.interface, "forwarded report on unknown interface");
            return Ok(());
        };
        if packet.payload().is_empty() {
            return Err(RouteError::EmptyReport);
        }

        self.state.touch_activity();
        self.emit_local(interface, packet.report_id, packet.payload())
            .await
    }

    async fn emit_local(
        &self,
        interface: HidInterface,
        report_id: u8,
        data: &[u8],
    ) -> Result<(), RouteError> {
        if !self.device.is_ready() {
            return Err(RouteError::DeviceNotReady);
        }
        self.device
            .emit_report(interface, report_id, data)
            .await
            .map_err(RouteError::Device)?;
        self.state.stamp_host_liveness();
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
