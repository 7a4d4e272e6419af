//! USB stack stand-ins: event types from the host-mode side and a
//! console-backed device-mode port.
//!
//! On real hardware these two halves are the TinyUSB host and device
//! stacks. The software build keeps the same seams: the host side is
//! anything that feeds [`InputEvent`]s into a channel, the device side
//! is a [`DeviceOutput`] implementation. Tests plug recording doubles
//! into the same traits.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::application::route_input::{DeviceOutput, HidInterface};
use crate::application::runtime::HostInputSource;

// ── Events from the host-mode stack ───────────────────────────────────────────

/// One event captured from the physical peripherals attached to this
/// board, raw report bytes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A keyboard report (8-byte boot form or 16-byte bitmap form).
    Keyboard(Vec<u8>),
    /// A mouse report, forwarded byte-for-byte.
    Mouse(Vec<u8>),
    /// A consumer-control report (media keys).
    Consumer(Vec<u8>),
    /// A bus lifecycle change on the device-mode side.
    Lifecycle(LifecycleEvent),
}

/// USB bus lifecycle transitions of the emulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The host enumerated the device; reports can flow.
    Mounted,
    /// The host dropped the device.
    Unmounted,
    /// The host entered suspend; only remote wakeup is allowed.
    Suspended,
    /// The host resumed from suspend.
    Resumed,
}

// ── Channel-backed input source ───────────────────────────────────────────────

/// [`HostInputSource`] fed by an in-process channel. The capture
/// backend (or a test) holds the sender half.
pub struct ChannelHostInput {
    rx: mpsc::UnboundedReceiver<InputEvent>,
}

impl ChannelHostInput {
    /// Creates the source and the sender the capture side keeps.
    pub fn new() -> (mpsc::UnboundedSender<InputEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl HostInputSource for ChannelHostInput {
    async fn next_event(&mut self) -> Option<InputEvent> {
        self.rx.recv().await
    }
}

// ── Console device port ───────────────────────────────────────────────────────

/// [`DeviceOutput`] that logs every report instead of writing to a USB
/// endpoint. Readiness follows the lifecycle events it is handed.
pub struct ConsoleDeviceOutput {
    mounted: AtomicBool,
    suspended: AtomicBool,
}

impl Default for ConsoleDeviceOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleDeviceOutput {
    pub fn new() -> Self {
        Self {
            mounted: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DeviceOutput for ConsoleDeviceOutput {
    fn is_ready(&self) -> bool {
        self.mounted.load(Ordering::SeqCst) && !self.suspended.load(Ordering::SeqCst)
    }

    async fn emit_report(
        &self,
        interface: HidInterface,
        report_id: u8,
        data: &[u8],
    ) -> Result<(), String> {
        debug!(?interface, report_id, ?data, "report to host");
        Ok(())
    }

    async fn remote_wakeup(&self) -> Result<(), String> {
        info!("remote wakeup signalled");
        Ok(())
    }

    fn handle_lifecycle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Mounted => {
                self.mounted.store(true, Ordering::SeqCst);
                self.suspended.store(false, Ordering::SeqCst);
            }
            LifecycleEvent::Unmounted => self.mounted.store(false, Ordering::SeqCst),
            LifecycleEvent::Suspended => self.suspended.store(true, Ordering::SeqCst),
            LifecycleEvent::Resumed => self.suspended.store(false, Ordering::SeqCst),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_device_readiness_follows_lifecycle() {
        let device = ConsoleDeviceOutput::new();
        assert!(!device.is_ready(), "unmounted at start");

        device.handle_lifecycle(LifecycleEvent::Mounted);
        assert!(device.is_ready());

        device.handle_lifecycle(LifecycleEvent::Suspended);
        assert!(!device.is_ready(), "suspended host cannot take reports");

        device.handle_lifecycle(LifecycleEvent::Resumed);
        assert!(device.is_ready());

        device.handle_lifecycle(LifecycleEvent::Unmounted);
        assert!(!device.is_ready());
    }

    #[tokio::test]
    async fn test_channel_input_delivers_in_order() {
        let (tx, mut source) = ChannelHostInput::new();
        tx.send(InputEvent::Keyboard(vec![0; 8])).unwrap();
        tx.send(InputEvent::Mouse(vec![1, 2, 3, 4])).unwrap();

        assert_eq!(
            source.next_event().await,
            Some(InputEvent::Keyboard(vec![0; 8]))
        );
        assert_eq!(
            source.next_event().await,
            Some(InputEvent::Mouse(vec![1, 2, 3, 4]))
        );

        drop(tx);
        assert_eq!(source.next_event().await, None);
    }
}
