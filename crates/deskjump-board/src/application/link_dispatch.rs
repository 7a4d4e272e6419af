//! LinkDispatcher: maps received link packets to their handlers.
//!
//! Every message type is bound to a [`PacketHandler`] at construction,
//! in one place, so the full set of link-reachable behaviour is visible
//! here. Frames whose type carries no binding are dropped quietly; the
//! framer already filtered types it does not know, so that case only
//! covers types deliberately left unbound.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use deskjump_core::protocol::packet::{MessageType, Packet};
use deskjump_core::{Board, DeviceState};
use tracing::{trace, warn};

use crate::application::actions::ActionDispatcher;
use crate::application::route_input::{InputRouter, LinkTransmitter, RouteError};

// ── Handler trait ─────────────────────────────────────────────────────────────

/// One message type's worth of receive-side behaviour.
#[async_trait]
pub trait PacketHandler: Send + Sync {
    async fn handle(&self, packet: &Packet) -> Result<(), RouteError>;
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Routes decoded link packets to the handler registered for their type.
pub struct LinkDispatcher {
    handlers: HashMap<MessageType, Box<dyn PacketHandler>>,
}

impl LinkDispatcher {
    /// Builds the dispatcher with the standard handler set.
    pub fn new(
        state: Arc<DeviceState>,
        router: Arc<InputRouter>,
        actions: Arc<ActionDispatcher>,
        link: Arc<dyn LinkTransmitter>,
    ) -> Self {
        let mut handlers: HashMap<MessageType, Box<dyn PacketHandler>> = HashMap::new();

        for msg_type in [
            MessageType::KeyboardReport,
            MessageType::MouseReport,
            MessageType::ConsumerControl,
        ] {
            handlers.insert(
                msg_type,
                Box::new(ForwardedReportHandler {
                    router: Arc::clone(&router),
                }),
            );
        }
        handlers.insert(
            MessageType::OutputSelect,
            Box::new(OutputSelectHandler {
                actions: Arc::clone(&actions),
            }),
        );
        handlers.insert(
            MessageType::LockScreen,
            Box::new(LockScreenHandler {
                actions: Arc::clone(&actions),
            }),
        );
        handlers.insert(
            MessageType::SuspendHost,
            Box::new(SuspendHostHandler {
                actions: Arc::clone(&actions),
            }),
        );
        handlers.insert(
            MessageType::EnableDebug,
            Box::new(EnableDebugHandler {
                actions: Arc::clone(&actions),
            }),
        );
        handlers.insert(
            MessageType::RequestReboot,
            Box::new(RequestRebootHandler { actions }),
        );
        handlers.insert(
            MessageType::OutputGet,
            Box::new(OutputGetHandler { state, link }),
        );

        Self { handlers }
    }

    /// Handles one received packet. Handler failures are logged, never
    /// propagated: a bad frame from the peer must not stop the loop.
    pub async fn dispatch(&self, packet: Packet) {
        match self.handlers.get(&packet.msg_type) {
            Some(handler) => {
                if let Err(err) = handler.handle(&packet).await {
                    warn!(%err, msg_type = ?packet.msg_type, "link packet handler failed");
                }
            }
            None => {
                trace!(msg_type = ?packet.msg_type, "no handler bound; packet dropped");
            }
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// Keyboard / mouse / consumer reports forwarded by the peer.
struct ForwardedReportHandler {
    router: Arc<InputRouter>,
}

#[async_trait]
impl PacketHandler for ForwardedReportHandler {
    async fn handle(&self, packet: &Packet) -> Result<(), RouteError> {
        self.router.inject_remote(packet).await
    }
}

/// The peer announced a new active output.
struct OutputSelectHandler {
    actions: Arc<ActionDispatcher>,
}

#[async_trait]
impl PacketHandler for OutputSelectHandler {
    async fn handle(&self, packet: &Packet) -> Result<(), RouteError> {
        let owner = Board::from_index(packet.payload().first().copied().unwrap_or(0));
        self.actions.apply_output_select(owner).await;
        Ok(())
    }
}

/// The peer asks this board to lock its own host.
struct LockScreenHandler {
    actions: Arc<ActionDispatcher>,
}

#[async_trait]
impl PacketHandler for LockScreenHandler {
    async fn handle(&self, _packet: &Packet) -> Result<(), RouteError> {
        self.actions.lock_local().await
    }
}

/// The peer asks this board to suspend its own host.
struct SuspendHostHandler {
    actions: Arc<ActionDispatcher>,
}

#[async_trait]
impl PacketHandler for SuspendHostHandler {
    async fn handle(&self, _packet: &Packet) -> Result<(), RouteError> {
        self.actions.suspend_local().await
    }
}

/// The peer switched diagnostics on.
struct EnableDebugHandler {
    actions: Arc<ActionDispatcher>,
}

#[async_trait]
impl PacketHandler for EnableDebugHandler {
    async fn handle(&self, _packet: &Packet) -> Result<(), RouteError> {
        self.actions.apply_debug(true);
        Ok(())
    }
}

/// The peer asks this board to watchdog-reset.
struct RequestRebootHandler {
    actions: Arc<ActionDispatcher>,
}

#[async_trait]
impl PacketHandler for RequestRebootHandler {
    async fn handle(&self, _packet: &Packet) -> Result<(), RouteError> {
        self.actions.apply_reboot();
        Ok(())
    }
}

/// The peer asks who owns the output; answered with OutputSelect.
struct OutputGetHandler {
    state: Arc<DeviceState>,
    link: Arc<dyn LinkTransmitter>,
}

#[async_trait]
impl PacketHandler for OutputGetHandler {
    async fn handle(&self, _packet: &Packet) -> Result<(), RouteError> {
        let owner = self.state.active_output();
        self.link
            .send(Packet::value(MessageType::OutputSelect, owner.index()))
            .await
            .map_err(RouteError::Link)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::actions::Indicator;
    use crate::application::route_input::{
        DeviceOutput, HidInterface, REPORT_ID_KEYBOARD,
    };
    use deskjump_core::domain::report::BitmapKeyboardReport;
    use deskjump_core::keymap::hid::HidKey;
    use deskjump_core::{BoardConfig, OsKind};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingLink {
        sent: Mutex<Vec<Packet>>,
    }

    #[async_trait]
    impl LinkTransmitter for RecordingLink {
        async fn send(&self, packet: Packet) -> Result<(), String> {
            self.sent.lock().unwrap().push(packet);
            Ok(())
        }
    }

    struct RecordingDevice {
        ready: AtomicBool,
        reports: Mutex<Vec<(HidInterface, u8, Vec<u8>)>>,
    }

    impl Default for RecordingDevice {
        fn default() -> Self {
            Self {
                ready: AtomicBool::new(true),
                reports: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DeviceOutput for RecordingDevice {
        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn emit_report(
            &self,
            interface: HidInterface,
            report_id: u8,
            data: &[u8],
        ) -> Result<(), String> {
            self.reports
                .lock()
                .unwrap()
                .push((interface, report_id, data.to_vec()));
            Ok(())
        }

        async fn remote_wakeup(&self) -> Result<(), String> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullIndicator;

    impl Indicator for NullIndicator {
        fn output_changed(&self, _board: Board) {}
        fn debug_changed(&self, _enabled: bool) {}
    }

    struct Fixture {
        state: Arc<DeviceState>,
        link: Arc<RecordingLink>,
        device: Arc<RecordingDevice>,
        dispatcher: LinkDispatcher,
    }

    fn fixture(role: Board) -> Fixture {
        let state = Arc::new(DeviceState::new(BoardConfig {
            role,
            os_a: OsKind::Linux,
            os_b: OsKind::MacOs,
        }));
        let link = Arc::new(RecordingLink::default());
        let device = Arc::new(RecordingDevice::default());
        let actions = Arc::new(ActionDispatcher::new(
            Arc::clone(&state),
            Arc::clone(&link) as Arc<dyn LinkTransmitter>,
            Arc::clone(&device) as Arc<dyn DeviceOutput>,
            Arc::new(NullIndicator),
        ));
        let router = Arc::new(InputRouter::new(
            Arc::clone(&state),
            Arc::clone(&link) as Arc<dyn LinkTransmitter>,
            Arc::clone(&device) as Arc<dyn DeviceOutput>,
            Arc::clone(&actions),
        ));
        let dispatcher = LinkDispatcher::new(
            Arc::clone(&state),
            router,
            actions,
            Arc::clone(&link) as Arc<dyn LinkTransmitter>,
        );
        Fixture {
            state,
            link,
            device,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_forwarded_keyboard_report_reaches_device() {
        // Board A owns the output and receives a report from B.
        let f = fixture(Board::A);
        let mut bitmap = BitmapKeyboardReport::empty();
        bitmap.set_key(HidKey::M.code());
        let packet = Packet::new(
            MessageType::KeyboardReport,
            0,
            REPORT_ID_KEYBOARD,
            &bitmap.as_bytes(),
        )
        .unwrap();

        f.dispatcher.dispatch(packet).await;

        let reports = f.device.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].2, bitmap.as_bytes().to_vec());
    }

    #[tokio::test]
    async fn test_output_select_updates_state_without_echo() {
        let f = fixture(Board::B);

        f.dispatcher
            .dispatch(Packet::value(MessageType::OutputSelect, 1))
            .await;

        assert_eq!(f.state.active_output(), Board::B);
        assert!(f.link.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_screen_request_emits_chord_locally() {
        let f = fixture(Board::A);

        f.dispatcher
            .dispatch(Packet::empty(MessageType::LockScreen))
            .await;

        // Linux host on board A: Super+L press then release.
        let reports = f.device.reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        let chord = BitmapKeyboardReport::from_bytes(&reports[0].2).unwrap();
        assert!(chord.contains_key(HidKey::L.code()));
    }

    #[tokio::test]
    async fn test_enable_debug_request_does_not_reannounce() {
        let f = fixture(Board::A);

        f.dispatcher
            .dispatch(Packet::value(MessageType::EnableDebug, 1))
            .await;

        assert!(f.state.debug_enabled());
        assert!(
            f.link.sent.lock().unwrap().is_empty(),
            "peer-driven debug enable must not echo back"
        );
    }

    #[tokio::test]
    async fn test_reboot_request_arms_without_echo() {
        let f = fixture(Board::A);

        f.dispatcher
            .dispatch(Packet::empty(MessageType::RequestReboot))
            .await;

        assert!(f.state.reboot_requested());
        assert!(f.link.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_output_get_answered_with_current_owner() {
        let f = fixture(Board::A);
        f.state.set_active_output(Board::B);

        f.dispatcher
            .dispatch(Packet::empty(MessageType::OutputGet))
            .await;

        let sent = f.link.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].msg_type, MessageType::OutputSelect);
        assert_eq!(sent[0].payload(), &[1]);
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_panic_dispatch() {
        // Board A active but device not ready: the forwarded report's
        // handler fails; dispatch must swallow it.
        let f = fixture(Board::A);
        f.device.ready.store(false, Ordering::SeqCst);
        let packet =
            Packet::new(MessageType::MouseReport, 1, 2, &[1, 2, 3, 4]).unwrap();

        f.dispatcher.dispatch(packet).await;

        assert!(f.device.reports.lock().unwrap().is_empty());
    }
}
