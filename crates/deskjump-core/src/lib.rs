//! # deskjump-core
//!
//! Shared library for DeskJump containing the inter-board link protocol,
//! the device state entities, and the USB HID key tables.
//!
//! This crate is used by the per-board application crate. It has zero
//! dependencies on I/O, OS APIs, or any concrete transport.
//!
//! # Architecture overview
//!
//! DeskJump is a two-board USB keyboard/mouse switch: each board is at
//! the same time a USB host (it reads a physical keyboard and mouse) and
//! a USB device (it emulates a keyboard and mouse towards a computer).
//! The two boards are joined by a point-to-point serial link. One board
//! is "active" at any moment; input captured on either board is emitted
//! by the active board and forwarded over the link otherwise. A hotkey
//! (or a mouse middle-click) moves the active output to the other board.
//!
//! This crate defines:
//!
//! - **`protocol`** – How bytes travel over the link. Fixed-length
//!   23-byte frames with a two-byte resync marker, an XOR checksum, and
//!   a receiver state machine that self-heals after framing loss.
//!
//! - **`domain`** – Pure business logic: the shared device state (which
//!   board is active, connectivity, liveness), keyboard report formats
//!   and their translation, and hotkey matching.
//!
//! - **`keymap`** – USB HID Usage IDs (page 0x07) and modifier masks,
//!   the canonical key representation used in reports and hotkeys.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `deskjump_core::Packet` instead of `deskjump_core::protocol::packet::Packet`.
pub use domain::hotkey::{default_hotkeys, find_match, HotkeyAction, HotkeyCombo};
pub use domain::report::{BitmapKeyboardReport, BootKeyboardReport};
pub use domain::state::{Board, BoardConfig, DeviceState, OsKind};
pub use keymap::hid::HidKey;
pub use protocol::codec::{checksum, decode_body, encode, ProtocolError};
pub use protocol::packet::{MessageType, Packet};
pub use protocol::receiver::{FrameReceiver, ReceiverState};
