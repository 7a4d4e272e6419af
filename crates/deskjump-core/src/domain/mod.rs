//! Pure domain logic: device state, report formats, hotkey matching.
//!
//! Nothing in this module performs I/O; everything here is exercised by
//! the application layer of the per-board crate and by unit tests.

pub mod hotkey;
pub mod report;
pub mod state;

pub use hotkey::{default_hotkeys, find_match, HotkeyAction, HotkeyCombo};
pub use report::{mouse_middle_click, BitmapKeyboardReport, BootKeyboardReport};
pub use state::{Board, BoardConfig, DeviceState, OsKind};
