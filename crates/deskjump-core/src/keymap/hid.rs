//! USB HID Usage IDs (Keyboard/Keypad page, 0x07) and modifier masks.
//!
//! These are the codes hosts and devices exchange in keyboard reports;
//! they are layout-independent (the code for `HidKey::A` is the physical
//! "A" position regardless of what the OS keymap prints).

use serde::{Deserialize, Serialize};

// ── Modifier bit masks ────────────────────────────────────────────────────────

/// Bit masks for the modifier byte of a keyboard report.
///
/// One bit per modifier key, left block in the low nibble, right block
/// in the high nibble, as defined by the HID boot keyboard report.
pub mod modifier {
    pub const LEFT_CTRL: u8 = 0x01;
    pub const LEFT_SHIFT: u8 = 0x02;
    pub const LEFT_ALT: u8 = 0x04;
    pub const LEFT_GUI: u8 = 0x08;
    pub const RIGHT_CTRL: u8 = 0x10;
    pub const RIGHT_SHIFT: u8 = 0x20;
    pub const RIGHT_ALT: u8 = 0x40;
    pub const RIGHT_GUI: u8 = 0x80;
}

// ── Consumer-control usages ───────────────────────────────────────────────────

/// Usage IDs from the Consumer page (0x0C) that the switch emits itself.
pub mod consumer {
    /// Apple "Eject"; part of the macOS sleep chord.
    pub const EJECT: u16 = 0x00B8;
}

// ── Keyboard/Keypad usages ────────────────────────────────────────────────────

/// Usage IDs from the Keyboard/Keypad page (0x07).
///
/// Only the usages the switch itself references by name are listed;
/// reports carry raw `u8` codes and are not limited to this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKey {
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    CapsLock = 0x39,
    F1 = 0x3A,
    F12 = 0x45,
    ScrollLock = 0x47,
    Insert = 0x49,
    Delete = 0x4C,
    RightArrow = 0x4F,
    LeftArrow = 0x50,
    DownArrow = 0x51,
    UpArrow = 0x52,
}

impl HidKey {
    /// The raw usage code as carried in reports.
    pub const fn code(self) -> u8 {
        self as u8
    }
}
