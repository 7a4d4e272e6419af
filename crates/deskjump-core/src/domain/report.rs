//! Keyboard report formats and their translation.
//!
//! Two keyboard report shapes exist in the system:
//!
//! - The **boot report** (8 bytes: modifier, reserved, six key slots) is
//!   what physical keyboards produce and what the emulated device sends
//!   to its host. It can express at most six simultaneous keys.
//! - The **bitmap report** (16 bytes: modifier, 120-bit key bitmap) is
//!   the internal and on-link representation. One bit per usage code
//!   removes the six-key ceiling and makes hotkey matching a pair of
//!   mask operations.
//!
//! Translation is boot→bitmap on capture; usage codes outside the
//! bitmap's range are skipped rather than rejected, so an exotic key
//! never blocks the rest of a report.

use crate::protocol::packet::PACKET_DATA_LEN;

// ── Mouse buttons ─────────────────────────────────────────────────────────────

pub const MOUSE_BUTTON_LEFT: u8 = 0x01;
pub const MOUSE_BUTTON_RIGHT: u8 = 0x02;
pub const MOUSE_BUTTON_MIDDLE: u8 = 0x04;

/// True when a mouse report is a *bare* middle-button press.
///
/// Deliberately an exact comparison, not a mask test: middle-click only
/// acts as the output-toggle gesture when no other button is held, so
/// drag gestures involving the middle button pass through untouched.
pub fn mouse_middle_click(raw: &[u8]) -> bool {
    raw.first() == Some(&MOUSE_BUTTON_MIDDLE)
}

// ── Boot report ───────────────────────────────────────────────────────────────

/// Number of key slots in a boot keyboard report.
pub const BOOT_KEY_SLOTS: usize = 6;
/// Total size of a boot keyboard report.
pub const BOOT_REPORT_LEN: usize = 8;

/// The 8-byte HID boot keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootKeyboardReport {
    pub modifier: u8,
    pub keys: [u8; BOOT_KEY_SLOTS],
}

impl BootKeyboardReport {
    /// Parses the raw bytes a keyboard produced. Byte 1 is the reserved
    /// OEM byte and is ignored. Returns `None` for short reports.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < BOOT_REPORT_LEN {
            return None;
        }
        let mut keys = [0u8; BOOT_KEY_SLOTS];
        keys.copy_from_slice(&raw[2..2 + BOOT_KEY_SLOTS]);
        Some(Self {
            modifier: raw[0],
            keys,
        })
    }
}

// ── Bitmap report ─────────────────────────────────────────────────────────────

/// Bytes in the key bitmap; 120 representable usage codes.
pub const BITMAP_LEN: usize = PACKET_DATA_LEN - 1;
/// First usage code the bitmap can represent (`A`).
pub const BITMAP_FIRST_KEY: u8 = 0x04;
/// One past the last representable usage code.
pub const BITMAP_KEY_END: u8 = BITMAP_FIRST_KEY + (BITMAP_LEN as u8) * 8;

/// The 16-byte internal keyboard report: modifier byte plus a bitmap
/// with one bit per usage code in `0x04..0x7C`. Exactly fills a link
/// packet's data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitmapKeyboardReport {
    pub modifier: u8,
    pub bitmap: [u8; BITMAP_LEN],
}

/// Byte offset and bit mask of a usage code within the bitmap, or
/// `None` when the code falls outside the representable range.
fn bit_position(code: u8) -> Option<(usize, u8)> {
    if !(BITMAP_FIRST_KEY..BITMAP_KEY_END).contains(&code) {
        return None;
    }
    let index = (code - BITMAP_FIRST_KEY) as usize;
    Some((index / 8, 1 << (index % 8)))
}

impl BitmapKeyboardReport {
    /// A report with no modifiers and no keys, i.e. "all released".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Translates a boot report. Empty key slots (0x00) and usage codes
    /// outside the bitmap range are skipped silently.
    pub fn from_boot(boot: &BootKeyboardReport) -> Self {
        let mut report = Self {
            modifier: boot.modifier,
            bitmap: [0u8; BITMAP_LEN],
        };
        for &key in &boot.keys {
            report.set_key(key);
        }
        report
    }

    /// Sets the bit for a usage code; out-of-range codes are a no-op.
    pub fn set_key(&mut self, code: u8) {
        if let Some((offset, mask)) = bit_position(code) {
            self.bitmap[offset] |= mask;
        }
    }

    /// Whether the bit for a usage code is set. Out-of-range codes are
    /// never "pressed".
    pub fn contains_key(&self, code: u8) -> bool {
        match bit_position(code) {
            Some((offset, mask)) => self.bitmap[offset] & mask != 0,
            None => false,
        }
    }

    /// No modifiers held and no key bits set.
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.bitmap.iter().all(|&b| b == 0)
    }

    /// Wire form: exactly one packet data region.
    pub fn as_bytes(&self) -> [u8; PACKET_DATA_LEN] {
        let mut bytes = [0u8; PACKET_DATA_LEN];
        bytes[0] = self.modifier;
        bytes[1..].copy_from_slice(&self.bitmap);
        bytes
    }

    /// Parses the wire form. Returns `None` for short input.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        if raw.len() < PACKET_DATA_LEN {
            return None;
        }
        let mut bitmap = [0u8; BITMAP_LEN];
        bitmap.copy_from_slice(&raw[1..PACKET_DATA_LEN]);
        Some(Self {
            modifier: raw[0],
            bitmap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::hid::{modifier, HidKey};

    #[test]
    fn test_boot_from_bytes_skips_reserved_byte() {
        let raw = [modifier::LEFT_SHIFT, 0xAB, 0x04, 0x05, 0, 0, 0, 0];
        let boot = BootKeyboardReport::from_bytes(&raw).unwrap();
        assert_eq!(boot.modifier, modifier::LEFT_SHIFT);
        assert_eq!(boot.keys, [0x04, 0x05, 0, 0, 0, 0]);
    }

    #[test]
    fn test_boot_from_bytes_rejects_short_report() {
        assert!(BootKeyboardReport::from_bytes(&[0u8; 7]).is_none());
    }

    #[test]
    fn test_bitmap_translation_sets_expected_bits() {
        let boot = BootKeyboardReport {
            modifier: modifier::LEFT_CTRL,
            keys: [HidKey::A.code(), HidKey::CapsLock.code(), 0, 0, 0, 0],
        };
        let report = BitmapKeyboardReport::from_boot(&boot);

        assert_eq!(report.modifier, modifier::LEFT_CTRL);
        assert!(report.contains_key(HidKey::A.code()));
        assert!(report.contains_key(HidKey::CapsLock.code()));
        assert!(!report.contains_key(HidKey::B.code()));
        // A = 0x04 is bit 0 of byte 0; CapsLock = 0x39 is bit 5 of byte 6.
        assert_eq!(report.bitmap[0], 0x01);
        assert_eq!(report.bitmap[6], 0x20);
    }

    #[test]
    fn test_out_of_range_keys_skipped_not_rejected() {
        let boot = BootKeyboardReport {
            modifier: 0,
            keys: [HidKey::J.code(), 0x7C, 0xE0, 0xFF, 0, 0],
        };
        let report = BitmapKeyboardReport::from_boot(&boot);

        assert!(report.contains_key(HidKey::J.code()));
        assert!(!report.contains_key(0x7C));
        assert!(!report.contains_key(0xE0));
    }

    #[test]
    fn test_range_boundaries() {
        let mut report = BitmapKeyboardReport::empty();
        report.set_key(BITMAP_FIRST_KEY);
        report.set_key(BITMAP_KEY_END - 1);
        report.set_key(BITMAP_KEY_END);
        report.set_key(0x03);

        assert!(report.contains_key(BITMAP_FIRST_KEY));
        assert!(report.contains_key(BITMAP_KEY_END - 1));
        assert_eq!(report.bitmap[BITMAP_LEN - 1] & 0x80, 0x80);
        assert!(!report.contains_key(BITMAP_KEY_END));
        assert!(!report.contains_key(0x03));
    }

    #[test]
    fn test_wire_roundtrip() {
        let boot = BootKeyboardReport {
            modifier: modifier::RIGHT_ALT | modifier::RIGHT_SHIFT,
            keys: [HidKey::L.code(), 0, 0, 0, 0, 0],
        };
        let report = BitmapKeyboardReport::from_boot(&boot);
        let bytes = report.as_bytes();
        assert_eq!(BitmapKeyboardReport::from_bytes(&bytes), Some(report));
    }

    #[test]
    fn test_is_empty() {
        assert!(BitmapKeyboardReport::empty().is_empty());
        let mut report = BitmapKeyboardReport::empty();
        report.set_key(HidKey::Space.code());
        assert!(!report.is_empty());
        let held = BitmapKeyboardReport {
            modifier: modifier::LEFT_GUI,
            bitmap: [0; BITMAP_LEN],
        };
        assert!(!held.is_empty());
    }

    #[test]
    fn test_middle_click_is_exact_match() {
        assert!(mouse_middle_click(&[MOUSE_BUTTON_MIDDLE, 0, 0, 0]));
        // Middle plus another button is a chord, not the toggle gesture.
        assert!(!mouse_middle_click(&[
            MOUSE_BUTTON_MIDDLE | MOUSE_BUTTON_LEFT,
            0,
            0,
            0
        ]));
        assert!(!mouse_middle_click(&[MOUSE_BUTTON_LEFT, 0, 0, 0]));
        assert!(!mouse_middle_click(&[]));
    }
}
