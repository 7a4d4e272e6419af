//! Hotkey definitions and matching.
//!
//! Hotkeys are matched against the bitmap report *before* routing, so a
//! combo works no matter which board the keyboard hangs off and no
//! matter which output is active. Matching is first-match-wins over a
//! fixed table; the table is small enough that a linear scan is the
//! right tool.

use crate::domain::report::BitmapKeyboardReport;
use crate::keymap::hid::{modifier, HidKey};

// ── Actions ───────────────────────────────────────────────────────────────────

/// Everything a hotkey can trigger. A closed set: adding an action means
/// adding a variant here and an arm in the dispatcher, and the compiler
/// points at every place that needs updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Move the active output to the other board.
    ToggleOutput,
    /// Lock the screen of the currently active host.
    LockScreen,
    /// Put the currently active host to sleep.
    SuspendHost,
    /// Turn on verbose diagnostics on both boards.
    EnableDebug,
    /// Make both boards watchdog-reset.
    RequestReboot,
}

// ── Combos ────────────────────────────────────────────────────────────────────

/// One hotkey: a required modifier mask, required keys, and the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyCombo {
    /// Modifier bits that must all be held. Extra modifiers are allowed;
    /// requiring an exact match would break combos typed with, say,
    /// both shifts down.
    pub modifiers: u8,
    /// Usage codes that must all be pressed.
    pub keys: &'static [HidKey],
    /// Whether the triggering report is still forwarded to the host.
    /// `false` swallows the report so the host never sees the chord.
    pub pass_to_os: bool,
    pub action: HotkeyAction,
}

impl HotkeyCombo {
    /// Whether this combo is satisfied by a report: all required
    /// modifier bits held (subset test) and every required key down.
    pub fn matches(&self, report: &BitmapKeyboardReport) -> bool {
        if report.modifier & self.modifiers != self.modifiers {
            return false;
        }
        self.keys.iter().all(|key| report.contains_key(key.code()))
    }
}

/// First combo in `table` satisfied by `report`, if any.
pub fn find_match<'a>(
    report: &BitmapKeyboardReport,
    table: &'a [HotkeyCombo],
) -> Option<&'a HotkeyCombo> {
    table.iter().find(|combo| combo.matches(report))
}

// ── Default table ─────────────────────────────────────────────────────────────

/// Modifier pair shared by all management hotkeys: right Alt plus right
/// Shift, an intersection few applications bind.
const MGMT: u8 = modifier::RIGHT_ALT | modifier::RIGHT_SHIFT;

/// The built-in hotkey table.
///
/// Caps Lock is the output toggle and is swallowed; the management
/// chords are swallowed too so the active host never types a stray
/// letter while the switch reacts.
pub fn default_hotkeys() -> Vec<HotkeyCombo> {
    vec![
        HotkeyCombo {
            modifiers: 0,
            keys: &[HidKey::CapsLock],
            pass_to_os: false,
            action: HotkeyAction::ToggleOutput,
        },
        HotkeyCombo {
            modifiers: MGMT,
            keys: &[HidKey::L],
            pass_to_os: false,
            action: HotkeyAction::LockScreen,
        },
        HotkeyCombo {
            modifiers: MGMT,
            keys: &[HidKey::U],
            pass_to_os: false,
            action: HotkeyAction::SuspendHost,
        },
        HotkeyCombo {
            modifiers: MGMT,
            keys: &[HidKey::D],
            pass_to_os: false,
            action: HotkeyAction::EnableDebug,
        },
        HotkeyCombo {
            modifiers: MGMT,
            keys: &[HidKey::R],
            pass_to_os: false,
            action: HotkeyAction::RequestReboot,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::BootKeyboardReport;

    fn report(modifier: u8, keys: &[HidKey]) -> BitmapKeyboardReport {
        let mut r = BitmapKeyboardReport::empty();
        r.modifier = modifier;
        for key in keys {
            r.set_key(key.code());
        }
        r
    }

    #[test]
    fn test_caps_lock_matches_toggle() {
        let table = default_hotkeys();
        let m = find_match(&report(0, &[HidKey::CapsLock]), &table).unwrap();
        assert_eq!(m.action, HotkeyAction::ToggleOutput);
        assert!(!m.pass_to_os);
    }

    #[test]
    fn test_extra_modifiers_still_match() {
        // Subset rule: required bits must be held, extras are fine.
        let table = default_hotkeys();
        let m = find_match(
            &report(MGMT | modifier::LEFT_CTRL, &[HidKey::L]),
            &table,
        )
        .unwrap();
        assert_eq!(m.action, HotkeyAction::LockScreen);
    }

    #[test]
    fn test_missing_required_modifier_does_not_match() {
        let table = default_hotkeys();
        let found = find_match(&report(modifier::RIGHT_ALT, &[HidKey::U]), &table);
        assert!(found.is_none());
    }

    #[test]
    fn test_each_management_chord_maps_to_its_action() {
        let table = default_hotkeys();
        let cases = [
            (HidKey::L, HotkeyAction::LockScreen),
            (HidKey::U, HotkeyAction::SuspendHost),
            (HidKey::D, HotkeyAction::EnableDebug),
            (HidKey::R, HotkeyAction::RequestReboot),
        ];
        for (key, action) in cases {
            let m = find_match(&report(MGMT, &[key]), &table).unwrap();
            assert_eq!(m.action, action);
        }
    }

    #[test]
    fn test_combo_requires_every_listed_key() {
        // A combo listing several keys needs all of them down at once;
        // a report carrying only some of them is ordinary typing.
        let combo = HotkeyCombo {
            modifiers: 0,
            keys: &[HidKey::A, HidKey::B],
            pass_to_os: false,
            action: HotkeyAction::EnableDebug,
        };
        assert!(!combo.matches(&report(0, &[HidKey::A])));
        assert!(!combo.matches(&report(0, &[HidKey::B])));
        assert!(combo.matches(&report(0, &[HidKey::A, HidKey::B])));
    }

    #[test]
    fn test_plain_typing_matches_nothing() {
        let table = default_hotkeys();
        assert!(find_match(&report(0, &[HidKey::H, HidKey::I]), &table).is_none());
        assert!(find_match(&report(modifier::LEFT_SHIFT, &[HidKey::A]), &table).is_none());
        assert!(find_match(&BitmapKeyboardReport::empty(), &table).is_none());
    }

    #[test]
    fn test_matching_via_boot_translation() {
        // The path the router takes: raw boot bytes in, combo out.
        let raw = [MGMT, 0x00, HidKey::R.code(), 0, 0, 0, 0, 0];
        let boot = BootKeyboardReport::from_bytes(&raw).unwrap();
        let bitmap = BitmapKeyboardReport::from_boot(&boot);
        let table = default_hotkeys();
        let m = find_match(&bitmap, &table).unwrap();
        assert_eq!(m.action, HotkeyAction::RequestReboot);
    }
}
