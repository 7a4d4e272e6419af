//! USB HID usage tables used across reports and hotkey definitions.

pub mod hid;

pub use hid::{consumer, modifier, HidKey};
