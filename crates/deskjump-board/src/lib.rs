//! # deskjump-board
//!
//! The per-board DeskJump application. One instance of this crate runs
//! on each of the two boards; the `role` setting in the config file is
//! the only difference between them.
//!
//! # Architecture
//!
//! The crate follows a two-layer split:
//!
//! - **`application`** – use cases wired to collaborator traits: input
//!   routing and hotkey handling, hotkey action dispatch, link packet
//!   dispatch, and the health monitor. Everything here is unit-testable
//!   with recording doubles.
//! - **`infrastructure`** – concrete implementations of the traits: the
//!   stream-backed link transport, the console USB-device stand-ins,
//!   the software watchdog, indicators, and TOML configuration.
//!
//! The binary in `main.rs` wires the two layers together and spawns the
//! two long-running tasks (host loop and device loop).

pub mod application;
pub mod infrastructure;
