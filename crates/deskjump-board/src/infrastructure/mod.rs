//! Infrastructure layer: concrete implementations of the application
//! layer's collaborator traits.

pub mod config;
pub mod indicator;
pub mod link;
pub mod usb;
pub mod watchdog;
