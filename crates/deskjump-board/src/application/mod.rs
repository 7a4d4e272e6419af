//! Application layer: use cases and the collaborator traits they drive.

pub mod actions;
pub mod health;
pub mod link_dispatch;
pub mod route_input;
pub mod runtime;

pub use actions::{ActionDispatcher, Indicator};
pub use health::{HealthMonitor, Watchdog};
pub use link_dispatch::LinkDispatcher;
pub use route_input::{
    DeviceOutput, HidInterface, InputRouter, LinkTransmitter, RouteError, REPORT_ID_CONSUMER,
    REPORT_ID_KEYBOARD, REPORT_ID_MOUSE,
};
pub use runtime::{device_loop, host_loop, HostInputSource};
