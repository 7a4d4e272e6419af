//! DeskJump board entry point.
//!
//! Wires the infrastructure to the application layer and starts the two
//! long-running loops. Run the same binary twice with two config files
//! to get a working pair:
//!
//! ```text
//! deskjump-board board-a.toml     # role = "a", link.mode = "listen"
//! deskjump-board board-b.toml     # role = "b", link.mode = "connect"
//! ```
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML, defaults for missing fields
//!  └─ establish link           -- listen or connect per config
//!  └─ spawn services
//!       ├─ link writer/reader  -- frame transport tasks
//!       ├─ host_loop           -- link RX + local input routing
//!       ├─ device_loop         -- health monitor ticks
//!       └─ watchdog supervisor -- resets the process on expiry
//! ```

use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deskjump_board::application::{
    device_loop, host_loop, ActionDispatcher, HealthMonitor, InputRouter, LinkDispatcher,
    LinkTransmitter,
};
use deskjump_board::infrastructure::config::{load_config, LinkMode};
use deskjump_board::infrastructure::indicator::{LogDiagnostics, LogIndicator};
use deskjump_board::infrastructure::link;
use deskjump_board::infrastructure::usb::{ChannelHostInput, ConsoleDeviceOutput};
use deskjump_board::infrastructure::watchdog::{spawn_supervisor, SoftwareWatchdog};
use deskjump_core::protocol::packet::{MessageType, Packet};
use deskjump_core::DeviceState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "deskjump.toml".to_string());
    let config = load_config(Path::new(&config_path))
        .with_context(|| format!("loading config from {config_path}"))?;

    // Initialise structured logging. Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.board.log_level.clone())),
        )
        .init();

    info!(role = ?config.board.role, "DeskJump board starting");

    let state = Arc::new(DeviceState::new(config.board_config()));
    let running = Arc::new(AtomicBool::new(true));

    // ── Link transport ────────────────────────────────────────────────────────
    let stream = match config.link.mode {
        LinkMode::Listen => link::listen(&config.link.address).await?,
        LinkMode::Connect => link::connect(&config.link.address).await?,
    };
    let handles = link::spawn_link(stream);
    let link_tx: Arc<dyn LinkTransmitter> = handles.tx;

    // ── Application wiring ────────────────────────────────────────────────────
    let device = Arc::new(ConsoleDeviceOutput::new());
    let indicator = Arc::new(LogIndicator);
    let actions = Arc::new(ActionDispatcher::new(
        Arc::clone(&state),
        Arc::clone(&link_tx),
        device.clone(),
        indicator,
    ));
    let router = Arc::new(InputRouter::new(
        Arc::clone(&state),
        Arc::clone(&link_tx),
        device,
        Arc::clone(&actions),
    ));
    let dispatcher = Arc::new(LinkDispatcher::new(
        Arc::clone(&state),
        Arc::clone(&router),
        actions,
        Arc::clone(&link_tx),
    ));

    // The capture backend holds this sender; it stays open for the
    // lifetime of the process.
    let (_input_tx, input_source) = ChannelHostInput::new();

    // ── Watchdog ──────────────────────────────────────────────────────────────
    let watchdog = Arc::new(SoftwareWatchdog::new(Duration::from_millis(
        config.watchdog.timeout_ms,
    )));
    let supervisor = spawn_supervisor(Arc::clone(&watchdog), Arc::clone(&running));
    let health = HealthMonitor::new(
        Arc::clone(&state),
        watchdog,
        Duration::from_millis(config.watchdog.host_budget_ms),
    );

    // ── Loops ─────────────────────────────────────────────────────────────────
    let host = tokio::spawn(host_loop(
        Arc::clone(&state),
        router,
        dispatcher,
        handles.rx,
        Box::new(input_source),
        Arc::clone(&running),
    ));
    let dev = tokio::spawn(device_loop(
        Arc::clone(&state),
        health,
        Arc::new(LogDiagnostics),
        Arc::clone(&running),
    ));

    // Ask the peer who owns the output so a freshly restarted board
    // falls in line instead of asserting its power-on default.
    link_tx
        .send(Packet::empty(MessageType::OutputGet))
        .await
        .ok();

    info!("DeskJump board ready.  Press Ctrl-C to exit.");

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("shutdown signal received");
    running.store(false, Ordering::Relaxed);

    let _ = host.await;
    let _ = dev.await;
    supervisor.abort();
    handles.writer.abort();
    handles.reader.abort();

    info!("DeskJump board stopped");
    Ok(())
}
