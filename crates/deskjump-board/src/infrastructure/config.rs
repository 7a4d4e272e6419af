//! TOML configuration for one board.
//!
//! Both boards run the same binary; the config file tells each which
//! board it is, which OS sits behind each device port, and how the two
//! processes find each other. Every field has a default so a missing or
//! minimal file still yields a runnable board A:
//!
//! ```toml
//! [board]
//! role = "a"
//! os_a = "linux"
//! os_b = "macos"
//! log_level = "info"
//!
//! [link]
//! mode = "listen"            # "listen" or "connect"
//! address = "127.0.0.1:7331"
//!
//! [watchdog]
//! timeout_ms = 500
//! host_budget_ms = 2000
//! ```

use std::path::{Path, PathBuf};

use deskjump_core::{Board, BoardConfig, OsKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::health::{DEFAULT_HOST_BUDGET, WATCHDOG_TIMEOUT};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level on-disk configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardFileConfig {
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub link: LinkSection,
    #[serde(default)]
    pub watchdog: WatchdogSection,
}

/// Identity and environment of this board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardSection {
    /// Which board this process is, `"a"` or `"b"`.
    #[serde(default = "default_role")]
    pub role: Board,
    /// OS attached to board A's device port.
    #[serde(default = "default_os_a")]
    pub os_a: OsKind,
    /// OS attached to board B's device port.
    #[serde(default = "default_os_b")]
    pub os_b: OsKind,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How this board reaches its peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkSection {
    /// `"listen"` waits for the peer, `"connect"` dials it. Convention:
    /// board A listens, board B connects.
    #[serde(default = "default_link_mode")]
    pub mode: LinkMode,
    /// Socket address to bind or dial.
    #[serde(default = "default_link_address")]
    pub address: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    Listen,
    Connect,
}

/// Watchdog budgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchdogSection {
    /// Reset timeout in milliseconds.
    #[serde(default = "default_watchdog_timeout_ms")]
    pub timeout_ms: u64,
    /// Host-loop liveness budget in milliseconds.
    #[serde(default = "default_host_budget_ms")]
    pub host_budget_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_role() -> Board {
    Board::A
}
fn default_os_a() -> OsKind {
    OsKind::Linux
}
fn default_os_b() -> OsKind {
    OsKind::MacOs
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_link_mode() -> LinkMode {
    LinkMode::Listen
}
fn default_link_address() -> String {
    "127.0.0.1:7331".to_string()
}
fn default_watchdog_timeout_ms() -> u64 {
    WATCHDOG_TIMEOUT.as_millis() as u64
}
fn default_host_budget_ms() -> u64 {
    DEFAULT_HOST_BUDGET.as_millis() as u64
}

impl Default for BoardFileConfig {
    fn default() -> Self {
        Self {
            board: BoardSection::default(),
            link: LinkSection::default(),
            watchdog: WatchdogSection::default(),
        }
    }
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            role: default_role(),
            os_a: default_os_a(),
            os_b: default_os_b(),
            log_level: default_log_level(),
        }
    }
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            mode: default_link_mode(),
            address: default_link_address(),
        }
    }
}

impl Default for WatchdogSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_watchdog_timeout_ms(),
            host_budget_ms: default_host_budget_ms(),
        }
    }
}

impl BoardFileConfig {
    /// The domain-level view of the `[board]` section.
    pub fn board_config(&self) -> BoardConfig {
        BoardConfig {
            role: self.board.role,
            os_a: self.board.os_a,
            os_b: self.board.os_b,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads the config from `path`, returning defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than
/// "not found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<BoardFileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: BoardFileConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BoardFileConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_board_a_listening() {
        let cfg = BoardFileConfig::default();
        assert_eq!(cfg.board.role, Board::A);
        assert_eq!(cfg.link.mode, LinkMode::Listen);
        assert_eq!(cfg.watchdog.timeout_ms, WATCHDOG_TIMEOUT.as_millis() as u64);
        assert_eq!(
            cfg.watchdog.host_budget_ms,
            DEFAULT_HOST_BUDGET.as_millis() as u64
        );
        assert_eq!(cfg.board.log_level, "info");
    }

    #[test]
    fn test_full_config_round_trips() {
        let mut cfg = BoardFileConfig::default();
        cfg.board.role = Board::B;
        cfg.board.os_b = OsKind::MacOs;
        cfg.link.mode = LinkMode::Connect;
        cfg.link.address = "10.0.0.2:9000".to_string();
        cfg.watchdog.timeout_ms = 750;

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: BoardFileConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let cfg: BoardFileConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, BoardFileConfig::default());
    }

    #[test]
    fn test_partial_section_overrides_only_named_fields() {
        let text = r#"
[board]
role = "b"

[link]
mode = "connect"
"#;
        let cfg: BoardFileConfig = toml::from_str(text).expect("deserialize partial");
        assert_eq!(cfg.board.role, Board::B);
        assert_eq!(cfg.board.os_a, OsKind::Linux, "unspecified field keeps default");
        assert_eq!(cfg.link.mode, LinkMode::Connect);
        assert_eq!(cfg.link.address, default_link_address());
    }

    #[test]
    fn test_os_names_parse_lowercase() {
        let text = r#"
[board]
os_a = "windows"
os_b = "macos"
"#;
        let cfg: BoardFileConfig = toml::from_str(text).expect("deserialize");
        assert_eq!(cfg.board.os_a, OsKind::Windows);
        assert_eq!(cfg.board.os_b, OsKind::MacOs);

        let cfg: BoardFileConfig =
            toml::from_str("[board]\nos_a = \"undefined\"").expect("deserialize");
        assert_eq!(cfg.board.os_a, OsKind::Undefined);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result: Result<BoardFileConfig, _> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_missing_file_gives_defaults() {
        let path = Path::new("/nonexistent/deskjump/config.toml");
        let cfg = load_config(path).expect("defaults for missing file");
        assert_eq!(cfg, BoardFileConfig::default());
    }

    #[test]
    fn test_board_config_projection() {
        let mut cfg = BoardFileConfig::default();
        cfg.board.role = Board::B;
        cfg.board.os_b = OsKind::MacOs;

        let bc = cfg.board_config();
        assert_eq!(bc.role, Board::B);
        assert_eq!(bc.local_os(), OsKind::MacOs);
    }
}
