//! Bridge configuration from CLI arguments and environment variables.
//!
//! Every option has an `AC_BRIDGE_*` environment fallback and a default
//! that matches the stock setup: WebSocket on `0.0.0.0:8000/ws`, 20 Hz.
//!
//! ```no_run
//! use ac_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::from_args();
//! config.validate().expect("invalid configuration");
//! println!("streaming on ws://{}{}", config.bind, config.path);
//! ```

use crate::memory::{FileBackend, RegionBackend};
use crate::snapshot::DEFAULT_WAITING_MESSAGE;
use crate::{BridgeError, Result};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where shared memory regions are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Windows mappings on Windows, files everywhere else
    Auto,
    /// `Local\acpmf_*` file mappings
    Windows,
    /// Files named `acpmf_*` in `--shm-dir`
    File,
}

/// Bridge configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "ac-bridge", about = "Stream Assetto Corsa telemetry to WebSocket clients", version)]
pub struct BridgeConfig {
    /// WebSocket server bind address
    #[arg(long, env = "AC_BRIDGE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// WebSocket endpoint path
    #[arg(long, env = "AC_BRIDGE_PATH", default_value = "/ws")]
    pub path: String,

    /// Milliseconds between snapshots sent to each client
    #[arg(long, env = "AC_BRIDGE_CADENCE_MS", default_value_t = 50)]
    pub cadence_ms: u64,

    /// Shared memory source
    #[arg(long, env = "AC_BRIDGE_BACKEND", value_enum, default_value_t = BackendKind::Auto)]
    pub backend: BackendKind,

    /// Directory holding region files for the file backend
    #[arg(long, env = "AC_BRIDGE_SHM_DIR", default_value = "/dev/shm")]
    pub shm_dir: PathBuf,

    /// Message sent to clients while the simulator is not running
    #[arg(long, env = "AC_BRIDGE_WAITING_MESSAGE", default_value = DEFAULT_WAITING_MESSAGE)]
    pub waiting_message: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "AC_BRIDGE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            path: "/ws".to_string(),
            cadence_ms: 50,
            backend: BackendKind::Auto,
            shm_dir: PathBuf::from(crate::memory::DEFAULT_SHM_DIR),
            waiting_message: DEFAULT_WAITING_MESSAGE.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Parse configuration from command-line arguments.
    pub fn from_args() -> Self {
        Self::parse()
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Config` if the cadence is zero or the path is
    /// not a literal absolute route. Captures and wildcards (`:`, `*`, `{`,
    /// `}`) are rejected.
    pub fn validate(&self) -> Result<()> {
        if self.cadence_ms == 0 {
            return Err(BridgeError::config("cadence must be at least 1 ms"));
        }
        if !self.path.starts_with('/') {
            return Err(BridgeError::config(format!(
                "endpoint path must start with '/': {}",
                self.path
            )));
        }
        if let Some(c) = self.path.chars().find(|c| matches!(c, ':' | '*' | '{' | '}')) {
            return Err(BridgeError::config(format!(
                "endpoint path must be a literal route, found '{c}' in {}",
                self.path
            )));
        }
        Ok(())
    }

    /// Build the configured shared memory backend.
    pub fn build_backend(&self) -> Result<Arc<dyn RegionBackend>> {
        match self.backend {
            BackendKind::File => Ok(Arc::new(FileBackend::new(&self.shm_dir))),
            #[cfg(windows)]
            BackendKind::Auto | BackendKind::Windows => {
                Ok(Arc::new(crate::memory::WindowsBackend::new()))
            }
            #[cfg(not(windows))]
            BackendKind::Auto => Ok(Arc::new(FileBackend::new(&self.shm_dir))),
            #[cfg(not(windows))]
            BackendKind::Windows => {
                Err(BridgeError::unsupported_platform("Windows shared memory backend", "Windows"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_setup() {
        let config = BridgeConfig::try_parse_from(["ac-bridge"]).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.path, "/ws");
        assert_eq!(config.cadence(), Duration::from_millis(50));
        assert_eq!(config.backend, BackendKind::Auto);
        assert_eq!(config.waiting_message, DEFAULT_WAITING_MESSAGE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_overrides() {
        let config = BridgeConfig::try_parse_from([
            "ac-bridge",
            "--bind",
            "127.0.0.1:9100",
            "--cadence-ms",
            "100",
            "--backend",
            "file",
            "--shm-dir",
            "/tmp/acshm",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 9100);
        assert_eq!(config.cadence(), Duration::from_millis(100));
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.build_backend().unwrap().name(), "file");
    }

    #[test]
    fn rejects_zero_cadence_and_relative_path() {
        let config = BridgeConfig { cadence_ms: 0, ..BridgeConfig::default() };
        assert!(matches!(config.validate(), Err(BridgeError::Config { .. })));

        let config = BridgeConfig { path: "ws".to_string(), ..BridgeConfig::default() };
        assert!(matches!(config.validate(), Err(BridgeError::Config { .. })));
    }

    #[test]
    fn rejects_route_captures_and_wildcards() {
        for path in ["/:ws", "/{id}", "/ws/*rest", "/telemetry/{*rest}"] {
            let config = BridgeConfig { path: path.to_string(), ..BridgeConfig::default() };
            assert!(matches!(config.validate(), Err(BridgeError::Config { .. })), "{path} accepted");
        }

        let config = BridgeConfig { path: "/telemetry/live".to_string(), ..BridgeConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[cfg(not(windows))]
    #[test]
    fn windows_backend_is_unsupported_elsewhere() {
        let config = BridgeConfig { backend: BackendKind::Windows, ..BridgeConfig::default() };
        assert!(matches!(config.build_backend(), Err(BridgeError::UnsupportedPlatform { .. })));
    }
}
