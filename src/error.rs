//! Error types for the telemetry bridge.
//!
//! All errors implement `std::error::Error` and carry enough context to be
//! logged where they are absorbed. Most of them never reach a client: a
//! failing region degrades the snapshot to "unavailable" and the next poll
//! cycle tries again.
//!
//! ## Error Categories
//!
//! - **Layout Errors**: a region's byte size does not match the record ABI
//! - **Memory Map Errors**: OS failures while attaching or reading a region
//! - **Transport Errors**: a client connection failed; only that client stops
//! - **Startup Errors**: bind and configuration failures, fatal to the process
//!
//! A region that simply does not exist (simulator not running) is *not* an
//! error; attachment reports it as `Ok(None)`.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use ac_bridge::{BridgeError, Region};
//!
//! let error = BridgeError::memory_map(Region::Physics, "open", "access denied");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use crate::Region;
use std::net::SocketAddr;
use thiserror::Error;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for bridge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("Layout mismatch in {region} region: expected {expected} bytes, found {found}")]
    Layout { region: Region, expected: usize, found: usize },

    #[error("Shared memory {operation} failed for {region} region")]
    MemoryMap {
        region: Region,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Client transport failed: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to bind telemetry server to {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Telemetry server stopped unexpectedly")]
    Serve {
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Failed to encode wire message")]
    Encode(#[from] serde_json::Error),

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },
}

impl BridgeError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::MemoryMap { .. } => true,
            BridgeError::Layout { .. } => false,
            BridgeError::Transport { .. } => false,
            BridgeError::Bind { .. } => false,
            BridgeError::Serve { .. } => false,
            BridgeError::Config { .. } => false,
            BridgeError::Encode(_) => false,
            BridgeError::UnsupportedPlatform { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BridgeError::Layout { .. } => vec![
                "Check that the simulator is Assetto Corsa and not a derivative with another layout",
                "Update the simulator to a release that publishes the standard shared memory pages",
            ],
            BridgeError::MemoryMap { .. } => vec![
                "Run the bridge as the same user as the simulator",
                "Check shared memory permissions",
                "Verify system resources availability",
            ],
            BridgeError::Transport { .. } => vec![
                "Check the client network connection",
                "Reconnect the client",
            ],
            BridgeError::Bind { .. } => vec![
                "Choose another port with --bind",
                "Stop the process already listening on this address",
            ],
            BridgeError::Serve { .. } => vec!["Restart the bridge", "Check system network resources"],
            BridgeError::Config { .. } => vec![
                "Run with --help to see valid options",
                "Check AC_BRIDGE_* environment variables",
            ],
            BridgeError::Encode(_) => vec!["Report this as a bug"],
            BridgeError::UnsupportedPlatform { .. } => vec![
                "Use --backend file on this platform",
                "Check documentation for platform requirements",
            ],
        }
    }

    /// Helper constructor for layout size mismatches.
    pub fn layout(region: Region, expected: usize, found: usize) -> Self {
        BridgeError::Layout { region, expected, found }
    }

    /// Helper constructor for memory map failures.
    pub fn memory_map(
        region: Region,
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        BridgeError::MemoryMap { region, operation: operation.into(), source: Some(source.into()) }
    }

    /// Helper constructor for Windows API failures while mapping a region.
    #[cfg(windows)]
    pub fn windows_api_error(
        region: Region,
        operation: impl Into<String>,
        source: core::Error,
    ) -> Self {
        BridgeError::MemoryMap {
            region,
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper constructor for client transport failures.
    pub fn transport(reason: impl Into<String>) -> Self {
        BridgeError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for client transport failures with source.
    pub fn transport_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        BridgeError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        BridgeError::Config { reason: reason.into() }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        BridgeError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn layout_messages_carry_sizes(expected in 0usize..4096, found in 0usize..4096) {
            for region in Region::ALL {
              let msg = BridgeError::layout(region, expected, found).to_string();
              prop_assert!(msg.contains(&expected.to_string()));
              prop_assert!(msg.contains(&found.to_string()));
              prop_assert!(msg.contains(region.as_str()));
            }
          }

          #[test]
          fn transport_messages_contain_reason(reason in ".*") {
            let error = BridgeError::transport(reason.clone());
            prop_assert!(error.to_string().contains(&reason));
            prop_assert!(!error.is_retryable());
          }

          #[test]
          fn memory_map_source_is_preserved(detail in "[a-z ]{1,40}") {
            let error = BridgeError::memory_map(
              Region::Graphics,
              "open",
              std::io::Error::other(detail.clone()),
            );
            let source = std::error::Error::source(&error).map(|s| s.to_string());
            prop_assert_eq!(source, Some(detail));
          }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<BridgeError>();

        let error = BridgeError::transport("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification() {
        assert!(BridgeError::memory_map(Region::Static, "map", "busy").is_retryable());
        assert!(!BridgeError::layout(Region::Physics, 712, 12).is_retryable());
        assert!(!BridgeError::config("cadence must be positive").is_retryable());

        let bind = BridgeError::Bind {
            addr: "127.0.0.1:8000".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(!bind.is_retryable());
        assert!(bind.to_string().contains("127.0.0.1:8000"));
    }

    #[test]
    fn every_error_has_suggestions() {
        let errors = [
            BridgeError::layout(Region::Physics, 712, 0),
            BridgeError::memory_map(Region::Physics, "open", "denied"),
            BridgeError::transport("reset"),
            BridgeError::config("bad"),
            BridgeError::unsupported_platform("Windows shared memory", "Windows"),
        ];

        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "no suggestions for {error}");
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }
}
