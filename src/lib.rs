//! Streams Assetto Corsa telemetry from shared memory to WebSocket clients.
//!
//! The simulator publishes three fixed-layout records in named shared memory
//! pages: physics, graphics and static. This crate attaches to those pages,
//! decodes the records against their exact byte layout, and pushes a small
//! JSON summary to every connected WebSocket client at a fixed cadence.
//!
//! # Features
//!
//! - **Exact layouts**: field tables reproduce the simulator's packed records
//! - **Resilient attach**: regions come and go with the simulator; every poll
//!   retries whatever is missing
//! - **Isolated clients**: each client has its own reader and loop
//! - **Backends**: Windows file mappings, `/dev/shm` files, or in-memory
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ac_bridge::{BridgeConfig, BridgeServer};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BridgeConfig::from_args();
//!     let backend = config.build_backend()?;
//!     BridgeServer::new(&config, backend)?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Reading without a server
//!
//! ```rust
//! use ac_bridge::memory::{InMemoryBackend, SimReader};
//! use std::sync::Arc;
//!
//! let mut reader = SimReader::new(Arc::new(InMemoryBackend::new()));
//! let snapshot = reader.poll();
//! assert!(!snapshot.is_available());
//! ```

// Core types and error handling
mod error;
pub mod region;

// Record layouts and shared memory access
pub mod layout;
pub mod memory;
pub mod snapshot;

// Streaming
pub mod broadcast;
pub mod config;
pub mod server;

pub use error::*;
pub use region::Region;

pub use broadcast::{BroadcastLoop, CloseReason, SnapshotSink};
pub use config::{BackendKind, BridgeConfig};
pub use layout::{GraphicsRecord, PhysicsRecord, Record, StaticRecord, WideStr};
pub use memory::{RegionBackend, RegionMapping, SimReader};
pub use server::{BoundServer, BridgeServer};
pub use snapshot::{LiveTelemetry, TelemetrySnapshot, assemble};
