//! ac-bridge binary entry point.
//!
//! Parses configuration, installs logging, picks the shared memory backend
//! and serves telemetry until Ctrl-C.

use ac_bridge::{BridgeConfig, BridgeServer};
use anyhow::{Context, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = BridgeConfig::from_args();

    // RUST_LOG wins over --log-level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    let backend = match config.build_backend() {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("{}", e);
            for suggestion in e.recovery_suggestions() {
                tracing::error!("  - {}", suggestion);
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        backend = backend.name(),
        cadence_ms = config.cadence_ms,
        "Streaming telemetry on ws://{}{}",
        config.bind,
        config.path
    );

    BridgeServer::new(&config, backend)?
        .run()
        .await
        .with_context(|| format!("telemetry server on {} failed", config.bind))?;

    Ok(())
}
