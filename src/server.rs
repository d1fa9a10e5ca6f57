//! WebSocket server handing each client its own broadcast loop.

use crate::broadcast::{BroadcastLoop, SnapshotSink};
use crate::config::BridgeConfig;
use crate::memory::RegionBackend;
use crate::{BridgeError, Result};
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Shared by every connection; read-only after startup.
#[derive(Clone)]
struct AppState {
    backend: Arc<dyn RegionBackend>,
    cadence: Duration,
    waiting_message: Arc<str>,
}

/// Telemetry WebSocket server.
pub struct BridgeServer {
    bind: SocketAddr,
    router: Router,
}

impl BridgeServer {
    /// Build the router for `config`.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Config` if `config` does not validate.
    pub fn new(config: &BridgeConfig, backend: Arc<dyn RegionBackend>) -> Result<Self> {
        config.validate()?;
        let state = AppState {
            backend,
            cadence: config.cadence(),
            waiting_message: Arc::from(config.waiting_message.as_str()),
        };
        let router = Router::new().route(&config.path, get(ws_handler)).with_state(state);
        Ok(Self { bind: config.bind, router })
    }

    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Bind` if the address cannot be bound.
    pub async fn bind(self) -> Result<BoundServer> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|source| BridgeError::Bind { addr: self.bind, source })?;
        let local_addr =
            listener.local_addr().map_err(|source| BridgeError::Bind { addr: self.bind, source })?;

        info!(addr = %local_addr, "Telemetry server listening");
        Ok(BoundServer { listener, local_addr, router: self.router })
    }

    /// Bind and serve until Ctrl-C.
    ///
    /// Open client connections are dropped, not drained, on shutdown.
    pub async fn run(self) -> Result<()> {
        let server = self.bind().await?;
        tokio::select! {
            result = server.serve() => result,
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Ctrl-C received, shutting down"),
                    Err(e) => warn!("Failed to listen for Ctrl-C, shutting down: {}", e),
                }
                Ok(())
            }
        }
    }
}

/// A server with its socket bound, ready to accept clients.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl BoundServer {
    /// Address actually bound; differs from the configured one for port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept clients until the listener fails.
    pub async fn serve(self) -> Result<()> {
        axum::serve(self.listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|source| BridgeError::Serve { source })
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    debug!(peer = %peer, "WebSocket upgrade requested");
    ws.on_failed_upgrade(move |e| warn!(peer = %peer, "WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| stream_to_client(socket, peer, state))
}

async fn stream_to_client(socket: WebSocket, peer: SocketAddr, state: AppState) {
    let client =
        BroadcastLoop::new(state.backend, state.cadence, state.waiting_message, peer.to_string());
    let mut sink = WebSocketSink { socket };
    client.run(&mut sink).await;
}

/// [`SnapshotSink`] over an upgraded axum WebSocket.
struct WebSocketSink {
    socket: WebSocket,
}

#[async_trait::async_trait]
impl SnapshotSink for WebSocketSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| BridgeError::transport_with_source("WebSocket send failed", Box::new(e)))
    }

    async fn closed(&mut self) -> Result<()> {
        // Inbound data frames carry nothing for us; only closure matters.
        loop {
            match self.socket.recv().await {
                None | Some(Ok(Message::Close(_))) => return Ok(()),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(BridgeError::transport_with_source(
                        "WebSocket receive failed",
                        Box::new(e),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;

    fn local_config() -> BridgeConfig {
        BridgeConfig { bind: "127.0.0.1:0".parse().unwrap(), ..BridgeConfig::default() }
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let server = BridgeServer::new(&local_config(), Arc::new(InMemoryBackend::new())).unwrap();
        let bound = server.bind().await.unwrap();

        assert!(bound.local_addr().ip().is_loopback());
        assert_ne!(bound.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = BridgeConfig { bind: taken.local_addr().unwrap(), ..BridgeConfig::default() };

        let server = BridgeServer::new(&config, Arc::new(InMemoryBackend::new())).unwrap();
        let result = server.bind().await;
        assert!(matches!(result, Err(BridgeError::Bind { .. })));
    }

    #[test]
    fn invalid_path_is_rejected_before_routing() {
        for path in ["ws", "/:ws", "/{client}"] {
            let config = BridgeConfig { path: path.to_string(), ..local_config() };
            let result = BridgeServer::new(&config, Arc::new(InMemoryBackend::new()));
            assert!(matches!(result, Err(BridgeError::Config { .. })), "{path} accepted");
        }
    }
}
