//! Per-client broadcast loop.
//!
//! Every connected client gets its own [`BroadcastLoop`] with its own
//! [`SimReader`]. Each cycle polls all three regions, encodes the snapshot
//! and pushes it to the client, then waits out the cadence while watching
//! for the client going away. A slow or dead client only ever stalls its own
//! loop.

use crate::Result;
use crate::memory::{RegionBackend, SimReader};
use crate::snapshot::TelemetrySnapshot;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Transport-side half of a client connection.
#[async_trait::async_trait]
pub trait SnapshotSink: Send {
    /// Push one text message to the client.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Resolve once the client has closed the connection.
    ///
    /// Returns `Err` if the transport failed instead. Must be cancel safe:
    /// the loop races it against the cadence timer.
    async fn closed(&mut self) -> Result<()>;
}

/// Why a client's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ClientDisconnected,
    SendFailed,
    TransportError,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloseReason::ClientDisconnected => "client disconnected",
            CloseReason::SendFailed => "send failed",
            CloseReason::TransportError => "transport error",
        })
    }
}

/// Streams snapshots to one client at a fixed cadence.
pub struct BroadcastLoop {
    reader: SimReader,
    cadence: Duration,
    waiting_message: Arc<str>,
    peer: String,
    available: bool,
}

impl BroadcastLoop {
    pub fn new(
        backend: Arc<dyn RegionBackend>,
        cadence: Duration,
        waiting_message: Arc<str>,
        peer: impl Into<String>,
    ) -> Self {
        Self {
            reader: SimReader::new(backend),
            cadence,
            waiting_message,
            peer: peer.into(),
            available: false,
        }
    }

    /// Stream until the client goes away or the transport fails.
    pub async fn run<S: SnapshotSink + ?Sized>(mut self, sink: &mut S) -> CloseReason {
        info!(peer = %self.peer, cadence_ms = self.cadence.as_millis() as u64, "Client connected");

        let reason = loop {
            let snapshot = self.reader.poll();
            self.note_availability(&snapshot);

            match snapshot.to_wire_json(&self.waiting_message) {
                Ok(text) => {
                    if let Err(e) = sink.send_text(text).await {
                        debug!(peer = %self.peer, "Send failed: {}", e);
                        break CloseReason::SendFailed;
                    }
                    trace!(peer = %self.peer, available = self.available, "Sent snapshot");
                }
                Err(e) => warn!(peer = %self.peer, "Skipping snapshot that failed to encode: {}", e),
            }

            tokio::select! {
                closed = sink.closed() => match closed {
                    Ok(()) => break CloseReason::ClientDisconnected,
                    Err(e) => {
                        debug!(peer = %self.peer, "Transport failed: {}", e);
                        break CloseReason::TransportError;
                    }
                },
                () = tokio::time::sleep(self.cadence) => {}
            }
        };

        info!(peer = %self.peer, reason = %reason, "Client stream closed");
        reason
    }

    fn note_availability(&mut self, snapshot: &TelemetrySnapshot) {
        let available = snapshot.is_available();
        if available == self.available {
            return;
        }
        self.available = available;

        if let Some(live) = snapshot.live() {
            info!(
                peer = %self.peer,
                car = %live.statics.car_model,
                track = %live.statics.track,
                "Simulator available"
            );
        } else {
            info!(peer = %self.peer, "Simulator no longer available");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BridgeError, Region};
    use crate::layout::{GraphicsRecord, PhysicsRecord, Record, StaticRecord};
    use crate::memory::InMemoryBackend;
    use crate::snapshot::DEFAULT_WAITING_MESSAGE;
    use serde_json::Value;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    const CADENCE: Duration = Duration::from_millis(50);

    struct ChannelSink {
        tx: mpsc::Sender<String>,
    }

    #[async_trait::async_trait]
    impl SnapshotSink for ChannelSink {
        async fn send_text(&mut self, text: String) -> Result<()> {
            self.tx.send(text).await.map_err(|_| BridgeError::transport("receiver dropped"))
        }

        async fn closed(&mut self) -> Result<()> {
            self.tx.closed().await;
            Ok(())
        }
    }

    fn spawn_client(
        backend: &Arc<InMemoryBackend>,
        capacity: usize,
    ) -> (mpsc::Receiver<String>, JoinHandle<CloseReason>) {
        let (tx, rx) = mpsc::channel(capacity);
        let backend: Arc<dyn RegionBackend> = backend.clone();
        let client = BroadcastLoop::new(backend, CADENCE, Arc::from(DEFAULT_WAITING_MESSAGE), "test");
        let handle = tokio::spawn(async move {
            let mut sink = ChannelSink { tx };
            client.run(&mut sink).await
        });
        (rx, handle)
    }

    fn publish(backend: &InMemoryBackend, rpms: i32) {
        let mut physics = PhysicsRecord::zeroed();
        physics.speed_kmh = 123.4;
        physics.gear = 3;
        physics.rpms = rpms;
        backend.publish(&physics);
        backend.publish(&GraphicsRecord::zeroed());
        backend.publish(&StaticRecord::zeroed());
    }

    async fn next_message(rx: &mut mpsc::Receiver<String>) -> Value {
        let text = rx.recv().await.expect("loop ended early");
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_every_cycle() {
        let backend = Arc::new(InMemoryBackend::new());
        let (mut rx, _handle) = spawn_client(&backend, 4);

        for _ in 0..5 {
            let message = next_message(&mut rx).await;
            assert_eq!(message["connected"], false);
            assert_eq!(message["message"], DEFAULT_WAITING_MESSAGE);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn available_on_first_message() {
        let backend = Arc::new(InMemoryBackend::new());
        publish(&backend, 5000);
        let (mut rx, _handle) = spawn_client(&backend, 4);

        let message = next_message(&mut rx).await;
        assert_eq!(message["connected"], true);
        assert_eq!(message["physics"]["gear"], 3);
        assert_eq!(message["physics"]["rpms"], 5000);
        assert!((message["physics"]["speedKmh"].as_f64().unwrap() - 123.4).abs() < 1e-4);
    }

    /// Skip messages produced before the last backend change.
    async fn wait_for_connected(rx: &mut mpsc::Receiver<String>, connected: bool) -> Value {
        for _ in 0..3 {
            let message = next_message(rx).await;
            if message["connected"] == connected {
                return message;
            }
        }
        panic!("never saw connected={connected}");
    }

    #[tokio::test(start_paused = true)]
    async fn follows_simulator_start_and_exit() {
        let backend = Arc::new(InMemoryBackend::new());
        let (mut rx, _handle) = spawn_client(&backend, 1);
        assert_eq!(next_message(&mut rx).await["connected"], false);

        publish(&backend, 3000);
        let message = wait_for_connected(&mut rx, true).await;
        assert_eq!(message["physics"]["rpms"], 3000);

        backend.withdraw(Region::Physics);
        let message = wait_for_connected(&mut rx, false).await;
        assert!(message.get("physics").is_none());

        publish(&backend, 3100);
        let message = wait_for_connected(&mut rx, true).await;
        assert_eq!(message["physics"]["rpms"], 3100);
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_client_goes_away() {
        let backend = Arc::new(InMemoryBackend::new());
        let (mut rx, handle) = spawn_client(&backend, 4);
        next_message(&mut rx).await;

        drop(rx);
        assert_eq!(handle.await.unwrap(), CloseReason::ClientDisconnected);
    }

    struct BrokenSink {
        send_fails: bool,
    }

    #[async_trait::async_trait]
    impl SnapshotSink for BrokenSink {
        async fn send_text(&mut self, _text: String) -> Result<()> {
            if self.send_fails { Err(BridgeError::transport("connection reset")) } else { Ok(()) }
        }

        async fn closed(&mut self) -> Result<()> {
            if self.send_fails {
                std::future::pending::<()>().await;
            }
            Err(BridgeError::transport("protocol error"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn send_and_transport_failures_end_the_loop() {
        let backend: Arc<dyn RegionBackend> = Arc::new(InMemoryBackend::new());

        let client = BroadcastLoop::new(backend.clone(), CADENCE, Arc::from("waiting"), "a");
        assert_eq!(client.run(&mut BrokenSink { send_fails: true }).await, CloseReason::SendFailed);

        let client = BroadcastLoop::new(backend, CADENCE, Arc::from("waiting"), "b");
        assert_eq!(client.run(&mut BrokenSink { send_fails: false }).await, CloseReason::TransportError);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_client_does_not_hold_up_others() {
        let backend = Arc::new(InMemoryBackend::new());
        publish(&backend, 0);

        // Never drained: this loop blocks in its second send.
        let (_stalled_rx, stalled) = spawn_client(&backend, 1);
        let (mut rx, _handle) = spawn_client(&backend, 1);

        let mut last = -1;
        for step in 1..=10 {
            publish(&backend, step * 100);
            let rpms = next_message(&mut rx).await["physics"]["rpms"].as_i64().unwrap();
            assert!(rpms >= last, "rpms went backwards: {rpms} after {last}");
            last = rpms;
        }
        assert!(last > 0);
        assert!(!stalled.is_finished());
    }
}
