//! Per-connection event stream
//!
//! Each `GET /api/events` gets an [`EventSession`]. The session queues the
//! `connected` envelope, registers its subscriber, then runs a heartbeat
//! task bound to the connection. Document updates reach the same connection
//! through the broadcaster, independently of the heartbeat.
//!
//! The first failed send ends the session. A failed heartbeat deregisters
//! the subscriber directly; a failed broadcast send evicts it from the
//! registry, which wakes the session. Either way the session drops its
//! sender and the response body ends.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::state::SessionPhase;
use crate::registry::{Envelope, Subscriber, SubscriberId};
use crate::sync::SyncEngine;

/// One push connection
pub struct EventSession {
    engine: Arc<SyncEngine>,
    subscriber: Subscriber,
    phase: SessionPhase,
}

impl EventSession {
    /// Handshake, register, and spawn the heartbeat task
    ///
    /// Returns the receiving half that becomes the response body. The
    /// `connected` envelope is already queued on it. A peer that vanishes
    /// before the body is polled is caught by [`Subscriber::closed`] in the
    /// heartbeat loop.
    pub async fn start(engine: Arc<SyncEngine>, peer_addr: SocketAddr) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(engine.config().event_buffer);
        let id = engine.registry().next_id();
        let mut session = EventSession::new(engine, Subscriber::new(id, peer_addr, tx));

        session.handshake().await;
        session.activate().await;
        tokio::spawn(session.run());

        rx
    }

    fn new(engine: Arc<SyncEngine>, subscriber: Subscriber) -> Self {
        Self {
            engine,
            subscriber,
            phase: SessionPhase::Handshake,
        }
    }

    /// Subscriber ID of this session
    pub fn id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    async fn handshake(&mut self) {
        let timeout = self.engine.config().send_timeout;

        if let Err(e) = self.subscriber.send(Envelope::connected().to_frame(), timeout).await {
            tracing::debug!(subscriber = %self.id(), error = %e, "Event stream handshake failed");
            self.phase.close();
        }
    }

    async fn activate(&mut self) {
        if self.phase.activate() {
            self.engine.stats().record_session();
            self.engine.registry().add(self.subscriber.clone()).await;
        }
    }

    /// Heartbeat loop; returns once the connection is gone
    pub async fn run(mut self) {
        let config = self.engine.config().clone();
        let heartbeat = Envelope::Heartbeat.to_frame();

        let mut ticker = tokio::time::interval(config.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.phase.is_active() {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.subscriber.is_evicted() {
                        break;
                    }

                    let sent = self.subscriber.send(heartbeat.clone(), config.send_timeout).await;
                    if let Err(e) = sent {
                        tracing::debug!(subscriber = %self.id(), error = %e, "Heartbeat failed");
                        break;
                    }
                }
                _ = self.subscriber.closed() => {
                    tracing::debug!(subscriber = %self.id(), "Event stream closed by client");
                    break;
                }
                // Removed after a failed broadcast send
                _ = self.subscriber.evicted() => {
                    tracing::debug!(subscriber = %self.id(), "Subscriber evicted");
                    break;
                }
            }
        }

        self.close().await;
    }

    async fn close(&mut self) {
        self.phase.close();
        self.engine.registry().remove(self.id()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;
    use crate::sync::SyncConfig;
    use serde_json::{json, Value};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tokio::time::Instant;

    fn peer() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 51000)
    }

    fn engine(dir: &tempfile::TempDir, heartbeat: Duration) -> Arc<SyncEngine> {
        let store = DocumentStore::new(dir.path().join("shared_data.json"));
        let config = SyncConfig::default().heartbeat_interval(heartbeat);
        Arc::new(SyncEngine::with_config(store, config))
    }

    fn decode(frame: &[u8]) -> Value {
        let text = std::str::from_utf8(frame).unwrap();
        serde_json::from_str(text.trim_start_matches("data: ").trim_end()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_then_heartbeat() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, Duration::from_secs(60));

        let mut rx = EventSession::start(Arc::clone(&engine), peer()).await;

        assert_eq!(
            decode(&rx.recv().await.unwrap()),
            json!({"type": "connected", "message": "connected"})
        );
        assert_eq!(decode(&rx.recv().await.unwrap()), json!({"type": "heartbeat"}));
        assert_eq!(engine.registry().len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_without_updates() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, Duration::from_secs(60));

        let mut rx = EventSession::start(Arc::clone(&engine), peer()).await;
        rx.recv().await.unwrap(); // connected
        rx.recv().await.unwrap(); // immediate heartbeat

        for _ in 0..3 {
            let start = Instant::now();
            let frame = rx.recv().await.unwrap();
            assert_eq!(decode(&frame), json!({"type": "heartbeat"}));
            assert!(start.elapsed() >= Duration::from_secs(60));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_share_the_stream() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, Duration::from_secs(60));

        let mut rx = EventSession::start(Arc::clone(&engine), peer()).await;
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        let mut doc = crate::document::Document::new();
        doc.insert("familyMembers".into(), json!(["kim"]));
        engine.update(doc).await.unwrap();

        let envelope = decode(&rx.recv().await.unwrap());
        assert_eq!(envelope["type"], "data_update");
        assert_eq!(envelope["data"]["familyMembers"], json!(["kim"]));
    }

    #[tokio::test]
    async fn test_client_disconnect_deregisters() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir, Duration::from_secs(60));

        let rx = EventSession::start(Arc::clone(&engine), peer()).await;
        assert_eq!(engine.registry().len().await, 1);

        drop(rx);

        // The session notices the closed body and removes itself
        for _ in 0..100 {
            if engine.registry().is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(engine.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_stalled_subscriber_stream_closes_after_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("shared_data.json"));
        let config = SyncConfig::default()
            .event_buffer(2)
            .send_timeout(Duration::from_millis(100));
        let engine = Arc::new(SyncEngine::with_config(store, config));

        // connected + immediate heartbeat fill the buffer
        let mut rx = EventSession::start(Arc::clone(&engine), peer()).await;
        for _ in 0..50 {
            if engine.registry().len().await == 1 && rx.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let start = Instant::now();
        engine.update(crate::document::Document::new()).await.unwrap();
        assert!(engine.registry().is_empty().await);

        let mut frames = 0;
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.recv().await.is_some() {
                frames += 1;
            }
        })
        .await;

        assert!(closed.is_ok(), "evicted stream left open");
        assert_eq!(frames, 2);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
