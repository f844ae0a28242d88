//! Subscriber entries
//!
//! A subscriber is the write side of one SSE response body. The body itself
//! is owned by hyper; dropping it closes the channel and every later send
//! fails with [`SendError::Closed`].

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::SendError;

/// Unique identifier of a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One active push connection
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: SubscriberId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// When the handshake completed
    pub connected_at: Instant,

    tx: mpsc::Sender<Bytes>,

    /// Shared by every clone; cancelled when the registry drops this entry
    evicted: CancellationToken,
}

impl Subscriber {
    /// Create a subscriber writing into `tx`
    pub fn new(id: SubscriberId, peer_addr: SocketAddr, tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            peer_addr,
            connected_at: Instant::now(),
            tx,
            evicted: CancellationToken::new(),
        }
    }

    /// Subscriber ID
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Queue a frame for the connection
    ///
    /// Waits at most `timeout` for room in the connection's buffer, so a
    /// stalled peer is detected instead of blocking the caller forever.
    pub async fn send(&self, frame: Bytes, timeout: Duration) -> Result<(), SendError> {
        match tokio::time::timeout(timeout, self.tx.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendError::Closed(self.id)),
            Err(_) => Err(SendError::TimedOut(self.id)),
        }
    }

    /// Resolves once the connection's body has been dropped
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// Whether the connection's body has already been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Mark the subscriber as evicted, waking [`Subscriber::evicted`]
    pub fn evict(&self) {
        self.evicted.cancel();
    }

    /// Resolves once the subscriber has been evicted
    pub async fn evicted(&self) {
        self.evicted.cancelled().await
    }

    /// Whether the subscriber has been evicted
    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }

    /// Time since the handshake completed
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080)
    }

    #[tokio::test]
    async fn test_send_delivers() {
        let (tx, mut rx) = mpsc::channel(4);
        let sub = Subscriber::new(SubscriberId(1), addr(), tx);

        sub.send(Bytes::from_static(b"hello"), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_send_to_dropped_receiver_fails() {
        let (tx, rx) = mpsc::channel(4);
        let sub = Subscriber::new(SubscriberId(7), addr(), tx);
        drop(rx);

        let err = sub
            .send(Bytes::from_static(b"x"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, SendError::Closed(SubscriberId(7)));
        assert!(sub.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_to_full_buffer_times_out() {
        let (tx, _rx) = mpsc::channel(1);
        let sub = Subscriber::new(SubscriberId(3), addr(), tx);

        sub.send(Bytes::from_static(b"a"), Duration::from_secs(1))
            .await
            .unwrap();
        let err = sub
            .send(Bytes::from_static(b"b"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, SendError::TimedOut(SubscriberId(3)));
    }

    #[test]
    fn test_closed_resolves_when_receiver_drops() {
        let (tx, rx) = mpsc::channel::<Bytes>(1);
        let sub = Subscriber::new(SubscriberId(4), addr(), tx);

        let mut closed = tokio_test::task::spawn(sub.closed());
        tokio_test::assert_pending!(closed.poll());

        drop(rx);
        assert!(closed.is_woken());
        tokio_test::assert_ready!(closed.poll());
    }

    #[test]
    fn test_evict_wakes_every_clone() {
        let (tx, _rx) = mpsc::channel::<Bytes>(1);
        let sub = Subscriber::new(SubscriberId(5), addr(), tx);
        let clone = sub.clone();

        let mut evicted = tokio_test::task::spawn(clone.evicted());
        tokio_test::assert_pending!(evicted.poll());

        sub.evict();
        assert!(evicted.is_woken());
        tokio_test::assert_ready!(evicted.poll());
        assert!(clone.is_evicted());
    }
}
