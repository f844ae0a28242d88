//! Subscriber registry implementation
//!
//! The central collection of live push connections. Broadcasts iterate a
//! snapshot, never the live map, so connections can come and go while a
//! fan-out is in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::entry::{Subscriber, SubscriberId};

/// Registry of all active subscribers
///
/// Thread-safe via `RwLock`. Snapshots take the read lock only for as long
/// as it takes to clone the handles.
pub struct SubscriberRegistry {
    /// Map of subscriber ID to subscriber
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,

    /// Next ID to hand out
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh subscriber ID
    pub fn next_id(&self) -> SubscriberId {
        SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a subscriber
    pub async fn add(&self, subscriber: Subscriber) -> SubscriberId {
        let id = subscriber.id();
        let peer = subscriber.peer_addr;

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, subscriber);

        tracing::info!(
            subscriber = %id,
            peer = %peer,
            subscribers = subscribers.len(),
            "Subscriber added"
        );

        id
    }

    /// Deregister a subscriber and signal its session to close
    ///
    /// Returns `false` if it was already gone.
    pub async fn remove(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;

        match subscribers.remove(&id) {
            Some(subscriber) => {
                subscriber.evict();
                tracing::info!(
                    subscriber = %id,
                    peer = %subscriber.peer_addr,
                    connected_secs = subscriber.duration().as_secs(),
                    subscribers = subscribers.len(),
                    "Subscriber removed"
                );
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of all subscribers, ordered by ID
    pub async fn snapshot(&self) -> Vec<Subscriber> {
        let subscribers = self.subscribers.read().await;
        let mut snapshot: Vec<Subscriber> = subscribers.values().cloned().collect();
        drop(subscribers);

        snapshot.sort_by_key(Subscriber::id);
        snapshot
    }

    /// Whether a subscriber is registered
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }

    /// Number of registered subscribers
    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Whether no subscriber is registered
    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
