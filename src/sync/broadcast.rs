//! Broadcast fan-out
//!
//! One `data_update` envelope is serialized per write and the same `Bytes`
//! handed to every subscriber in a registry snapshot. Sends run concurrently
//! and are each bounded by the send timeout; whoever fails is evicted after
//! the pass.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::join_all;

use crate::document::Document;
use crate::registry::{Envelope, SubscriberId, SubscriberRegistry};

/// Outcome of one broadcast pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Subscribers that accepted the frame
    pub delivered: usize,
    /// Subscribers removed because their send failed
    pub evicted: Vec<SubscriberId>,
}

/// Pushes document updates to every registered subscriber
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    send_timeout: Duration,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`
    pub fn new(registry: Arc<SubscriberRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Send a `data_update` envelope for `document` to every subscriber
    pub async fn broadcast(&self, document: &Document) -> BroadcastReport {
        let frame = Envelope::DataUpdate {
            data: document.clone(),
        }
        .to_frame();

        self.send_frame(frame).await
    }

    /// Send a pre-encoded frame to every subscriber and evict failures
    pub async fn send_frame(&self, frame: Bytes) -> BroadcastReport {
        let subscribers = self.registry.snapshot().await;
        if subscribers.is_empty() {
            return BroadcastReport::default();
        }

        let sends = subscribers
            .iter()
            .map(|subscriber| subscriber.send(frame.clone(), self.send_timeout));
        let results = join_all(sends).await;

        let mut report = BroadcastReport::default();
        for result in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::debug!(error = %e, "Broadcast send failed");
                    report.evicted.push(e.subscriber());
                }
            }
        }

        for id in &report.evicted {
            self.registry.remove(*id).await;
        }

        tracing::debug!(
            delivered = report.delivered,
            evicted = report.evicted.len(),
            bytes = frame.len(),
            "Broadcast complete"
        );

        report
    }
}
