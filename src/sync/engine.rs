//! Sync engine
//!
//! Ties the document store to the subscriber registry. Every handler gets an
//! `Arc<SyncEngine>`; there is no global state.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::broadcast::{BroadcastReport, Broadcaster};
use super::config::SyncConfig;
use crate::document::{last_updated, Document, DocumentStore};
use crate::error::Result;
use crate::registry::SubscriberRegistry;
use crate::stats::SyncStats;

/// Shared document plus the set of clients watching it
pub struct SyncEngine {
    store: DocumentStore,
    registry: Arc<SubscriberRegistry>,
    broadcaster: Broadcaster,

    /// Held across write and broadcast so updates fan out in write order
    publish: Mutex<()>,

    stats: SyncStats,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create an engine over `store` with default configuration
    pub fn new(store: DocumentStore) -> Self {
        Self::with_config(store, SyncConfig::default())
    }

    /// Create an engine with custom configuration
    pub fn with_config(store: DocumentStore, config: SyncConfig) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), config.send_timeout);

        Self {
            store,
            registry,
            broadcaster,
            publish: Mutex::new(()),
            stats: SyncStats::new(),
            config,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The document store
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// The subscriber registry
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Live statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Current document
    pub async fn read(&self) -> Result<Document> {
        self.store.read().await
    }

    /// Persist a new document and push it to every subscriber
    ///
    /// Returns the stamped document. Broadcast failures never fail the
    /// write; they only evict the subscribers involved.
    pub async fn update(&self, candidate: Document) -> Result<Document> {
        let _order = self.publish.lock().await;

        let document = match self.store.write(candidate).await {
            Ok(document) => document,
            Err(e) => {
                self.stats.record_failed_write();
                return Err(e);
            }
        };
        self.stats.record_write();

        let BroadcastReport { delivered, evicted } = self.broadcaster.broadcast(&document).await;
        self.stats.record_broadcast(delivered, evicted.len());

        tracing::info!(
            last_updated = last_updated(&document).unwrap_or_default(),
            delivered = delivered,
            evicted = evicted.len(),
            "Document updated"
        );

        Ok(document)
    }
}
