//! Statistics for the sync engine

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters, updated as the engine runs
#[derive(Debug)]
pub struct SyncStats {
    started_at: Instant,
    writes: AtomicU64,
    failed_writes: AtomicU64,
    broadcasts: AtomicU64,
    deliveries: AtomicU64,
    evictions: AtomicU64,
    sessions: AtomicU64,
}

impl SyncStats {
    /// Create zeroed counters; uptime starts now
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            writes: AtomicU64::new(0),
            failed_writes: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            sessions: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_write(&self) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_broadcast(&self, delivered: usize, evicted: usize) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_session(&self) {
        self.sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.started_at.elapsed(),
            writes: self.writes.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            total_sessions: self.sessions.load(Ordering::Relaxed),
        }
    }
}

impl Default for SyncStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`SyncStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Time since the engine was created
    pub uptime: Duration,
    /// Successful document writes
    pub writes: u64,
    /// Writes rejected by the store
    pub failed_writes: u64,
    /// Broadcast passes run
    pub broadcasts: u64,
    /// Frames handed to subscribers by broadcasts
    pub deliveries: u64,
    /// Subscribers dropped after a failed send
    pub evictions: u64,
    /// Event streams ever opened
    pub total_sessions: u64,
}
