//! Engine statistics

pub mod metrics;

pub use metrics::{StatsSnapshot, SyncStats};
