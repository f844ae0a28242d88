//! Synchronization engine
//!
//! ```text
//!   update(doc) ──► DocumentStore::write ──► Broadcaster::broadcast
//!                                                  │ snapshot()
//!                                                  ▼
//!                                          SubscriberRegistry
//!                                                  │ failed sends
//!                                                  ▼
//!                                               remove()
//! ```

pub mod broadcast;
pub mod config;
pub mod engine;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use config::SyncConfig;
pub use engine::SyncEngine;
