//! Subscriber registry for push fan-out
//!
//! The registry tracks every open event stream. Each entry holds the sending
//! half of a bounded channel whose receiving half is the SSE response body.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<SubscriberRegistry>
//!                    ┌──────────────────────────┐
//!                    │ subscribers: HashMap<Id, │
//!                    │   Subscriber {           │
//!                    │     tx: mpsc::Sender,    │
//!                    │   }                      │
//!                    │ >                        │
//!                    └────────────┬─────────────┘
//!                                 │ snapshot()
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!    [Subscriber]            [Subscriber]            [Subscriber]
//!    tx.send(frame)          tx.send(frame)          tx.send(frame)
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    StreamBody ──► TCP      StreamBody ──► TCP      StreamBody ──► TCP
//! ```
//!
//! Frames are `bytes::Bytes`, so a broadcast serializes once and every
//! subscriber shares the same allocation.

pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use entry::{Subscriber, SubscriberId};
pub use error::SendError;
pub use frame::Envelope;
pub use store::SubscriberRegistry;
