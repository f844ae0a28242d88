//! # docsync
//!
//! A small real-time synchronization server. Clients read and write one
//! shared JSON document over HTTP, and every client holding an event stream
//! is pushed each new version as it is saved.
//!
//! ```rust,ignore
//! use docsync::{ServerConfig, SyncServer};
//!
//! let config = ServerConfig::default().data_file("shared_data.json");
//! SyncServer::new(config).run().await?;
//! ```

pub mod document;
pub mod error;
pub mod net;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;
pub mod sync;

pub use document::{Document, DocumentStore};
pub use error::{Error, ErrorKind, Result};
pub use registry::{Envelope, Subscriber, SubscriberId, SubscriberRegistry};
pub use server::{ServerConfig, SyncServer};
pub use session::EventSession;
pub use sync::{SyncConfig, SyncEngine};
