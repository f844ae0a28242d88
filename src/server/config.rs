//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::document::store::DEFAULT_COLLECTIONS;
use crate::sync::SyncConfig;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default request body limit (10 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Largest accepted `POST /api/data` body in bytes
    pub max_body_size: usize,

    /// File holding the shared document
    pub data_file: PathBuf,

    /// Keys initialised to empty arrays before the first write
    pub default_collections: Vec<String>,

    /// Directory served for non-API `GET` requests
    pub static_dir: PathBuf,

    /// Event stream settings
    pub sync: SyncConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            tcp_nodelay: true,  // Keeps event frames from being held back
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            data_file: PathBuf::from("shared_data.json"),
            default_collections: DEFAULT_COLLECTIONS.iter().map(|s| s.to_string()).collect(),
            static_dir: PathBuf::from("."),
            sync: SyncConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the request body limit
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Set the document file
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    /// Set the default collections
    pub fn default_collections<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_collections = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the static file directory
    pub fn static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = path.into();
        self
    }

    /// Set the heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.sync = self.sync.heartbeat_interval(interval);
        self
    }

    /// Set the subscriber send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.sync = self.sync.send_timeout(timeout);
        self
    }

    /// Set the per-connection event buffer
    pub fn event_buffer(mut self, frames: usize) -> Self {
        self.sync = self.sync.event_buffer(frames);
        self
    }
}
