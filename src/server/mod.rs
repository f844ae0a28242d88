//! HTTP server
//!
//! ```text
//!   TcpListener ──accept──► hyper http1 connection ──► Router
//!                                                        ├─ GET  /api/data    → SyncEngine::read
//!                                                        ├─ POST /api/data    → SyncEngine::update
//!                                                        ├─ GET  /api/events  → EventSession
//!                                                        ├─ OPTIONS *         → CORS preflight
//!                                                        └─ GET  *            → StaticFiles
//! ```

pub mod config;
pub mod listener;
pub mod response;
pub mod router;
pub mod static_files;

pub use config::ServerConfig;
pub use listener::SyncServer;
pub use router::{Route, Router};
pub use static_files::StaticFiles;
