//! Push connection lifecycle
//!
//! `Handshake → Active → Closing`. A session never leaves `Closing`; a
//! client that wants updates again opens a new event stream.

pub mod state;
pub mod stream;

pub use state::SessionPhase;
pub use stream::EventSession;
