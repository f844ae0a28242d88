//! Event stream state machine
//!
//! Tracks one push connection from handshake to teardown.

/// Event stream lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Response headers sent, `connected` envelope not yet queued
    Handshake,
    /// Registered and receiving heartbeats and updates
    Active,
    /// A send failed; deregistered. Terminal.
    Closing,
}

impl SessionPhase {
    /// Move to `Active`; only valid from `Handshake`
    pub fn activate(&mut self) -> bool {
        if *self == SessionPhase::Handshake {
            *self = SessionPhase::Active;
            true
        } else {
            false
        }
    }

    /// Move to `Closing` from any phase
    pub fn close(&mut self) {
        *self = SessionPhase::Closing;
    }

    /// Whether the stream is registered and live
    pub fn is_active(&self) -> bool {
        *self == SessionPhase::Active
    }
}
