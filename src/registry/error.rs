//! Subscriber send errors
//!
//! Either failure means the subscriber is gone for good: it is evicted and
//! never retried.

use super::entry::SubscriberId;

/// Error returned when a frame could not be handed to a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The response body was dropped (client disconnected)
    Closed(SubscriberId),
    /// The subscriber did not drain its buffer within the send timeout
    TimedOut(SubscriberId),
}

impl SendError {
    /// Subscriber the send was addressed to
    pub fn subscriber(&self) -> SubscriberId {
        match self {
            SendError::Closed(id) | SendError::TimedOut(id) => *id,
        }
    }
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Closed(id) => write!(f, "Subscriber {} disconnected", id),
            SendError::TimedOut(id) => write!(f, "Subscriber {} send timed out", id),
        }
    }
}

impl std::error::Error for SendError {}
