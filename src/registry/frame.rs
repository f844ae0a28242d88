//! Push envelopes and their SSE framing
//!
//! Every message on an event stream is a small JSON object tagged by `type`,
//! written as a single SSE frame: `data: <json>\n\n`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Message sent to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// First message after the handshake
    Connected { message: String },
    /// Periodic liveness signal
    Heartbeat,
    /// The shared document changed
    DataUpdate { data: Document },
}

impl Envelope {
    /// Connected envelope with the default greeting
    pub fn connected() -> Self {
        Envelope::Connected {
            message: "connected".to_string(),
        }
    }

    /// Serialize into one SSE frame
    ///
    /// The JSON is compact, so it never contains a newline and needs only a
    /// single `data:` line.
    pub fn to_frame(&self) -> Bytes {
        // Serializing a map of `Value`s with string keys cannot fail
        let json = serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"));

        let mut frame = String::with_capacity(json.len() + 8);
        frame.push_str("data: ");
        frame.push_str(&json);
        frame.push_str("\n\n");
        Bytes::from(frame)
    }
}
