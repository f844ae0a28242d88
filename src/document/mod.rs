//! Shared document storage
//!
//! The server keeps exactly one JSON document. It is an opaque object from
//! the server's point of view except for the `lastUpdated` key, which the
//! store overwrites on every write.
//!
//! ```text
//!     POST /api/data ──► DocumentStore::write ──► temp file ──rename──► shared_data.json
//!                              │
//!                         Mutex<()>  (held across the whole read or write)
//!                              │
//!     GET /api/data  ──► DocumentStore::read  ◄───────────────────────  shared_data.json
//! ```

pub mod store;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub use store::DocumentStore;

/// The shared document: a JSON object with arbitrary keys
pub type Document = Map<String, Value>;

/// Key the store stamps on every write
pub const LAST_UPDATED: &str = "lastUpdated";

/// Current time in the format stored under [`LAST_UPDATED`]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read the `lastUpdated` stamp of a document, if present
pub fn last_updated(doc: &Document) -> Option<&str> {
    doc.get(LAST_UPDATED).and_then(Value::as_str)
}

/// Interpret a request body as a document
///
/// Only JSON objects are accepted. Arrays and scalars are rejected rather
/// than having a timestamp injected into something that has no keys.
pub fn parse_document(body: &[u8]) -> crate::error::Result<Document> {
    let value: Value = serde_json::from_slice(body).map_err(crate::error::Error::malformed)?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(crate::error::Error::malformed(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
