//! File-backed document store
//!
//! A single async mutex serializes every read and write against the backing
//! file. Writes go to a sibling temp file which is then renamed over the
//! target, so readers only ever see the previous or the new document.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{timestamp_now, Document, LAST_UPDATED};
use crate::error::{Error, Result};

/// Collections present in the document before anything has been written
pub const DEFAULT_COLLECTIONS: &[&str] = &["familyMembers", "familyTasks"];

/// Owner of the shared document on disk
pub struct DocumentStore {
    /// Path of the persisted document
    path: PathBuf,

    /// Keys initialised to empty arrays in the default document
    default_collections: Vec<String>,

    /// Held across every read and write of `path`
    lock: Mutex<()>,
}

impl DocumentStore {
    /// Create a store backed by `path` with the default collections
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_collections(
            path,
            DEFAULT_COLLECTIONS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Create a store with a custom set of default collections
    pub fn with_collections(path: impl Into<PathBuf>, default_collections: Vec<String>) -> Self {
        Self {
            path: path.into(),
            default_collections,
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Document returned when nothing has been persisted yet
    pub fn default_document(&self) -> Document {
        let mut doc = Document::new();
        for key in &self.default_collections {
            doc.insert(key.clone(), Value::Array(Vec::new()));
        }
        doc.insert(LAST_UPDATED.to_string(), Value::String(timestamp_now()));
        doc
    }

    /// Return the current document
    pub async fn read(&self) -> Result<Document> {
        let _guard = self.lock.lock().await;

        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(self.default_document());
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to read document");
                return Err(Error::storage(e));
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(Error::storage(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(Error::storage(format!(
                "{} is not valid JSON: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Stamp `candidate` with the current time, persist it, and return it
    pub async fn write(&self, mut candidate: Document) -> Result<Document> {
        let _guard = self.lock.lock().await;

        candidate.insert(LAST_UPDATED.to_string(), Value::String(timestamp_now()));

        let contents = serde_json::to_vec_pretty(&candidate).map_err(Error::storage)?;
        let tmp = self.temp_path();

        if let Err(e) = write_file(&tmp, &contents).await {
            let _ = fs::remove_file(&tmp).await;
            tracing::error!(path = %tmp.display(), error = %e, "Failed to write document");
            return Err(Error::storage(e));
        }

        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            tracing::error!(path = %self.path.display(), error = %e, "Failed to replace document");
            return Err(Error::storage(e));
        }

        tracing::debug!(
            path = %self.path.display(),
            bytes = contents.len(),
            "Document persisted"
        );

        Ok(candidate)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "document".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}
