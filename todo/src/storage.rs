//! File-backed key-value store.
//!
//! All keys live in one JSON object file, `{ "<key>": "<blob>" }`, with
//! blobs stored as UTF-8 strings so the file stays human-readable. A missing
//! file means every key is absent. Writes go to a temporary sibling file
//! which is then renamed over the original, so a crash mid-write never
//! leaves a truncated file behind. A failed write removes the temporary file.

use composable_todo_core::kv::{KeyValueStore, StorageError, StorageFuture};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Entries = BTreeMap<String, String>;

/// Key-value store persisted to a single JSON file
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Creates a store backed by `path` (created on first write)
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(error) => return Err(error.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let written = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(error) => Err(error),
        };

        if let Err(error) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(error.into());
        }
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let mut entries = self.read_entries().await?;
            Ok(entries.remove(key).map(String::into_bytes))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let value = String::from_utf8(value)
                .map_err(|e| StorageError::Serialization(format!("blob for {key} is not UTF-8: {e}")))?;

            // Read-modify-write must not interleave with another set
            let _guard = self.write_lock.lock().await;
            let mut entries = self.read_entries().await?;
            entries.insert(key.to_string(), value);
            self.write_entries(&entries).await?;

            tracing::trace!(path = %self.path.display(), key, "Stored blob");
            Ok(())
        })
    }
}
