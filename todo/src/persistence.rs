//! Persistence gateway: the whole list as one JSON blob under one key.
//!
//! Every write is a full snapshot replace; there is no partial update, no
//! versioning, and no migration. Any shape mismatch on read is an error.
//!
//! Writes are tagged with the reducer's revision. They are serialized, and a
//! snapshot older than one already written is skipped, so a slow save never
//! overwrites a newer *written* snapshot. A newer snapshot whose write failed
//! does not count: an older one may still land after it.

use crate::types::Todo;
use composable_todo_core::kv::{KeyValueStore, StorageError};
use metrics::{counter, describe_counter};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Key the list is stored under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "@todos";

/// Snapshot writes, labelled by `outcome` (`written`, `superseded`, `failed`)
pub const SAVES_TOTAL: &str = "todo.saves.total";

/// Loads, labelled by `outcome` (`found`, `empty`, `failed`)
pub const LOADS_TOTAL: &str = "todo.loads.total";

/// Describe the gateway's metrics to an installed recorder.
pub fn register_metrics() {
    describe_counter!(SAVES_TOTAL, "Snapshot writes attempted, by outcome");
    describe_counter!(LOADS_TOTAL, "Persisted list reads, by outcome");
}

/// Errors that can occur reading or writing the persisted list
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The key-value store failed
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored blob is not a JSON array of todos
    #[error("Corrupt todo data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Result of a [`PersistenceGateway::write`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The snapshot was stored
    Written,
    /// A newer revision had already been stored; nothing was written
    Superseded,
}

/// Reads and writes the to-do list through a [`KeyValueStore`]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    key: String,
    last_written: Mutex<Option<u64>>,
}

impl PersistenceGateway {
    /// Creates a gateway storing the list under `key`
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            last_written: Mutex::new(None),
        }
    }

    /// Creates a gateway using [`DEFAULT_STORAGE_KEY`]
    #[must_use]
    pub fn with_default_key(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_STORAGE_KEY)
    }

    /// The key the list is stored under
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the persisted list
    ///
    /// Returns `Ok(None)` if nothing was ever written.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Storage`] if the store fails
    /// - [`PersistenceError::Corrupt`] if the blob does not decode
    pub async fn read(&self) -> Result<Option<Vec<Todo>>, PersistenceError> {
        let blob = match self.store.get(&self.key).await {
            Ok(blob) => blob,
            Err(error) => {
                counter!(LOADS_TOTAL, "outcome" => "failed").increment(1);
                return Err(error.into());
            },
        };

        let Some(bytes) = blob else {
            tracing::debug!(key = %self.key, "No persisted todos");
            counter!(LOADS_TOTAL, "outcome" => "empty").increment(1);
            return Ok(None);
        };

        match serde_json::from_slice::<Vec<Todo>>(&bytes) {
            Ok(todos) => {
                tracing::debug!(key = %self.key, count = todos.len(), "Read persisted todos");
                counter!(LOADS_TOTAL, "outcome" => "found").increment(1);
                Ok(Some(todos))
            },
            Err(error) => {
                counter!(LOADS_TOTAL, "outcome" => "failed").increment(1);
                Err(error.into())
            },
        }
    }

    /// Writes `todos` as the snapshot for `revision`
    ///
    /// Writes are serialized. If a later revision has already been written
    /// successfully the snapshot is dropped and [`WriteOutcome::Superseded`]
    /// is returned.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Corrupt`] if the list cannot be encoded
    /// - [`PersistenceError::Storage`] if the store fails
    pub async fn write(
        &self,
        revision: u64,
        todos: &[Todo],
    ) -> Result<WriteOutcome, PersistenceError> {
        let mut last_written = self.last_written.lock().await;

        if last_written.is_some_and(|last| revision < last) {
            tracing::debug!(revision, last_written = ?*last_written, "Skipping superseded snapshot");
            counter!(SAVES_TOTAL, "outcome" => "superseded").increment(1);
            return Ok(WriteOutcome::Superseded);
        }

        let blob = serde_json::to_vec(todos)?;

        if let Err(error) = self.store.set(&self.key, blob).await {
            counter!(SAVES_TOTAL, "outcome" => "failed").increment(1);
            return Err(error.into());
        }

        *last_written = Some(revision);
        tracing::debug!(key = %self.key, revision, count = todos.len(), "Wrote todos");
        counter!(SAVES_TOTAL, "outcome" => "written").increment(1);
        Ok(WriteOutcome::Written)
    }
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
