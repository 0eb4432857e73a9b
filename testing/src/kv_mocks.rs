//! In-memory key-value storage for fast, deterministic tests.
//!
//! [`InMemoryKeyValueStore`] keeps blobs in a `HashMap` and lets a test
//! switch reads or writes into failure mode, count writes, and seed raw
//! (possibly corrupt) blobs.

#![allow(clippy::missing_panics_doc)] // Lock poisoning is recovered, never panics

use composable_todo_core::kv::{KeyValueStore, StorageError, StorageFuture};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory key-value store for testing persistence.
///
/// Cloning shares the underlying map and switches.
///
/// # Example
///
/// ```
/// use composable_todo_testing::InMemoryKeyValueStore;
/// use composable_todo_core::kv::KeyValueStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryKeyValueStore::new();
/// store.set("@todos", b"[]".to_vec()).await?;
/// assert_eq!(store.get("@todos").await?, Some(b"[]".to_vec()));
/// assert_eq!(store.write_count(), 1);
///
/// store.fail_writes(true);
/// assert!(store.set("@todos", b"[]".to_vec()).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryKeyValueStore {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads fail (or succeed again)
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Store bytes directly, bypassing failure injection and the write counter
    ///
    /// Useful for seeding a prior session's data or a corrupt blob.
    pub fn insert_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }

    /// Read bytes directly, bypassing failure injection
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Check if a key has been written
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("injected read failure".to_string()));
            }
            Ok(self.get_raw(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("injected write failure".to_string()));
            }
            self.insert_raw(key, value);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
