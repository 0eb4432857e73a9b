//! Key-value storage abstraction for local persistence.
//!
//! The application persists its whole state as a single opaque blob under one
//! key. This module defines the minimal asynchronous capability it consumes:
//!
//! - `get(key)` returns the stored blob, or `None` if the key was never written
//! - `set(key, blob)` overwrites the value stored under `key`
//!
//! There is no partial update, no listing, and no versioning.
//!
//! # Implementations
//!
//! - `FileKeyValueStore` (in the `todo` crate): JSON file on local disk
//! - `InMemoryKeyValueStore` (in `composable-todo-testing`): fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! The trait returns `Pin<Box<dyn Future>>` instead of using `async fn` so it
//! can be held as `Arc<dyn KeyValueStore>` inside an environment and captured
//! by effects.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`KeyValueStore`] operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Errors that can occur during key-value storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying I/O failure (disk, permissions, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage backend is not reachable or refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend's own container format could not be read or written.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Asynchronous key-value blob store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be shared between the
/// store runtime and its spawned effect tasks.
///
/// # Ordering
///
/// Callers may assume FIFO behavior per key: a `set` that completes before
/// another `set` on the same key begins is never reordered after it.
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Some(bytes)` if the key has been written
    /// - `None` if the key was never written
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StorageFuture<'a, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapStore(Mutex<HashMap<String, Vec<u8>>>);

    impl KeyValueStore for MapStore {
        fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<Vec<u8>>> {
            Box::pin(async move {
                let map = self
                    .0
                    .lock()
                    .map_err(|e| StorageError::Unavailable(e.to_string()))?;
                Ok(map.get(key).cloned())
            })
        }

        fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> StorageFuture<'a, ()> {
            Box::pin(async move {
                self.0
                    .lock()
                    .map_err(|e| StorageError::Unavailable(e.to_string()))?
                    .insert(key.to_string(), value);
                Ok(())
            })
        }
    }

    #[test]
    fn trait_is_usable_as_object() {
        let store: Box<dyn KeyValueStore> = Box::new(MapStore(Mutex::new(HashMap::new())));

        tokio_test::block_on(async {
            assert!(store.get("@todos").await.unwrap().is_none());
            store.set("@todos", b"[]".to_vec()).await.unwrap();
            assert_eq!(store.get("@todos").await.unwrap(), Some(b"[]".to_vec()));
        });
    }

    #[test]
    fn io_error_converts() {
        let error: StorageError = std::io::Error::other("disk gone").into();
        assert!(error.to_string().contains("disk gone"));
    }
}
