//! Configuration management for the to-do application.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::persistence::DEFAULT_STORAGE_KEY;
use composable_todo_runtime::DEFAULT_BROADCAST_CAPACITY;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from [`Config::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `TODO_STORAGE_KEY` was set to an empty string
    #[error("storage key must not be empty")]
    EmptyStorageKey,

    /// `TODO_BROADCAST_CAPACITY` was zero
    #[error("broadcast capacity must be at least 1")]
    ZeroBroadcastCapacity,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Key the list is stored under (`TODO_STORAGE_KEY`, default `@todos`)
    pub storage_key: String,
    /// File backing the key-value store (`TODO_DATA_FILE`, default `todos.json`)
    pub data_file: PathBuf,
    /// How long shutdown waits for pending saves (`TODO_SHUTDOWN_TIMEOUT_SECS`, default 5)
    pub shutdown_timeout: Duration,
    /// Capacity of the observer channel (`TODO_BROADCAST_CAPACITY`, default 64)
    pub broadcast_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            storage_key: env::var("TODO_STORAGE_KEY").unwrap_or(defaults.storage_key),
            data_file: env::var("TODO_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            shutdown_timeout: env::var("TODO_SHUTDOWN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
            broadcast_capacity: env::var("TODO_BROADCAST_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.broadcast_capacity),
        }
    }

    /// Check the values the runtime cannot work with
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyStorageKey`] if the storage key is empty
    /// - [`ConfigError::ZeroBroadcastCapacity`] if the broadcast capacity is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }

        if self.broadcast_capacity == 0 {
            return Err(ConfigError::ZeroBroadcastCapacity);
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_file: PathBuf::from("todos.json"),
            shutdown_timeout: Duration::from_secs(5),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}
