//! A locally persisted to-do list built on Composable Todo.
//!
//! Users add, edit, toggle, filter, and delete short text items. The list
//! lives in a [`Store`](composable_todo_runtime::Store) driven by
//! [`TodoReducer`]; every mutation is applied immediately and followed by a
//! background save of the whole list, as one JSON blob, through the
//! [`PersistenceGateway`].
//!
//! - [`types`]: `Todo`, `Filter`, `EditSession`, `TodoState`, `TodoAction`
//! - [`reducer`]: validation, mutation, and the load/save effects
//! - [`persistence`]: the JSON blob gateway over a key-value store
//! - [`projection`]: filtered list, items left, has-completed
//! - [`app`]: the `TodoApp` handle a view layer holds
//! - [`storage`]: file-backed key-value store
//! - [`config`]: environment configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use todo::{Config, TodoApp};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = TodoApp::open(&Config::from_env())?;
//! app.load().await?.wait().await;
//!
//! app.add_todo("Buy milk").await?;
//! println!("{} items left", app.items_left().await);
//!
//! // Wait for the last save before exiting
//! app.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod persistence;
pub mod projection;
pub mod reducer;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use app::{TodoApp, TodoStore};
pub use config::{Config, ConfigError};
pub use persistence::{PersistenceError, PersistenceGateway, WriteOutcome};
pub use projection::TodoView;
pub use reducer::{TodoEnvironment, TodoReducer};
pub use storage::FileKeyValueStore;
pub use types::{EditSession, Filter, Todo, TodoAction, TodoId, TodoState};

/// Describe every metric this application and its runtime emit
pub fn register_metrics() {
    composable_todo_runtime::metrics::register_metrics();
    persistence::register_metrics();
}
