//! Application facade over the to-do [`Store`].
//!
//! `TodoApp` is the explicit handle a view layer holds: it exposes the
//! user-facing operations, read-only projections, and a change feed. There
//! is no global state; clone the app to share it.

use crate::config::{Config, ConfigError};
use crate::persistence::PersistenceGateway;
use crate::projection::{self, TodoView};
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::storage::FileKeyValueStore;
use crate::types::{EditSession, Filter, Todo, TodoAction, TodoId, TodoState};
use composable_todo_core::environment::SystemClock;
use composable_todo_runtime::{EffectHandle, Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// The runtime store specialised for the to-do list
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Handle to a running to-do list
///
/// Mutating operations apply to state before they return; the save they
/// trigger runs in the background. Await the returned [`EffectHandle`] to
/// wait for it (tests do, a UI usually does not).
#[derive(Clone)]
pub struct TodoApp {
    store: TodoStore,
}

impl TodoApp {
    /// Wraps an existing store
    #[must_use]
    pub const fn new(store: TodoStore) -> Self {
        Self { store }
    }

    /// Creates an app with an empty list over `environment`
    ///
    /// # Panics
    ///
    /// Panics if `broadcast_capacity` is zero.
    #[must_use]
    pub fn with_environment(environment: TodoEnvironment, broadcast_capacity: usize) -> Self {
        Self::new(Store::with_broadcast_capacity(
            TodoState::new(),
            TodoReducer::new(),
            environment,
            broadcast_capacity,
        ))
    }

    /// Creates an app persisting to the file named in `config`
    ///
    /// Nothing is read until [`TodoApp::load`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn open(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let storage = Arc::new(FileKeyValueStore::new(&config.data_file));
        let gateway = Arc::new(PersistenceGateway::new(storage, config.storage_key.clone()));
        let environment = TodoEnvironment::new(Arc::new(SystemClock), gateway);

        tracing::info!(
            data_file = %config.data_file.display(),
            key = %config.storage_key,
            "Opened todo list"
        );

        Ok(Self::with_environment(environment, config.broadcast_capacity))
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodoStore {
        &self.store
    }

    // ========== Operations ==========

    /// Reads the persisted list, replacing the in-memory one
    ///
    /// Changes made before the read completes are merged after the stored
    /// items and saved once it does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn load(&self) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::Load).await
    }

    /// Appends a todo; whitespace-only text is ignored
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn add_todo(&self, text: impl Into<String>) -> Result<EffectHandle, StoreError> {
        self.store
            .send(TodoAction::AddTodo { text: text.into() })
            .await
    }

    /// Flips a todo's completed flag
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn toggle_todo(&self, id: TodoId) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::ToggleTodo { id }).await
    }

    /// Removes a todo
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn delete_todo(&self, id: TodoId) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::DeleteTodo { id }).await
    }

    /// Starts editing a todo
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn start_edit(&self, id: TodoId) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::StartEdit { id }).await
    }

    /// Updates the working text of the edit session
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn edit_text_changed(
        &self,
        text: impl Into<String>,
    ) -> Result<EffectHandle, StoreError> {
        self.store
            .send(TodoAction::EditTextChanged { text: text.into() })
            .await
    }

    /// Commits `text` as the edited todo's new text
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn save_edit(&self, text: impl Into<String>) -> Result<EffectHandle, StoreError> {
        self.store
            .send(TodoAction::SaveEdit { text: text.into() })
            .await
    }

    /// Commits the current working text
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn commit_edit(&self) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::CommitEdit).await
    }

    /// Abandons the edit session
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn cancel_edit(&self) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::CancelEdit).await
    }

    /// Removes every completed todo
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn clear_completed(&self) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::ClearCompleted).await
    }

    /// Changes which todos [`TodoApp::filtered_todos`] returns
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after shutdown.
    pub async fn set_filter(&self, filter: Filter) -> Result<EffectHandle, StoreError> {
        self.store.send(TodoAction::SetFilter { filter }).await
    }

    // ========== Accessors ==========

    /// Todos passing the current filter
    pub async fn filtered_todos(&self) -> Vec<Todo> {
        self.store
            .state(|s| {
                projection::filtered(&s.todos, s.filter)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Number of todos not yet completed
    pub async fn items_left(&self) -> usize {
        self.store.state(|s| projection::items_left(&s.todos)).await
    }

    /// Whether any todo is completed
    pub async fn has_completed(&self) -> bool {
        self.store
            .state(|s| projection::has_completed(&s.todos))
            .await
    }

    /// Every todo, in insertion order
    pub async fn todos(&self) -> Vec<Todo> {
        self.store.state(|s| s.todos.clone()).await
    }

    /// The active edit session, if any
    pub async fn editing(&self) -> Option<EditSession> {
        self.store.state(|s| s.editing.clone()).await
    }

    /// The current filter
    pub async fn filter(&self) -> Filter {
        self.store.state(|s| s.filter).await
    }

    /// Everything a list screen renders, from one snapshot
    pub async fn view(&self) -> TodoView {
        self.store.state(TodoView::from_state).await
    }

    /// A copy of the full state
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(Clone::clone).await
    }

    // ========== Lifecycle ==========

    /// Change feed: every processed action, delivered after its reduction
    ///
    /// Re-read state (for example [`TodoApp::view`]) on each message.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TodoAction> {
        self.store.subscribe_actions()
    }

    /// Stops accepting operations and waits for in-flight saves
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if saves are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl std::fmt::Debug for TodoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoApp")
            .field("pending_effects", &self.store.pending_effects())
            .finish_non_exhaustive()
    }
}
