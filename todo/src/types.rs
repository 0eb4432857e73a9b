//! Domain types for the to-do list.
//!
//! A to-do list is an insertion-ordered collection of short text items that
//! can be added, toggled, edited, filtered, and deleted. The whole list is
//! persisted as one JSON array; the filter and the edit session are
//! transient and never written.

use chrono::{DateTime, Utc};
use composable_todo_macros::Action;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a todo item
///
/// Serialized as a bare JSON number so persisted lists read as
/// `[{"id": 1735689600000, ...}]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    /// Creates a `TodoId` from its raw value
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
///
/// `text` is trimmed and non-empty whenever it is written by the reducer.
/// Items hydrated from storage are taken as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// What needs doing
    pub text: String,
    /// Whether the todo is done
    pub completed: bool,
}

impl Todo {
    /// Creates a new, not yet completed todo
    #[must_use]
    pub fn new(id: TodoId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
        }
    }

    /// Flips the completed flag
    pub const fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// The item currently being edited and its working text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    /// Item being edited
    pub todo_id: TodoId,
    /// Working copy of the text, not yet committed
    pub text: String,
}

/// Which items are shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every item
    #[default]
    All,
    /// Items not yet completed
    Active,
    /// Completed items
    Completed,
}

impl Filter {
    /// Every filter, in display order
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Returns true if `todo` passes this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }

    /// Lowercase name of the filter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown filter `{0}` (expected all, active or completed)")]
pub struct ParseFilterError(String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFilterError(s.to_string()))
    }
}

/// State of the to-do list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoState {
    /// Items in insertion order
    pub todos: Vec<Todo>,
    /// Current display filter
    pub filter: Filter,
    /// Active edit session, if any
    pub editing: Option<EditSession>,
    /// Number of accepted list mutations; each save carries the revision it snapshots
    pub revision: u64,
    /// Highest revision known to be written to storage
    pub last_saved_revision: u64,
    /// Whether the initial load has finished (successfully or not)
    pub loaded: bool,
    /// A load is in flight; saves wait for it so they cannot overwrite unread data
    pub loading: bool,
    /// A mutation happened while loading and its save is still owed
    pub save_deferred: bool,
    /// Most recent load or save failure, for diagnostics
    pub last_error: Option<String>,
}

impl TodoState {
    /// Creates a new empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state holding `todos`, as if loaded from storage
    #[must_use]
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            loaded: true,
            ..Self::default()
        }
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Returns a mutable todo by ID
    pub fn get_mut(&mut self, id: TodoId) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Returns true if every save up to the current revision has been written
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        self.last_saved_revision >= self.revision
    }

    /// Picks the id for a todo created at `now`
    ///
    /// Ids are creation timestamps in milliseconds, bumped past the largest
    /// existing id so two items created in the same millisecond never share
    /// one. Never returns an id below 1.
    #[must_use]
    pub fn next_id(&self, now: DateTime<Utc>) -> TodoId {
        let floor = now.timestamp_millis().max(1);
        let after_last = self
            .todos
            .iter()
            .map(|todo| todo.id.get())
            .max()
            .map_or(Some(1), |max| max.checked_add(1));

        if let Some(after_last) = after_last {
            return TodoId::new(floor.max(after_last));
        }

        // i64::MAX is taken; settle for the first free id from the clock on
        (floor..=i64::MAX)
            .chain(1..floor)
            .map(TodoId::new)
            .find(|id| !self.exists(*id))
            .unwrap_or(TodoId::new(floor))
    }

    /// Hydrates from a load that finished after local mutations were made
    ///
    /// Stored items come first, in stored order, followed by the local ones
    /// storage has never seen. Where both hold the same id the local copy
    /// wins, in the stored position.
    pub fn merge_loaded(&mut self, loaded: Vec<Todo>) {
        let mut local = std::mem::replace(&mut self.todos, loaded);

        for stored in &mut self.todos {
            if let Some(pos) = local.iter().position(|todo| todo.id == stored.id) {
                *stored = local.remove(pos);
            }
        }
        self.todos.append(&mut local);
    }

    /// Ends the edit session if it targets an item no longer in the list
    pub fn drop_orphaned_edit(&mut self) {
        if let Some(session) = &self.editing {
            if !self.exists(session.todo_id) {
                tracing::debug!(id = %session.todo_id, "Edit target removed, ending edit session");
                self.editing = None;
            }
        }
    }
}

/// Actions representing commands and events for the to-do list
///
/// Commands come from the user. Events are fed back by the load and save
/// effects once storage has answered.
#[derive(Action, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Read the persisted list
    #[command]
    Load,

    /// Command: Append a new todo
    #[command]
    AddTodo {
        /// Raw text, trimmed before use
        text: String,
    },

    /// Command: Flip a todo's completed flag
    #[command]
    ToggleTodo {
        /// Todo to toggle
        id: TodoId,
    },

    /// Command: Remove a todo
    #[command]
    DeleteTodo {
        /// Todo to delete
        id: TodoId,
    },

    /// Command: Begin editing a todo, seeded with its current text
    #[command]
    StartEdit {
        /// Todo to edit
        id: TodoId,
    },

    /// Command: Replace the working text of the edit session
    #[command]
    EditTextChanged {
        /// New working text
        text: String,
    },

    /// Command: Write the working text back to the todo
    #[command]
    CommitEdit,

    /// Command: Set the working text and commit it in one step
    #[command]
    SaveEdit {
        /// Text to commit
        text: String,
    },

    /// Command: Abandon the edit session
    #[command]
    CancelEdit,

    /// Command: Remove every completed todo
    #[command]
    ClearCompleted,

    /// Command: Change which todos are shown
    #[command]
    SetFilter {
        /// New filter
        filter: Filter,
    },

    // ========== Events ==========
    /// Event: Persisted list was read (empty if nothing was stored)
    #[event]
    TodosLoaded {
        /// Stored items, in insertion order
        todos: Vec<Todo>,
    },

    /// Event: Reading or decoding the persisted list failed
    #[event]
    LoadFailed {
        /// Error message
        error: String,
    },

    /// Event: Snapshot at `revision` was written
    #[event]
    TodosSaved {
        /// Revision that was written
        revision: u64,
    },

    /// Event: Writing the snapshot at `revision` failed
    #[event]
    SaveFailed {
        /// Revision that failed to be written
        revision: u64,
        /// Error message
        error: String,
    },
}
