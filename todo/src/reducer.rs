//! Reducer logic for the to-do list.
//!
//! Every accepted list mutation is applied to state immediately, bumps the
//! revision, and returns one effect that writes the full snapshot through
//! the [`PersistenceGateway`]. Loads and saves report back as events.

use crate::persistence::{PersistenceGateway, WriteOutcome};
use crate::types::{EditSession, Todo, TodoAction, TodoId, TodoState};
use composable_todo_core::{
    SmallVec, async_effect, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};
use std::sync::Arc;

/// Environment dependencies for the to-do reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for generating ids
    pub clock: Arc<dyn Clock>,
    /// Where the list is loaded from and saved to
    pub gateway: Arc<PersistenceGateway>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, gateway: Arc<PersistenceGateway>) -> Self {
        Self { clock, gateway }
    }
}

/// Reducer for the to-do list
#[derive(Clone, Debug)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Trims `text`, returning `None` if nothing is left
    fn validate_text(text: &str) -> Option<&str> {
        let trimmed = text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Reads the persisted list and reports the result as an event
    fn load(env: &TodoEnvironment) -> Effect<TodoAction> {
        let gateway = Arc::clone(&env.gateway);
        async_effect! {
            match gateway.read().await {
                Ok(todos) => Some(TodoAction::TodosLoaded {
                    todos: todos.unwrap_or_default(),
                }),
                Err(error) => Some(TodoAction::LoadFailed {
                    error: error.to_string(),
                }),
            }
        }
    }

    /// Bumps the revision and schedules a write of the current snapshot
    ///
    /// While a load is in flight the write is held back until the stored
    /// list has been merged in, so it cannot clobber data not yet read.
    fn save(state: &mut TodoState, env: &TodoEnvironment) -> SmallVec<[Effect<TodoAction>; 4]> {
        state.revision += 1;
        if state.loading {
            tracing::debug!(revision = state.revision, "Load in flight, deferring save");
            state.save_deferred = true;
            return SmallVec::new();
        }

        let revision = state.revision;
        let snapshot = state.todos.clone();
        let gateway = Arc::clone(&env.gateway);

        smallvec![async_effect! {
            match gateway.write(revision, &snapshot).await {
                Ok(WriteOutcome::Written) => Some(TodoAction::TodosSaved { revision }),
                Ok(WriteOutcome::Superseded) => None,
                Err(error) => Some(TodoAction::SaveFailed {
                    revision,
                    error: error.to_string(),
                }),
            }
        }]
    }

    /// Writes the edit session's working text back to its target
    fn commit_edit(
        state: &mut TodoState,
        env: &TodoEnvironment,
    ) -> SmallVec<[Effect<TodoAction>; 4]> {
        let Some(session) = state.editing.as_ref() else {
            tracing::debug!("CommitEdit without an edit session, ignoring");
            return SmallVec::new();
        };

        let Some(text) = Self::validate_text(&session.text).map(str::to_string) else {
            // Rejected; the session stays open so the user can fix the text
            tracing::debug!(id = %session.todo_id, "Rejected empty edit");
            return SmallVec::new();
        };

        let id = session.todo_id;
        state.editing = None;

        let Some(todo) = state.get_mut(id) else {
            tracing::debug!(%id, "Edit target no longer exists, discarding edit");
            return SmallVec::new();
        };

        todo.text = text;
        Self::save(state, env)
    }

    fn start_edit(state: &mut TodoState, id: TodoId) {
        let Some(todo) = state.get(id) else {
            tracing::debug!(%id, "StartEdit for unknown todo, ignoring");
            return;
        };

        state.editing = Some(EditSession {
            todo_id: id,
            text: todo.text.clone(),
        });
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::debug!(action = action.name(), "Reducing");

        match action {
            // ========== Commands ==========
            TodoAction::Load => {
                state.loading = true;
                smallvec![Self::load(env)]
            },

            TodoAction::AddTodo { text } => {
                let Some(text) = Self::validate_text(&text) else {
                    tracing::debug!("Rejected empty todo");
                    return SmallVec::new();
                };

                let id = state.next_id(env.clock.now());
                state.todos.push(Todo::new(id, text));
                Self::save(state, env)
            },

            TodoAction::ToggleTodo { id } => {
                if let Some(todo) = state.get_mut(id) {
                    todo.toggle();
                }
                Self::save(state, env)
            },

            TodoAction::DeleteTodo { id } => {
                state.todos.retain(|todo| todo.id != id);
                state.drop_orphaned_edit();
                Self::save(state, env)
            },

            TodoAction::StartEdit { id } => {
                Self::start_edit(state, id);
                SmallVec::new()
            },

            TodoAction::EditTextChanged { text } => {
                if let Some(session) = state.editing.as_mut() {
                    session.text = text;
                }
                SmallVec::new()
            },

            TodoAction::CommitEdit => Self::commit_edit(state, env),

            TodoAction::SaveEdit { text } => {
                if let Some(session) = state.editing.as_mut() {
                    session.text = text;
                }
                Self::commit_edit(state, env)
            },

            TodoAction::CancelEdit => {
                state.editing = None;
                SmallVec::new()
            },

            TodoAction::ClearCompleted => {
                state.todos.retain(|todo| !todo.completed);
                state.drop_orphaned_edit();
                Self::save(state, env)
            },

            TodoAction::SetFilter { filter } => {
                state.filter = filter;
                SmallVec::new()
            },

            // ========== Events ==========
            TodoAction::TodosLoaded { todos } => {
                tracing::info!(count = todos.len(), "Loaded todos");
                // Mutations made before hydration are kept, not replaced
                let has_local = state.save_deferred || (!state.loaded && state.revision > 0);
                state.loading = false;
                state.save_deferred = false;
                state.loaded = true;
                state.last_error = None;

                if has_local {
                    state.merge_loaded(todos);
                    tracing::info!(count = state.count(), "Merged local changes into loaded todos");
                    return Self::save(state, env);
                }

                state.todos = todos;
                state.drop_orphaned_edit();
                SmallVec::new()
            },

            TodoAction::LoadFailed { error } => {
                tracing::error!(%error, "Failed to load todos, continuing in memory");
                let deferred = state.save_deferred;
                state.loading = false;
                state.save_deferred = false;
                state.loaded = true;
                state.last_error = Some(error);

                if deferred {
                    return Self::save(state, env);
                }
                SmallVec::new()
            },

            TodoAction::TodosSaved { revision } => {
                state.last_saved_revision = state.last_saved_revision.max(revision);
                SmallVec::new()
            },

            TodoAction::SaveFailed { revision, error } => {
                tracing::warn!(revision, %error, "Failed to save todos");
                state.last_error = Some(error);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Filter;
    use composable_todo_testing::{InMemoryKeyValueStore, ReducerTest, assertions, test_clock};
    use proptest::prelude::*;

    const NOW_MILLIS: i64 = 1_735_689_600_000;

    fn create_test_env() -> TodoEnvironment {
        let storage = Arc::new(InMemoryKeyValueStore::new());
        TodoEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(PersistenceGateway::with_default_key(storage)),
        )
    }

    fn sample_state() -> TodoState {
        let mut done = Todo::new(TodoId::new(1), "a");
        done.completed = true;
        TodoState::with_todos(vec![done, Todo::new(TodoId::new(2), "b")])
    }

    #[test]
    fn test_add_todo_success() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo {
                text: "  buy milk  ".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.todos, vec![Todo::new(TodoId::new(NOW_MILLIS), "buy milk")]);
                assert_eq!(state.revision, 1);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_add_todo_whitespace_rejected() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo {
                text: "   ".to_string(),
            })
            .then_state(|state| {
                assert!(state.todos.is_empty());
                assert_eq!(state.revision, 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_add_todo_same_tick_gets_distinct_ids() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo {
                text: "a".to_string(),
            })
            .when_action(TodoAction::AddTodo {
                text: "b".to_string(),
            })
            .then_state(|state| {
                let ids: Vec<_> = state.todos.iter().map(|t| t.id.get()).collect();
                assert_eq!(ids, vec![NOW_MILLIS, NOW_MILLIS + 1]);
                assert_eq!(state.revision, 2);
            })
            .run();
    }

    #[test]
    fn test_toggle_twice_restores_flag() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::ToggleTodo { id: TodoId::new(2) })
            .when_action(TodoAction::ToggleTodo { id: TodoId::new(2) })
            .then_state(|state| {
                assert_eq!(state.todos, sample_state().todos);
                assert_eq!(state.revision, 2);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_toggle_unknown_id_still_saves() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::ToggleTodo { id: TodoId::new(99) })
            .then_state(|state| {
                assert_eq!(state.todos, sample_state().todos);
                assert_eq!(state.revision, 1);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn test_delete_todo() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::DeleteTodo { id: TodoId::new(1) })
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert!(!state.exists(TodoId::new(1)));
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_delete_edit_target_ends_session() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(2) })
            .when_action(TodoAction::DeleteTodo { id: TodoId::new(2) })
            .then_state(|state| {
                assert!(state.editing.is_none());
            })
            .run();
    }

    #[test]
    fn test_clear_completed() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::ClearCompleted)
            .then_state(|state| {
                assert_eq!(state.todos, vec![Todo::new(TodoId::new(2), "b")]);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_start_edit_seeds_text() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(1) })
            .then_state(|state| {
                assert_eq!(
                    state.editing,
                    Some(EditSession {
                        todo_id: TodoId::new(1),
                        text: "a".to_string(),
                    })
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_start_edit_replaces_session() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(1) })
            .when_action(TodoAction::StartEdit { id: TodoId::new(2) })
            .then_state(|state| {
                assert_eq!(state.editing.as_ref().map(|s| s.todo_id), Some(TodoId::new(2)));
            })
            .run();
    }

    #[test]
    fn test_start_edit_unknown_id_keeps_session() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(1) })
            .when_action(TodoAction::StartEdit { id: TodoId::new(99) })
            .then_state(|state| {
                assert_eq!(state.editing.as_ref().map(|s| s.todo_id), Some(TodoId::new(1)));
            })
            .run();
    }

    #[test]
    fn test_commit_edit() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(1) })
            .when_action(TodoAction::EditTextChanged {
                text: " walk dog ".to_string(),
            })
            .when_action(TodoAction::CommitEdit)
            .then_state(|state| {
                assert_eq!(state.get(TodoId::new(1)).map(|t| t.text.as_str()), Some("walk dog"));
                assert!(state.editing.is_none());
                assert_eq!(state.revision, 1);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_commit_empty_edit_keeps_session() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(1) })
            .when_action(TodoAction::EditTextChanged {
                text: "  ".to_string(),
            })
            .when_action(TodoAction::CommitEdit)
            .then_state(|state| {
                assert_eq!(state.get(TodoId::new(1)).map(|t| t.text.as_str()), Some("a"));
                assert_eq!(
                    state.editing,
                    Some(EditSession {
                        todo_id: TodoId::new(1),
                        text: "  ".to_string(),
                    })
                );
                assert_eq!(state.revision, 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_save_edit_sets_and_commits() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(2) })
            .when_action(TodoAction::SaveEdit {
                text: "call mom".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.get(TodoId::new(2)).map(|t| t.text.as_str()), Some("call mom"));
                assert!(state.editing.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_commit_without_session_is_noop() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::SaveEdit {
                text: "call mom".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.todos, sample_state().todos);
                assert_eq!(state.revision, 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_cancel_edit() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::StartEdit { id: TodoId::new(1) })
            .when_action(TodoAction::EditTextChanged {
                text: "changed".to_string(),
            })
            .when_action(TodoAction::CancelEdit)
            .then_state(|state| {
                assert!(state.editing.is_none());
                assert_eq!(state.todos, sample_state().todos);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_set_filter_does_not_save() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(sample_state())
            .when_action(TodoAction::SetFilter {
                filter: Filter::Completed,
            })
            .then_state(|state| {
                assert_eq!(state.filter, Filter::Completed);
                assert_eq!(state.revision, 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_load_emits_effect() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::Load)
            .then_state(|state| {
                assert!(!state.loaded);
                assert!(state.loading);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_todos_loaded_hydrates_without_saving() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::TodosLoaded {
                todos: sample_state().todos,
            })
            .then_state(|state| {
                assert!(state.loaded);
                assert_eq!(state.todos, sample_state().todos);
                assert_eq!(state.revision, 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_load_failed_keeps_state() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::LoadFailed {
                error: "Corrupt todo data".to_string(),
            })
            .then_state(|state| {
                assert!(state.loaded);
                assert!(state.todos.is_empty());
                assert_eq!(state.last_error.as_deref(), Some("Corrupt todo data"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_saved_revision_is_monotonic() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::TodosSaved { revision: 3 })
            .when_action(TodoAction::TodosSaved { revision: 2 })
            .then_state(|state| assert_eq!(state.last_saved_revision, 3))
            .run();
    }

    #[test]
    fn test_save_failed_keeps_mutation() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo {
                text: "a".to_string(),
            })
            .when_action(TodoAction::SaveFailed {
                revision: 1,
                error: "disk full".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert_eq!(state.last_error.as_deref(), Some("disk full"));
                assert!(!state.is_saved());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
    #[test]
    fn test_mutation_during_load_is_merged_then_saved() {
        let seed = Todo::new(TodoId::new(1), "seed");

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::Load)
            .when_action(TodoAction::AddTodo {
                text: "new".to_string(),
            })
            .then_state(|state| {
                assert!(state.loading);
                assert!(state.save_deferred);
                assert_eq!(state.revision, 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::Load)
            .when_action(TodoAction::AddTodo {
                text: "new".to_string(),
            })
            .when_action(TodoAction::TodosLoaded {
                todos: vec![seed.clone()],
            })
            .then_state(move |state| {
                let texts: Vec<_> = state.todos.iter().map(|t| t.text.as_str()).collect();
                assert_eq!(texts, vec!["seed", "new"]);
                assert_eq!(state.todos[0], seed);
                assert!(state.loaded);
                assert!(!state.loading);
                assert!(!state.save_deferred);
                assert_eq!(state.revision, 2);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn test_mutation_during_failed_load_is_saved() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::Load)
            .when_action(TodoAction::AddTodo {
                text: "new".to_string(),
            })
            .when_action(TodoAction::LoadFailed {
                error: "unavailable".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert!(!state.save_deferred);
                assert_eq!(state.revision, 2);
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_restores_todos(
            flags in prop::collection::vec(any::<bool>(), 0..20),
            id in 0_i64..25,
        ) {
            let todos: Vec<Todo> = flags
                .iter()
                .zip(1_i64..)
                .map(|(&completed, id)| Todo {
                    id: TodoId::new(id),
                    text: format!("item {id}"),
                    completed,
                })
                .collect();
            let mut state = TodoState::with_todos(todos.clone());
            let env = create_test_env();
            let reducer = TodoReducer::new();

            reducer.reduce(&mut state, TodoAction::ToggleTodo { id: TodoId::new(id) }, &env);
            reducer.reduce(&mut state, TodoAction::ToggleTodo { id: TodoId::new(id) }, &env);

            prop_assert_eq!(state.todos, todos);
        }
    }
}
