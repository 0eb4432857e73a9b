//! Derived views over the to-do list.
//!
//! Everything here is a pure read of a snapshot: nothing mutates the list,
//! and all values computed from the same snapshot agree with each other
//! (`items_left + completed_count == len`).

use crate::types::{EditSession, Filter, Todo, TodoState};
use serde::Serialize;

/// Todos passing `filter`, in insertion order
#[must_use]
pub fn filtered(todos: &[Todo], filter: Filter) -> Vec<&Todo> {
    todos.iter().filter(|todo| filter.matches(todo)).collect()
}

/// Number of todos not yet completed
#[must_use]
pub fn items_left(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| !todo.completed).count()
}

/// Number of completed todos
#[must_use]
pub fn completed_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| todo.completed).count()
}

/// Whether any todo is completed
#[must_use]
pub fn has_completed(todos: &[Todo]) -> bool {
    todos.iter().any(|todo| todo.completed)
}

/// Everything a list screen renders, taken from one state snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TodoView {
    /// Active filter
    pub filter: Filter,
    /// Todos passing the filter, in insertion order
    pub items: Vec<Todo>,
    /// Number of todos not yet completed
    pub items_left: usize,
    /// Whether "clear completed" has anything to clear
    pub has_completed: bool,
    /// Number of todos regardless of filter
    pub total: usize,
    /// Active edit session, if any
    pub editing: Option<EditSession>,
}

impl TodoView {
    /// Projects `state` into a view
    #[must_use]
    pub fn from_state(state: &TodoState) -> Self {
        Self {
            filter: state.filter,
            items: filtered(&state.todos, state.filter)
                .into_iter()
                .cloned()
                .collect(),
            items_left: items_left(&state.todos),
            has_completed: has_completed(&state.todos),
            total: state.todos.len(),
            editing: state.editing.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TodoId;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn todo(id: i64, completed: bool) -> Todo {
        Todo {
            id: TodoId::new(id),
            text: format!("item {id}"),
            completed,
        }
    }

    fn arb_todos() -> impl Strategy<Value = Vec<Todo>> {
        prop::collection::vec(any::<bool>(), 0..40).prop_map(|flags| {
            flags
                .into_iter()
                .enumerate()
                .map(|(i, completed)| todo(i64::try_from(i).unwrap_or(i64::MAX) + 1, completed))
                .collect()
        })
    }

    fn ids(todos: &[&Todo]) -> HashSet<TodoId> {
        todos.iter().map(|todo| todo.id).collect()
    }

    #[test]
    fn test_example_list() {
        let todos = vec![todo(1, true), todo(2, false), todo(3, false)];

        assert_eq!(items_left(&todos), 2);
        assert_eq!(completed_count(&todos), 1);
        assert!(has_completed(&todos));
        assert_eq!(filtered(&todos, Filter::Completed), vec![&todos[0]]);
        assert_eq!(filtered(&todos, Filter::Active), vec![&todos[1], &todos[2]]);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(items_left(&[]), 0);
        assert!(!has_completed(&[]));
        assert!(filtered(&[], Filter::All).is_empty());
    }

    #[test]
    fn test_view_from_state() {
        let mut state = TodoState::with_todos(vec![todo(1, true), todo(2, false)]);
        state.filter = Filter::Active;

        let view = TodoView::from_state(&state);
        assert_eq!(view.filter, Filter::Active);
        assert_eq!(view.items, vec![todo(2, false)]);
        assert_eq!(view.items_left, 1);
        assert!(view.has_completed);
        assert_eq!(view.total, 2);
        assert_eq!(view.editing, None);
    }

    proptest! {
        #[test]
        fn prop_counts_are_consistent(todos in arb_todos()) {
            let completed = todos.iter().filter(|t| t.completed).count();
            prop_assert_eq!(items_left(&todos), todos.len() - completed);
            prop_assert_eq!(completed_count(&todos), completed);
            prop_assert_eq!(has_completed(&todos), completed > 0);
            prop_assert_eq!(items_left(&todos) + completed_count(&todos), todos.len());
        }

        #[test]
        fn prop_all_is_identity(todos in arb_todos()) {
            let all: Vec<Todo> = filtered(&todos, Filter::All).into_iter().cloned().collect();
            prop_assert_eq!(all, todos);
        }

        #[test]
        fn prop_active_and_completed_partition(todos in arb_todos()) {
            let active = ids(&filtered(&todos, Filter::Active));
            let completed = ids(&filtered(&todos, Filter::Completed));
            let every: HashSet<TodoId> = todos.iter().map(|t| t.id).collect();

            prop_assert!(active.is_disjoint(&completed));
            prop_assert_eq!(active.union(&completed).copied().collect::<HashSet<_>>(), every);
        }

        #[test]
        fn prop_filtered_keeps_insertion_order(todos in arb_todos()) {
            for filter in Filter::ALL {
                let positions: Vec<usize> = filtered(&todos, filter)
                    .iter()
                    .filter_map(|t| todos.iter().position(|o| o.id == t.id))
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
