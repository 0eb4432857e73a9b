//! Metric names emitted by the runtime.
//!
//! The runtime records through the [`metrics`] facade only. Nothing is
//! exported unless the host application installs a recorder; in that case
//! call [`register_metrics`] once so the recorder knows each metric's unit
//! and meaning.
//!
//! # Example
//!
//! ```rust
//! use composable_todo_runtime::metrics::register_metrics;
//!
//! // Safe without a recorder installed: descriptions are dropped.
//! register_metrics();
//! ```

use metrics::{describe_counter, describe_histogram};

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Actions processed by a store (user commands and effect feedback)
pub const ACTIONS_TOTAL: &str = "store.actions.total";

/// Reducer execution time
pub const REDUCER_DURATION: &str = "store.reducer.duration_seconds";

/// Effects executed, labelled by `type`
pub const EFFECTS_EXECUTED: &str = "store.effects.executed";

/// Shutdowns initiated
pub const SHUTDOWN_INITIATED: &str = "store.shutdown.initiated";

/// Shutdowns that drained all effects in time
pub const SHUTDOWN_COMPLETED: &str = "store.shutdown.completed";

/// Shutdowns that gave up with effects still running
pub const SHUTDOWN_TIMEOUT: &str = "store.shutdown.timeout";

/// Actions rejected because the store was shutting down
pub const SHUTDOWN_REJECTED: &str = "store.shutdown.rejected_actions";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        ACTIONS_TOTAL,
        "Total number of actions processed by the store"
    );
    describe_histogram!(
        REDUCER_DURATION,
        metrics::Unit::Seconds,
        "Time taken to execute the reducer for one action"
    );
    describe_counter!(
        EFFECTS_EXECUTED,
        "Total number of effects executed, by effect type"
    );
    describe_counter!(SHUTDOWN_INITIATED, "Graceful shutdowns initiated");
    describe_counter!(
        SHUTDOWN_COMPLETED,
        "Graceful shutdowns that completed with no pending effects"
    );
    describe_counter!(
        SHUTDOWN_TIMEOUT,
        "Graceful shutdowns that timed out with effects still running"
    );
    describe_counter!(
        SHUTDOWN_REJECTED,
        "Actions rejected because the store was shutting down"
    );
}
