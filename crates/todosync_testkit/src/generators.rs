//! Property-based test generators using proptest.
//!
//! Strategies produce ids, todos and push rows that the server accepts.

use proptest::prelude::*;
use todosync_protocol::{PushRow, TodoInput};

/// Strategy for generating non-empty document ids.
///
/// Ids are drawn from a small alphabet so that batches revisit the same
/// documents.
pub fn todo_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-f0-9]{1,2}").expect("Invalid regex")
}

/// Strategy for generating todo names.
pub fn todo_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z ]{0,23}").expect("Invalid regex")
}

/// Strategy for generating client timestamps (naive ISO-8601).
pub fn timestamp_strategy() -> impl Strategy<Value = String> {
    (1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(|(day, hour, minute, second)| {
        format!("2024-11-{day:02}T{hour:02}:{minute:02}:{second:02}")
    })
}

/// Strategy for generating todo inputs, with `deleted` sometimes absent.
pub fn todo_input_strategy() -> impl Strategy<Value = TodoInput> {
    (
        todo_id_strategy(),
        todo_name_strategy(),
        any::<bool>(),
        timestamp_strategy(),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(id, name, done, timestamp, deleted)| TodoInput {
            id,
            name,
            done,
            timestamp,
            deleted,
        })
}

/// Strategy for generating live (never deleted) todo inputs.
pub fn live_todo_input_strategy() -> impl Strategy<Value = TodoInput> {
    todo_input_strategy().prop_map(|input| input.with_deleted(false))
}

/// Strategy for generating push rows without an assumed state.
pub fn push_row_strategy() -> impl Strategy<Value = PushRow> {
    todo_input_strategy().prop_map(PushRow::new)
}

/// Strategy for generating batches of push rows.
pub fn push_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<PushRow>> {
    prop::collection::vec(push_row_strategy(), 1..=max_len.max(1))
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
