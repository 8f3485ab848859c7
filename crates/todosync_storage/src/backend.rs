//! Store trait definitions.

use crate::error::StoreResult;
use crate::record::{DocumentKey, Position, StoredTodo, TodoFields};
use chrono::{DateTime, Utc};

/// Result of [`Collection::update_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An existing record was replaced.
    Matched,
    /// No record existed and one was inserted.
    Upserted,
    /// No record existed and `upsert` was false.
    NotFound,
}

/// A keyed todo collection, as seen through one connection.
///
/// # Invariants
///
/// - A key identifies at most one record
/// - Writes are visible to reads issued later on the same connection
/// - `find_since` returns records in ascending [`Position`] order
pub trait Collection {
    /// Returns up to `limit` records in key order.
    fn find_all(&self, limit: usize) -> StoreResult<Vec<StoredTodo>>;

    /// Returns up to `limit` records positioned strictly after `after`,
    /// in position order. `None` starts from the beginning.
    fn find_since(&self, after: Option<&Position>, limit: usize) -> StoreResult<Vec<StoredTodo>>;

    /// Looks up a record by key.
    fn find_one(&self, key: &DocumentKey) -> StoreResult<Option<StoredTodo>>;

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::DuplicateKey`] if the key exists.
    fn insert_one(&mut self, record: StoredTodo) -> StoreResult<()>;

    /// Replaces the fields of the record under `key` and restamps it.
    ///
    /// With `upsert`, a missing record is inserted instead.
    fn update_one(
        &mut self,
        key: &DocumentKey,
        fields: TodoFields,
        updated_at: DateTime<Utc>,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome>;

    /// Returns the greatest position in the collection.
    fn max_position(&self) -> StoreResult<Option<Position>>;

    /// Returns the number of records, soft-deleted ones included.
    fn count(&self) -> StoreResult<usize>;
}

/// Hands out scoped connections to a collection.
///
/// The connection is released when the returned value is dropped.
pub trait Connector: Send + Sync {
    /// Connection type.
    type Connection<'a>: Collection
    where
        Self: 'a;

    /// Opens a connection for the duration of one call.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be reached.
    fn connect(&self) -> StoreResult<Self::Connection<'_>>;
}
