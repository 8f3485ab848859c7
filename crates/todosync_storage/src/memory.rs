//! In-memory store for testing.

use crate::backend::{Collection, Connector, UpdateOutcome};
use crate::error::{StoreError, StoreResult};
use crate::index::DocumentIndex;
use crate::record::{DocumentKey, Position, StoredTodo, TodoFields};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An in-memory store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral deployments that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads. It tracks
/// how many connections are open, so tests can check that every call
/// released its connection.
///
/// # Example
///
/// ```rust
/// use todosync_storage::{Collection, Connector, MemoryStore};
///
/// let store = MemoryStore::new();
/// {
///     let conn = store.connect().unwrap();
///     assert_eq!(conn.count().unwrap(), 0);
///     assert_eq!(store.open_connections(), 1);
/// }
/// assert_eq!(store.open_connections(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: RwLock<DocumentIndex>,
    open: AtomicUsize,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = StoredTodo>) -> Self {
        let store = Self::new();
        {
            let mut index = store.index.write();
            for record in records {
                index.put(record);
            }
        }
        store
    }

    /// Returns the number of connections currently open.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Returns a copy of every record, in key order.
    pub fn records(&self) -> Vec<StoredTodo> {
        self.index.read().all(usize::MAX)
    }
}

impl Connector for MemoryStore {
    type Connection<'a> = MemoryConnection<'a>
    where
        Self: 'a;

    fn connect(&self) -> StoreResult<MemoryConnection<'_>> {
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection { store: self })
    }
}

/// A connection to a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryConnection<'a> {
    store: &'a MemoryStore,
}

impl Drop for MemoryConnection<'_> {
    fn drop(&mut self) {
        self.store.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Collection for MemoryConnection<'_> {
    fn find_all(&self, limit: usize) -> StoreResult<Vec<StoredTodo>> {
        Ok(self.store.index.read().all(limit))
    }

    fn find_since(&self, after: Option<&Position>, limit: usize) -> StoreResult<Vec<StoredTodo>> {
        Ok(self.store.index.read().since(after, limit))
    }

    fn find_one(&self, key: &DocumentKey) -> StoreResult<Option<StoredTodo>> {
        Ok(self.store.index.read().get(key).cloned())
    }

    fn insert_one(&mut self, record: StoredTodo) -> StoreResult<()> {
        let mut index = self.store.index.write();
        if index.contains(&record.key) {
            return Err(StoreError::DuplicateKey(record.key.to_string()));
        }
        index.put(record);
        Ok(())
    }

    fn update_one(
        &mut self,
        key: &DocumentKey,
        fields: TodoFields,
        updated_at: DateTime<Utc>,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let mut index = self.store.index.write();
        let outcome = match (index.contains(key), upsert) {
            (true, _) => UpdateOutcome::Matched,
            (false, true) => UpdateOutcome::Upserted,
            (false, false) => return Ok(UpdateOutcome::NotFound),
        };
        index.put(StoredTodo::from_fields(key.clone(), fields, updated_at));
        Ok(outcome)
    }

    fn max_position(&self) -> StoreResult<Option<Position>> {
        Ok(self.store.index.read().max_position())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.store.index.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn key(raw: &str) -> DocumentKey {
        DocumentKey::parse(raw).unwrap()
    }

    fn fields(name: &str) -> TodoFields {
        TodoFields {
            name: name.into(),
            done: false,
            timestamp: "2024-11-25T10:00:00".into(),
            deleted: false,
        }
    }

    #[test]
    fn memory_new_is_empty() {
        let store = MemoryStore::new();
        let conn = store.connect().unwrap();
        assert_eq!(conn.count().unwrap(), 0);
        assert!(conn.max_position().unwrap().is_none());
    }

    #[test]
    fn memory_insert_then_find() {
        let store = MemoryStore::new();
        let mut conn = store.connect().unwrap();
        conn.insert_one(StoredTodo::from_fields(key("1"), fields("a"), at(1)))
            .unwrap();

        let found = conn.find_one(&key("1")).unwrap().unwrap();
        assert_eq!(found.name, "a");
        assert!(conn.find_one(&key("2")).unwrap().is_none());
    }

    #[test]
    fn memory_duplicate_insert_fails() {
        let store = MemoryStore::new();
        let mut conn = store.connect().unwrap();
        conn.insert_one(StoredTodo::from_fields(key("1"), fields("a"), at(1)))
            .unwrap();

        let result = conn.insert_one(StoredTodo::from_fields(key("1"), fields("b"), at(2)));
        assert!(matches!(result, Err(StoreError::DuplicateKey(k)) if k == "1"));
    }

    #[test]
    fn memory_update_one_upsert_semantics() {
        let store = MemoryStore::new();
        let mut conn = store.connect().unwrap();

        let outcome = conn.update_one(&key("1"), fields("a"), at(1), false).unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert_eq!(conn.count().unwrap(), 0);

        let outcome = conn.update_one(&key("1"), fields("a"), at(1), true).unwrap();
        assert_eq!(outcome, UpdateOutcome::Upserted);

        let outcome = conn.update_one(&key("1"), fields("b"), at(2), true).unwrap();
        assert_eq!(outcome, UpdateOutcome::Matched);

        let record = conn.find_one(&key("1")).unwrap().unwrap();
        assert_eq!(record.name, "b");
        assert_eq!(record.updated_at, at(2));
    }

    #[test]
    fn memory_find_since_follows_write_order() {
        let store = MemoryStore::new();
        let mut conn = store.connect().unwrap();
        conn.insert_one(StoredTodo::from_fields(key("b"), fields("b"), at(1)))
            .unwrap();
        conn.insert_one(StoredTodo::from_fields(key("a"), fields("a"), at(2)))
            .unwrap();
        conn.update_one(&key("b"), fields("b2"), at(3), true).unwrap();

        let all = conn.find_since(None, 10).unwrap();
        let keys: Vec<_> = all.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);

        let after_first = conn.find_since(Some(&all[0].position()), 10).unwrap();
        assert_eq!(after_first.len(), 1);
        assert_eq!(conn.max_position().unwrap(), Some(all[1].position()));
    }

    #[test]
    fn memory_find_all_respects_limit() {
        let store = MemoryStore::with_records(
            (0..5).map(|i| StoredTodo::from_fields(key(&i.to_string()), fields("x"), at(i))),
        );
        let conn = store.connect().unwrap();
        assert_eq!(conn.find_all(3).unwrap().len(), 3);
        assert_eq!(store.records().len(), 5);
    }

    #[test]
    fn memory_connections_are_released_on_drop() {
        let store = MemoryStore::new();
        let first = store.connect().unwrap();
        let second = store.connect().unwrap();
        assert_eq!(store.open_connections(), 2);
        drop(first);
        drop(second);
        assert_eq!(store.open_connections(), 0);
    }
}
