//! In-memory record index shared by the stores.

use crate::record::{DocumentKey, Position, StoredTodo};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Records by key, plus their positions in cursor order.
#[derive(Debug, Default)]
pub(crate) struct DocumentIndex {
    by_key: BTreeMap<DocumentKey, StoredTodo>,
    by_position: BTreeSet<Position>,
}

impl DocumentIndex {
    pub(crate) fn get(&self, key: &DocumentKey) -> Option<&StoredTodo> {
        self.by_key.get(key)
    }

    pub(crate) fn contains(&self, key: &DocumentKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Inserts or replaces a record, returning the previous version.
    pub(crate) fn put(&mut self, record: StoredTodo) -> Option<StoredTodo> {
        let position = record.position();
        let previous = self.by_key.insert(record.key.clone(), record);
        if let Some(prev) = &previous {
            self.by_position.remove(&prev.position());
        }
        self.by_position.insert(position);
        previous
    }

    pub(crate) fn all(&self, limit: usize) -> Vec<StoredTodo> {
        self.by_key.values().take(limit).cloned().collect()
    }

    pub(crate) fn since(&self, after: Option<&Position>, limit: usize) -> Vec<StoredTodo> {
        let lower = match after {
            Some(position) => Bound::Excluded(position),
            None => Bound::Unbounded,
        };
        self.by_position
            .range((lower, Bound::Unbounded))
            .take(limit)
            .filter_map(|position| self.by_key.get(&position.key))
            .cloned()
            .collect()
    }

    pub(crate) fn max_position(&self) -> Option<Position> {
        self.by_position.last().cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn clear(&mut self) {
        self.by_key.clear();
        self.by_position.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn record(key: &str, secs: i64) -> StoredTodo {
        StoredTodo::new(
            DocumentKey::parse(key).unwrap(),
            "x",
            false,
            "t",
            false,
            Utc.timestamp_opt(secs, 0).unwrap(),
        )
    }

    #[test]
    fn put_moves_position() {
        let mut index = DocumentIndex::default();
        index.put(record("a", 1));
        index.put(record("b", 2));
        index.put(record("a", 3));

        assert_eq!(index.len(), 2);
        let keys: Vec<_> = index
            .since(None, 10)
            .into_iter()
            .map(|r| r.key.to_string())
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(index.max_position().unwrap().key.as_str(), "a");
    }

    #[test]
    fn since_excludes_the_cursor_itself() {
        let mut index = DocumentIndex::default();
        index.put(record("a", 1));
        index.put(record("b", 2));

        let cursor = record("a", 1).position();
        let rest = index.since(Some(&cursor), 10);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].key.as_str(), "b");
    }

    proptest! {
        #[test]
        fn since_is_ordered_and_complete(writes in prop::collection::vec((0u8..8, 0i64..50), 1..40)) {
            let mut index = DocumentIndex::default();
            for (key, secs) in &writes {
                index.put(record(&key.to_string(), *secs));
            }

            let scanned = index.since(None, usize::MAX);
            prop_assert_eq!(scanned.len(), index.len());
            for pair in scanned.windows(2) {
                prop_assert!(pair[0].position() < pair[1].position());
            }
        }
    }
}
