//! Stored records and keys.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a document within a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Parses a key from its external string form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] if `raw` is empty or only whitespace.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        if raw.trim().is_empty() {
            return Err(StoreError::InvalidKey(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the external string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cursor position of a record: write stamp, then key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Server write stamp.
    pub updated_at: DateTime<Utc>,
    /// Document key.
    pub key: DocumentKey,
}

impl Position {
    /// Creates a position.
    pub fn new(updated_at: DateTime<Utc>, key: DocumentKey) -> Self {
        Self { updated_at, key }
    }
}

/// The mutable fields of a todo, as written by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoFields {
    /// Todo text.
    pub name: String,
    /// Completion flag.
    pub done: bool,
    /// Client version marker.
    pub timestamp: String,
    /// Soft-delete flag.
    pub deleted: bool,
}

/// A todo as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTodo {
    /// Document key.
    pub key: DocumentKey,
    /// Todo text.
    pub name: String,
    /// Completion flag.
    pub done: bool,
    /// Client version marker, stored verbatim.
    pub timestamp: String,
    /// Soft-delete flag.
    #[serde(default)]
    pub deleted: bool,
    /// Server write stamp of the last write.
    pub updated_at: DateTime<Utc>,
}

impl StoredTodo {
    /// Creates a record.
    pub fn new(
        key: DocumentKey,
        name: impl Into<String>,
        done: bool,
        timestamp: impl Into<String>,
        deleted: bool,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            done,
            timestamp: timestamp.into(),
            deleted,
            updated_at,
        }
    }

    /// Creates a record from its key, fields and write stamp.
    pub fn from_fields(key: DocumentKey, fields: TodoFields, updated_at: DateTime<Utc>) -> Self {
        Self {
            key,
            name: fields.name,
            done: fields.done,
            timestamp: fields.timestamp,
            deleted: fields.deleted,
            updated_at,
        }
    }

    /// Returns the cursor position of this record.
    pub fn position(&self) -> Position {
        Position::new(self.updated_at, self.key.clone())
    }
}
