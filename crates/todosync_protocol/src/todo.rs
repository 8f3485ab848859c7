//! Todo documents.

use serde::{Deserialize, Serialize};

/// A todo document as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Todo {
    /// Document id.
    pub id: String,
    /// Todo text.
    pub name: String,
    /// Completion flag.
    pub done: bool,
    /// Client-assigned version marker (ISO-8601).
    pub timestamp: String,
    /// Soft-delete flag.
    #[serde(default)]
    pub deleted: bool,
}

impl Todo {
    /// Returns true if any mutable field differs from `other`.
    pub fn differs_from(&self, other: &Todo) -> bool {
        self.name != other.name
            || self.done != other.done
            || self.timestamp != other.timestamp
            || self.deleted != other.deleted
    }

    /// Returns true if `assumed` describes exactly this document.
    ///
    /// Every field takes part, `id` and `deleted` included. An assumed state
    /// without a `deleted` flag reads as not deleted.
    pub fn matches(&self, assumed: &TodoInput) -> bool {
        self.id == assumed.id
            && self.name == assumed.name
            && self.done == assumed.done
            && self.timestamp == assumed.timestamp
            && self.deleted == assumed.is_deleted()
    }
}

/// A todo document as sent by clients in push rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoInput {
    /// Document id.
    pub id: String,
    /// Todo text.
    pub name: String,
    /// Completion flag.
    pub done: bool,
    /// Client-assigned version marker (ISO-8601).
    pub timestamp: String,
    /// Soft-delete flag, absent means false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl TodoInput {
    /// Creates a live (not deleted) input.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        done: bool,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            done,
            timestamp: timestamp.into(),
            deleted: None,
        }
    }

    /// Sets the soft-delete flag.
    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    /// Returns the effective soft-delete flag.
    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }

    /// Builds the document this input proposes.
    pub fn to_todo(&self) -> Todo {
        Todo {
            id: self.id.clone(),
            name: self.name.clone(),
            done: self.done,
            timestamp: self.timestamp.clone(),
            deleted: self.is_deleted(),
        }
    }
}

impl From<Todo> for TodoInput {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            name: todo.name,
            done: todo.done,
            timestamp: todo.timestamp,
            deleted: Some(todo.deleted),
        }
    }
}
