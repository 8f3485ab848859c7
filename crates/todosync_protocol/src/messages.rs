//! Push and pull payloads.

use crate::checkpoint::Checkpoint;
use crate::todo::{Todo, TodoInput};
use serde::{Deserialize, Serialize};

/// Conflict summary reported when at least one row conflicted.
pub const CONFLICTS_DETECTED: &str = "Conflicts detected";

/// Conflict summary reported when no row conflicted.
pub const NO_CONFLICTS: &str = "No conflicts";

/// One row of a push batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRow {
    /// The client's last known server version of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumed_master_state: Option<TodoInput>,
    /// The client's proposed new version.
    pub new_document_state: TodoInput,
}

impl PushRow {
    /// Creates a row without an assumed server state.
    pub fn new(new_document_state: TodoInput) -> Self {
        Self {
            assumed_master_state: None,
            new_document_state,
        }
    }

    /// Creates a row that expects the server to hold `assumed`.
    pub fn assuming(assumed: TodoInput, new_document_state: TodoInput) -> Self {
        Self {
            assumed_master_state: Some(assumed),
            new_document_state,
        }
    }
}

/// Documents changed since a checkpoint, plus the checkpoint to resume from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullBulk {
    /// Changed documents.
    pub documents: Vec<Todo>,
    /// Checkpoint to send with the next pull.
    pub checkpoint: Checkpoint,
}

impl PullBulk {
    /// Creates a bulk.
    pub fn new(documents: Vec<Todo>, checkpoint: Checkpoint) -> Self {
        Self {
            documents,
            checkpoint,
        }
    }

    /// Creates a bulk with no documents.
    pub fn empty(checkpoint: Checkpoint) -> Self {
        Self::new(Vec::new(), checkpoint)
    }
}

/// Outcome tag of a written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// The document did not exist and was inserted.
    Inserted,
    /// The document existed and was updated.
    Updated,
    /// The document existed and was soft-deleted.
    Delete,
}

impl ChangeAction {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Inserted => "inserted",
            ChangeAction::Updated => "updated",
            ChangeAction::Delete => "delete",
        }
    }

    /// Tag for an update of an existing document to `todo`.
    pub fn for_update(todo: &Todo) -> Self {
        if todo.deleted {
            ChangeAction::Delete
        } else {
            ChangeAction::Updated
        }
    }
}

/// Result of a push call.
///
/// `changes` and `change_action` are parallel: one tag per written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// Current server documents for rows whose assumption did not hold.
    pub conflicts: Vec<Todo>,
    /// Human-readable conflict summary.
    pub conflict_message: String,
    /// Documents written by this call.
    pub changes: Vec<Todo>,
    /// Outcome per written document.
    pub change_action: Vec<ChangeAction>,
}

impl PushResponse {
    /// Creates a response with no conflicts and no changes.
    pub fn new() -> Self {
        Self {
            conflicts: Vec::new(),
            conflict_message: NO_CONFLICTS.to_string(),
            changes: Vec::new(),
            change_action: Vec::new(),
        }
    }

    /// Records a conflicting row by the server's current document.
    pub fn record_conflict(&mut self, server_state: Todo) {
        self.conflicts.push(server_state);
        self.conflict_message = CONFLICTS_DETECTED.to_string();
    }

    /// Records a written document.
    pub fn record_change(&mut self, todo: Todo, action: ChangeAction) {
        self.changes.push(todo);
        self.change_action.push(action);
    }

    /// Returns true if any row conflicted.
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Returns true if any document was written.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

impl Default for PushResponse {
    fn default() -> Self {
        Self::new()
    }
}
