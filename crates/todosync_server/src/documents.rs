//! Translation between wire documents and stored records.

use crate::error::{ServerError, ServerResult};
use chrono::{DateTime, Utc};
use todosync_protocol::{Checkpoint, Todo};
use todosync_storage::{DocumentKey, Position, StoredTodo, TodoFields};

pub(crate) fn todo_from_record(record: &StoredTodo) -> Todo {
    Todo {
        id: record.key.to_string(),
        name: record.name.clone(),
        done: record.done,
        timestamp: record.timestamp.clone(),
        deleted: record.deleted,
    }
}

pub(crate) fn fields_of(todo: &Todo) -> TodoFields {
    TodoFields {
        name: todo.name.clone(),
        done: todo.done,
        timestamp: todo.timestamp.clone(),
        deleted: todo.deleted,
    }
}

pub(crate) fn record_of(key: DocumentKey, todo: &Todo, updated_at: DateTime<Utc>) -> StoredTodo {
    StoredTodo::from_fields(key, fields_of(todo), updated_at)
}

pub(crate) fn key_of(id: &str) -> ServerResult<DocumentKey> {
    DocumentKey::parse(id).map_err(|_| ServerError::invalid_request("document id must not be empty"))
}

pub(crate) fn checkpoint_at(position: &Position) -> Checkpoint {
    Checkpoint::new(position.key.to_string(), position.updated_at)
}

pub(crate) fn position_of(checkpoint: &Checkpoint) -> ServerResult<Position> {
    let key = DocumentKey::parse(&checkpoint.id)
        .map_err(|_| ServerError::invalid_request("checkpoint id must not be empty"))?;
    Ok(Position::new(checkpoint.updated_at, key))
}
