//! Test fixtures and server helpers.
//!
//! Provides servers over temporary stores and builders for resolver
//! events.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use todosync_protocol::{Checkpoint, PullBulk, PushRow, Todo, TodoInput};
use todosync_server::{ServerConfig, SyncServer};
use todosync_storage::{Connector, FileStore, MemoryStore};

/// Timestamp used by [`todo_input`].
pub const FIXTURE_TIMESTAMP: &str = "2024-11-25T10:00:00";

/// A test server with automatic cleanup.
pub struct TestServer<C: Connector> {
    /// The server instance.
    pub server: SyncServer<C>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestServer<MemoryStore> {
    /// Creates a server over an in-memory store.
    pub fn memory() -> Self {
        Self::memory_with(ServerConfig::default())
    }

    /// Creates a server over an in-memory store with `config`.
    pub fn memory_with(config: ServerConfig) -> Self {
        Self {
            server: SyncServer::in_memory(config).expect("Invalid server config"),
            temp_dir: None,
        }
    }
}

impl TestServer<FileStore> {
    /// Creates a server over a file store in a fresh temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = ServerConfig::new(temp_dir.path().join("todos.jsonl"));
        let server = SyncServer::open(config).expect("Failed to open file store");

        Self {
            server,
            temp_dir: Some(temp_dir),
        }
    }

    /// Opens another server over the same log file.
    pub fn reopen(&self) -> SyncServer<FileStore> {
        SyncServer::open(self.server.config().clone()).expect("Failed to reopen file store")
    }
}

impl<C: Connector> TestServer<C> {
    /// Returns the temporary directory, if file-based.
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Returns the store path, if file-based.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.temp_dir
            .as_ref()
            .map(|_| self.server.config().store_path.clone())
    }

    /// Pushes rows and panics on error.
    pub fn push_ok(&self, rows: Vec<PushRow>) -> todosync_protocol::PushResponse {
        self.server.push(rows).expect("push failed")
    }

    /// Pulls page after page from `since` until the server reports no
    /// further documents, returning every document seen and the final
    /// checkpoint.
    pub fn pull_all(&self, since: Option<Checkpoint>) -> (Vec<Todo>, Checkpoint) {
        let mut documents = Vec::new();
        let mut since = since;
        loop {
            let PullBulk {
                documents: page,
                checkpoint,
            } = self.server.pull(since.clone()).expect("pull failed");
            documents.extend(page);
            if since.as_ref() == Some(&checkpoint) {
                return (documents, checkpoint);
            }
            since = Some(checkpoint);
        }
    }
}

impl<C: Connector> std::ops::Deref for TestServer<C> {
    type Target = SyncServer<C>;

    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

/// Creates a todo input with [`FIXTURE_TIMESTAMP`].
pub fn todo_input(id: &str, name: &str, done: bool) -> TodoInput {
    TodoInput::new(id, name, done, FIXTURE_TIMESTAMP)
}

/// Creates a push row without an assumed state.
pub fn insert_row(id: &str, name: &str) -> PushRow {
    PushRow::new(todo_input(id, name, false))
}

/// Builds a `pullTodo` event in the resolver envelope.
pub fn pull_event(checkpoint: Option<&Checkpoint>) -> Value {
    json!({
        "info": {"fieldName": "pullTodo"},
        "arguments": {"checkpoint": checkpoint},
    })
}

/// Builds a `pushTodo` event in the resolver envelope.
pub fn push_event(rows: &[PushRow]) -> Value {
    json!({
        "info": {"fieldName": "pushTodo"},
        "arguments": {"rows": rows},
    })
}

/// Builds a `streamTodo` event in the resolver envelope.
pub fn stream_event() -> Value {
    json!({"info": {"fieldName": "streamTodo"}})
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates an in-memory server holding `count` live todos with ids
    /// `"1"..="count"`, written in id order.
    pub fn populated_server(count: usize) -> TestServer<MemoryStore> {
        let server = TestServer::memory();
        let rows = (1..=count)
            .map(|i| insert_row(&i.to_string(), &format!("Todo {i}")))
            .collect::<Vec<_>>();
        for chunk in rows.chunks(server.config().max_push_batch) {
            server.push_ok(chunk.to_vec());
        }
        server
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_server_starts_empty() {
        let server = TestServer::memory();
        assert!(server.dir().is_none());
        assert!(server.pull(None).unwrap().documents.is_empty());
    }

    #[test]
    fn file_server_lives_in_temp_dir() {
        let server = TestServer::file();
        let path = server.store_path().unwrap();
        assert!(path.starts_with(server.dir().unwrap()));
        assert!(path.exists());
    }

    #[test]
    fn pull_all_walks_every_page() {
        let server = scenarios::populated_server(250);
        let (documents, checkpoint) = server.pull_all(None);
        assert_eq!(documents.len(), 250);
        assert_eq!(checkpoint, server.checkpoint().unwrap());
    }

    #[test]
    fn events_use_resolver_envelope() {
        let event = push_event(&[insert_row("1", "a")]);
        assert_eq!(event["info"]["fieldName"], "pushTodo");
        assert_eq!(event["arguments"]["rows"][0]["newDocumentState"]["id"], "1");

        let event = pull_event(None);
        assert!(event["arguments"]["checkpoint"].is_null());
    }
}
