//! Seed command implementation.

use todosync_protocol::{PushResponse, PushRow, TodoInput};
use todosync_server::{ServerConfig, SyncServer};
use tracing::info;

/// The demo todos, the last one soft-deleted.
pub fn demo_todos() -> Vec<TodoInput> {
    vec![
        TodoInput::new("1", "Buy groceries", false, "2024-11-25T10:00:00"),
        TodoInput::new("2", "Finish project report", true, "2024-11-24T15:00:00"),
        TodoInput::new("3", "Walk the dog", false, "2024-11-25T12:30:00"),
        TodoInput::new("4", "Clean the house", true, "2024-11-23T08:00:00").with_deleted(true),
    ]
}

/// Runs the seed command.
pub fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let response = seed(config)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Pushes the demo todos without assumed state.
pub fn seed(config: ServerConfig) -> Result<PushResponse, Box<dyn std::error::Error>> {
    let server = SyncServer::open(config)?;
    let rows = demo_todos().into_iter().map(PushRow::new).collect();
    let response = server.push(rows)?;
    info!(
        changes = response.changes.len(),
        store = %server.config().store_path.display(),
        "seeded demo todos"
    );
    Ok(response)
}
