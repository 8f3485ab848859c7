//! Inspect command implementation.

use serde::Serialize;
use todosync_protocol::Checkpoint;
use todosync_server::{ServerConfig, SyncServer};
use todosync_storage::{Collection, Connector};

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Collection name.
    pub collection: String,
    /// Number of stored records.
    pub record_count: usize,
    /// Number of live todos.
    pub live_count: usize,
    /// Number of soft-deleted todos.
    pub deleted_count: usize,
    /// Current checkpoint.
    pub checkpoint: Checkpoint,
}

/// Runs the inspect command.
pub fn run(config: &ServerConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(config)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects statistics for the store at `config.store_path`.
pub fn inspect(config: &ServerConfig) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !config.store_path.exists() {
        return Err(format!("No store found at {:?}", config.store_path).into());
    }

    let server = SyncServer::open(config.clone())?;
    let records = {
        let conn = server.store().connect()?;
        conn.find_all(usize::MAX)?
    };
    let deleted_count = records.iter().filter(|r| r.deleted).count();

    Ok(InspectResult {
        path: config.store_path.display().to_string(),
        collection: config.collection.clone(),
        record_count: records.len(),
        live_count: records.len() - deleted_count,
        deleted_count,
        checkpoint: server.checkpoint()?,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("todosync Store Inspection");
    println!("=========================");
    println!();
    println!("Path:       {}", result.path);
    println!("Collection: {}", result.collection);
    println!();
    println!("Todos:");
    println!("  Records: {}", result.record_count);
    println!("  Live:    {}", result.live_count);
    println!("  Deleted: {}", result.deleted_count);
    println!();
    println!("Checkpoint:");
    println!("  Id:        {}", result.checkpoint.id);
    println!(
        "  UpdatedAt: {}",
        todosync_protocol::iso8601::format(&result.checkpoint.updated_at)
    );
}
