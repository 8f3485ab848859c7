//! Handle command implementation.

use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use todosync_server::{ServerConfig, SyncServer};
use tracing::debug;

/// Runs the handle command.
pub fn run(config: ServerConfig, event_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let raw = match event_path {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let response = dispatch(config, &raw)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Decodes `raw` as an event and dispatches it against the configured store.
pub fn dispatch(config: ServerConfig, raw: &[u8]) -> Result<Value, Box<dyn std::error::Error>> {
    let event: Value = serde_json::from_slice(raw)?;
    let server = SyncServer::open(config)?;
    debug!(store = %server.config().store_path.display(), "dispatching event");
    Ok(server.handle_event(&event)?)
}
