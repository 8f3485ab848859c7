//! Server configuration.

use crate::error::{ServerError, ServerResult};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Environment variable holding the store path.
pub const ENV_STORE_PATH: &str = "TODOSYNC_STORE_PATH";
/// Environment variable holding the collection name.
pub const ENV_COLLECTION: &str = "TODOSYNC_COLLECTION";
/// Environment variable holding the pull page size.
pub const ENV_PULL_LIMIT: &str = "TODOSYNC_PULL_LIMIT";
/// Environment variable holding the push batch limit.
pub const ENV_MAX_PUSH_BATCH: &str = "TODOSYNC_MAX_PUSH_BATCH";

/// Configuration for the sync server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Collection name, used in log context and as the default store
    /// file stem.
    pub collection: String,
    /// Path of the file store.
    pub store_path: PathBuf,
    /// Maximum records scanned per pull.
    pub pull_limit: usize,
    /// Maximum rows per push.
    pub max_push_batch: usize,
}

impl ServerConfig {
    /// Creates a configuration for the given store path.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            collection: "todos".to_string(),
            store_path: store_path.into(),
            pull_limit: 100,
            max_push_batch: 100,
        }
    }

    /// Creates a configuration whose store file is `<collection>.jsonl`
    /// in the working directory.
    pub fn for_collection(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        Self::new(format!("{collection}.jsonl")).with_collection(collection)
    }

    /// Sets the collection name. The store path is left as is.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the pull page size.
    pub fn with_pull_limit(mut self, limit: usize) -> Self {
        self.pull_limit = limit;
        self
    }

    /// Sets the maximum push batch size.
    pub fn with_max_push_batch(mut self, size: usize) -> Self {
        self.max_push_batch = size;
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> ServerResult<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset variables.
    ///
    /// Without a store path the store file is named after the collection.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        let mut config = match trimmed(&lookup, ENV_COLLECTION) {
            Some(collection) => Self::for_collection(collection),
            None => Self::default(),
        };

        if let Some(path) = trimmed(&lookup, ENV_STORE_PATH) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(raw) = trimmed(&lookup, ENV_PULL_LIMIT) {
            config.pull_limit = parse_limit(ENV_PULL_LIMIT, &raw)?;
        }
        if let Some(raw) = trimmed(&lookup, ENV_MAX_PUSH_BATCH) {
            config.max_push_batch = parse_limit(ENV_MAX_PUSH_BATCH, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the limits are usable.
    pub fn validate(&self) -> ServerResult<()> {
        if self.pull_limit == 0 {
            return Err(ServerError::Config("pull limit must be positive".into()));
        }
        if self.max_push_batch == 0 {
            return Err(ServerError::Config("push batch limit must be positive".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(ServerError::Config("collection name must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::for_collection("todos")
    }
}

fn trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_limit(name: &str, raw: &str) -> ServerResult<usize> {
    raw.parse::<usize>()
        .map_err(|_| ServerError::Config(format!("{name} must be a positive integer, got {raw:?}")))
}
