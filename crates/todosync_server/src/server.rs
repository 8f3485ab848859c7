//! Main sync server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler};
use serde_json::Value;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use todosync_protocol::{Checkpoint, PullBulk, PushResponse, PushRow, SyncRequest, SyncResponse};
use todosync_storage::{Connector, FileStore, MemoryStore};
use tracing::{debug, error};

/// The sync server.
///
/// Answers `pullTodo`, `pushTodo` and `streamTodo` against one collection
/// held by a [`Connector`]. The store is the single source of truth: the
/// checkpoint is read from it on every call, so several server instances
/// sharing one [`FileStore`] agree on it.
///
/// # Example
///
/// ```
/// use todosync_server::{ServerConfig, SyncServer};
/// use serde_json::json;
///
/// let server = SyncServer::in_memory(ServerConfig::default()).unwrap();
///
/// let pushed = server
///     .handle_event(&json!({
///         "info": {"fieldName": "pushTodo"},
///         "arguments": {"rows": [{"newDocumentState": {
///             "id": "5", "name": "New", "done": false,
///             "timestamp": "2024-11-25T10:00:00"
///         }}]}
///     }))
///     .unwrap();
/// assert_eq!(pushed["changeAction"], json!(["inserted"]));
///
/// let pulled = server.handle_event(&json!({"operationName": "pullTodo"})).unwrap();
/// assert_eq!(pulled["documents"][0]["id"], "5");
/// ```
pub struct SyncServer<C: Connector> {
    handler: RequestHandler<C>,
    context: Arc<HandlerContext<C>>,
}

impl<C: Connector> SyncServer<C> {
    /// Creates a sync server over the given store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`](crate::ServerError::Config) if the
    /// configuration is invalid.
    pub fn new(config: ServerConfig, connector: C) -> ServerResult<Self> {
        config.validate()?;
        let context = Arc::new(HandlerContext::new(config, connector));
        let handler = RequestHandler::new(Arc::clone(&context));

        Ok(Self { handler, context })
    }

    /// Handles a resolver event and returns the JSON response body.
    ///
    /// Failures are logged here and returned to the caller.
    pub fn handle_event(&self, event: &Value) -> ServerResult<Value> {
        let result = SyncRequest::from_event(event)
            .map_err(Into::into)
            .and_then(|request| self.handle_request(request))
            .and_then(|response| response.to_json().map_err(Into::into));

        if let Err(e) = &result {
            error!(
                collection = %self.context.config.collection,
                client_error = e.is_client_error(),
                "sync request failed: {e}"
            );
        }
        result
    }

    /// Handles a decoded request.
    pub fn handle_request(&self, request: SyncRequest) -> ServerResult<SyncResponse> {
        debug!(operation = %request.operation(), "handling request");
        self.handler.handle(request)
    }

    /// Returns the documents changed after `checkpoint`.
    pub fn pull(&self, checkpoint: Option<Checkpoint>) -> ServerResult<PullBulk> {
        self.handler.handle_pull(checkpoint)
    }

    /// Applies pushed rows.
    pub fn push(&self, rows: Vec<PushRow>) -> ServerResult<PushResponse> {
        self.handler.handle_push(rows)
    }

    /// Returns every stored document and the checkpoint of the latest write.
    pub fn stream(&self) -> ServerResult<PullBulk> {
        self.handler.handle_stream()
    }

    /// Subscribes to bulks published by future pushes.
    pub fn subscribe(&self) -> Receiver<PullBulk> {
        self.context.feed.subscribe()
    }

    /// Returns the current server checkpoint.
    pub fn checkpoint(&self) -> ServerResult<Checkpoint> {
        self.handler.checkpoint()
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Returns the backing store.
    pub fn store(&self) -> &C {
        &self.context.connector
    }
}

impl SyncServer<MemoryStore> {
    /// Creates a sync server over an empty in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn in_memory(config: ServerConfig) -> ServerResult<Self> {
        Self::new(config, MemoryStore::new())
    }
}

impl SyncServer<FileStore> {
    /// Opens a sync server over the file store at `config.store_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the store cannot
    /// be opened.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = FileStore::open(&config.store_path)?;
        Self::new(config, store)
    }
}
