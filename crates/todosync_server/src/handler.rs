//! Request handlers for sync operations.

use crate::checkpoint::CheckpointResolver;
use crate::config::ServerConfig;
use crate::documents::todo_from_record;
use crate::error::ServerResult;
use crate::feed::ChangeFeed;
use crate::pull::PullHandler;
use crate::push::PushHandler;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use todosync_protocol::{Checkpoint, PullBulk, PushResponse, PushRow, SyncRequest, SyncResponse};
use todosync_storage::{Collection, Connector};
use tracing::debug;

/// Context for request handling.
pub struct HandlerContext<C> {
    /// Server configuration.
    pub config: ServerConfig,
    /// Backing store.
    pub connector: C,
    /// Checkpoint resolver (sentinel fixed at construction).
    pub resolver: CheckpointResolver,
    /// Feed of applied pushes.
    pub feed: ChangeFeed,
    /// Serializes pushes within this process.
    push_lock: Mutex<()>,
}

impl<C: Connector> HandlerContext<C> {
    /// Creates a new handler context. The sentinel checkpoint carries the
    /// current time.
    pub fn new(config: ServerConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            resolver: CheckpointResolver::new(Utc::now()),
            feed: ChangeFeed::new(),
            push_lock: Mutex::new(()),
        }
    }
}

/// Handler for sync requests.
///
/// Each call opens one store connection and releases it when the call
/// returns, on success and on error.
pub struct RequestHandler<C> {
    context: Arc<HandlerContext<C>>,
}

impl<C: Connector> RequestHandler<C> {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext<C>>) -> Self {
        Self { context }
    }

    /// Handles a decoded request.
    pub fn handle(&self, request: SyncRequest) -> ServerResult<SyncResponse> {
        match request {
            SyncRequest::Pull { checkpoint } => self.handle_pull(checkpoint).map(SyncResponse::Bulk),
            SyncRequest::Push { rows } => self.handle_push(rows).map(SyncResponse::Push),
            SyncRequest::Stream => self.handle_stream().map(SyncResponse::Bulk),
        }
    }

    /// Handles a pull request.
    pub fn handle_pull(&self, checkpoint: Option<Checkpoint>) -> ServerResult<PullBulk> {
        let context = &self.context;
        let connection = context.connector.connect()?;
        PullHandler::new(&context.resolver, context.config.pull_limit).pull(&connection, checkpoint)
    }

    /// Handles a push request, publishing the written documents to the
    /// change feed.
    pub fn handle_push(&self, rows: Vec<PushRow>) -> ServerResult<PushResponse> {
        let context = &self.context;
        let _guard = context.push_lock.lock();
        debug!(collection = %context.config.collection, rows = rows.len(), "push received");

        let mut connection = context.connector.connect()?;
        let response = PushHandler::new(&context.resolver, context.config.max_push_batch)
            .push(&mut connection, rows)?;

        if response.has_changes() {
            let checkpoint = context.resolver.current(&connection)?;
            context
                .feed
                .publish(PullBulk::new(response.changes.clone(), checkpoint));
        }
        Ok(response)
    }

    /// Handles a stream request: every stored document, soft-deleted ones
    /// included, in cursor order, with the checkpoint of the latest write.
    ///
    /// Read from the store on each call, so every server sharing a store
    /// gives the same answer.
    pub fn handle_stream(&self) -> ServerResult<PullBulk> {
        let context = &self.context;
        let connection = context.connector.connect()?;
        let records = connection.find_since(None, usize::MAX)?;
        let checkpoint = context.resolver.current(&connection)?;

        debug!(documents = records.len(), checkpoint = %checkpoint.id, "stream answered");
        Ok(PullBulk::new(
            records.iter().map(todo_from_record).collect(),
            checkpoint,
        ))
    }

    /// Returns the current checkpoint.
    pub fn checkpoint(&self) -> ServerResult<Checkpoint> {
        let connection = self.context.connector.connect()?;
        self.context.resolver.current(&connection)
    }
}
