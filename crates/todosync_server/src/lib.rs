//! # todosync server
//!
//! Checkpoint-based pull/push sync endpoint for a todo collection.
//!
//! This crate provides:
//! - Checkpoint resolution derived from the stored data
//! - Incremental, paginated pulls
//! - Pushes with per-row conflict detection and soft deletes
//! - A change feed behind `streamTodo`
//!
//! # Architecture
//!
//! The backing store is the single source of truth. Nothing about the
//! collection is cached in the server: every call opens a scoped connection
//! on the store, reads what it needs and releases the connection when it
//! returns. Pushes are serialized by an in-process lock; the file store
//! additionally locks the log across processes.
//!
//! # Protocol
//!
//! 1. Client pulls with its last checkpoint (none on first sync)
//! 2. Server answers with documents written after it and a new checkpoint
//! 3. Client pushes rows of `(assumed server state, new state)`
//! 4. Server applies rows whose assumption holds and returns the rest as
//!    conflicts

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod checkpoint;
mod config;
mod documents;
mod error;
mod feed;
mod handler;
mod pull;
mod push;
mod server;

pub use checkpoint::CheckpointResolver;
pub use config::{
    ServerConfig, ENV_COLLECTION, ENV_MAX_PUSH_BATCH, ENV_PULL_LIMIT, ENV_STORE_PATH,
};
pub use error::{ServerError, ServerResult};
pub use feed::ChangeFeed;
pub use handler::{HandlerContext, RequestHandler};
pub use pull::PullHandler;
pub use push::PushHandler;
pub use server::SyncServer;
