//! # todosync protocol
//!
//! Wire types for checkpoint-based todo replication.
//!
//! This crate provides:
//! - [`Todo`] and [`TodoInput`] documents
//! - [`Checkpoint`] cursors and ISO-8601 handling
//! - Push/pull payloads ([`PushRow`], [`PushResponse`], [`PullBulk`])
//! - The inbound resolver event envelope ([`SyncRequest`])
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checkpoint;
mod error;
mod event;
mod messages;
mod todo;

pub use checkpoint::{iso8601, Checkpoint, SENTINEL_ID};
pub use error::{ProtocolError, ProtocolResult};
pub use event::{Operation, SyncRequest, SyncResponse};
pub use messages::{ChangeAction, PullBulk, PushResponse, PushRow, CONFLICTS_DETECTED, NO_CONFLICTS};
pub use todo::{Todo, TodoInput};
