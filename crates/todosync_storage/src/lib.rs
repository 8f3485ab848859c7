//! # todosync storage
//!
//! The keyed document collection behind the sync endpoint.
//!
//! Stores know nothing about the replication protocol. They keep todo
//! records under their own [`DocumentKey`] type, stamp every record with the
//! server write time, and answer ordered scans by cursor [`Position`].
//!
//! ## Connections
//!
//! A [`Connector`] hands out scoped connections. A connection is released
//! when dropped, so every exit path of a request gives it back, errors
//! included.
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral deployments
//! - [`FileStore`] - Persistent JSON-lines log, safe across processes and
//!   compactable with [`FileStore::compact`]
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use todosync_storage::{Collection, Connector, DocumentKey, MemoryStore, StoredTodo};
//!
//! let store = MemoryStore::new();
//! let mut conn = store.connect().unwrap();
//! let key = DocumentKey::parse("1").unwrap();
//! conn.insert_one(StoredTodo::new(key.clone(), "Walk the dog", false, "2024-11-25T12:30:00", false, Utc::now()))
//!     .unwrap();
//! assert!(conn.find_one(&key).unwrap().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod index;
mod memory;
mod record;

pub use backend::{Collection, Connector, UpdateOutcome};
pub use error::{StoreError, StoreResult};
pub use file::{CompactStats, FileConnection, FileStore};
pub use memory::{MemoryConnection, MemoryStore};
pub use record::{DocumentKey, Position, StoredTodo, TodoFields};
