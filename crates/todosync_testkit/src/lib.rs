//! # todosync testkit
//!
//! Test utilities for todosync.
//!
//! This crate provides:
//! - Servers over temporary in-memory and file stores
//! - Builders for resolver events
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use todosync_testkit::prelude::*;
//!
//! let server = TestServer::memory();
//! server.push_ok(vec![insert_row("1", "Buy groceries")]);
//! let (documents, _) = server.pull_all(None);
//! assert_eq!(documents.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
