//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store could not be opened for this call.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A stored record could not be read back.
    #[error("store corrupted at line {line}: {reason}")]
    Corrupted {
        /// 1-based line of the log.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// An insert hit a key that already exists.
    #[error("duplicate document key: {0}")]
    DuplicateKey(String),

    /// A key was empty.
    #[error("invalid document key: {0:?}")]
    InvalidKey(String),

    /// A record could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
