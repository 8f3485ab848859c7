//! Error types for the sync server.

use thiserror::Error;
use todosync_protocol::ProtocolError;
use todosync_storage::StoreError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
///
/// Push conflicts are not errors; they are reported in the push response.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing or unsupported operation, or unusable arguments.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// A push carried more rows than allowed.
    #[error("too many rows: {len} > {max}")]
    BatchTooLarge {
        /// Rows in the request.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ServerError {
    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ServerError::Protocol(ProtocolError::invalid_request(message))
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::Protocol(_) | ServerError::BatchTooLarge { .. }
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::Storage(_) | ServerError::Config(_))
    }
}
