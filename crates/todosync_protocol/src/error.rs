//! Error types for protocol handling.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while interpreting an inbound request.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The event carried no operation name.
    #[error("missing operation")]
    MissingOperation,

    /// The operation name is not one this service answers.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The request arguments are unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A timestamp could not be parsed as ISO-8601.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// The payload is not valid JSON for the expected shape.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}
