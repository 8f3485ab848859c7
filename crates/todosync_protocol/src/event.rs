//! Inbound resolver events.
//!
//! A GraphQL resolver forwards each field invocation as a JSON event. The
//! operation name is read from `info.fieldName`, falling back to
//! `operationName` and then `operation`; arguments come from `arguments`,
//! falling back to the top level of the event.

use crate::checkpoint::Checkpoint;
use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{PullBulk, PushResponse, PushRow};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Operations answered by the sync endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch documents changed since a checkpoint.
    PullTodo,
    /// Upload local changes.
    PushTodo,
    /// Latest change bulk published by a push.
    StreamTodo,
}

impl Operation {
    /// Returns the GraphQL field name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::PullTodo => "pullTodo",
            Operation::PushTodo => "pushTodo",
            Operation::StreamTodo => "streamTodo",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ProtocolError;

    fn from_str(name: &str) -> ProtocolResult<Self> {
        match name {
            "pullTodo" => Ok(Operation::PullTodo),
            "pushTodo" => Ok(Operation::PushTodo),
            "streamTodo" => Ok(Operation::StreamTodo),
            other => Err(ProtocolError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    /// `pullTodo(checkpoint?)`.
    Pull {
        /// Client checkpoint, if the client has synced before.
        checkpoint: Option<Checkpoint>,
    },
    /// `pushTodo(rows)`.
    Push {
        /// Rows in client order.
        rows: Vec<PushRow>,
    },
    /// `streamTodo`.
    Stream,
}

impl SyncRequest {
    /// Returns the operation of this request.
    pub fn operation(&self) -> Operation {
        match self {
            SyncRequest::Pull { .. } => Operation::PullTodo,
            SyncRequest::Push { .. } => Operation::PushTodo,
            SyncRequest::Stream => Operation::StreamTodo,
        }
    }

    /// Decodes a request from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> ProtocolResult<Self> {
        let event: Value = serde_json::from_slice(bytes)?;
        Self::from_event(&event)
    }

    /// Decodes a request from a resolver event.
    pub fn from_event(event: &Value) -> ProtocolResult<Self> {
        let name = operation_name(event).ok_or(ProtocolError::MissingOperation)?;

        match name.parse::<Operation>()? {
            Operation::PullTodo => {
                let checkpoint = argument(event, "checkpoint")
                    .map(|raw| {
                        serde_json::from_value::<Checkpoint>(raw.clone()).map_err(|e| {
                            ProtocolError::invalid_request(format!("checkpoint: {e}"))
                        })
                    })
                    .transpose()?;
                Ok(SyncRequest::Pull { checkpoint })
            }
            Operation::PushTodo => {
                let raw = argument(event, "rows")
                    .ok_or_else(|| ProtocolError::invalid_request("pushTodo requires rows"))?;
                let rows = serde_json::from_value::<Vec<PushRow>>(raw.clone())
                    .map_err(|e| ProtocolError::invalid_request(format!("rows: {e}")))?;
                Ok(SyncRequest::Push { rows })
            }
            Operation::StreamTodo => Ok(SyncRequest::Stream),
        }
    }
}

/// A response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SyncResponse {
    /// Answer to `pullTodo` and `streamTodo`.
    Bulk(PullBulk),
    /// Answer to `pushTodo`.
    Push(PushResponse),
}

impl SyncResponse {
    /// Serializes the response body.
    pub fn to_json(&self) -> ProtocolResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn operation_name(event: &Value) -> Option<&str> {
    non_empty_str(event.pointer("/info/fieldName"))
        .or_else(|| non_empty_str(event.get("operationName")))
        .or_else(|| non_empty_str(event.get("operation")))
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn argument<'a>(event: &'a Value, name: &str) -> Option<&'a Value> {
    present(event.get("arguments").and_then(|args| args.get(name)))
        .or_else(|| present(event.get(name)))
}
