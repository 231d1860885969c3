use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::BufferHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorCode {
    InvalidHandle,
    CommandFailed,
    Transport,
    Internal,
}

/// Failure reported by the transport for a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum MirrorError {
    #[error("buffer {handle} info is missing field '{field}' ({expected})")]
    MissingField {
        handle: BufferHandle,
        field: &'static str,
        expected: &'static str,
    },
    #[error("remote call {call} failed: {source}")]
    Remote {
        call: &'static str,
        #[source]
        source: RpcError,
    },
    #[error("remote call {call} timed out after {after:?}")]
    Timeout { call: &'static str, after: Duration },
    #[error("action emitter has been closed")]
    EmitterClosed,
}

impl MirrorError {
    pub fn remote(call: &'static str, source: RpcError) -> Self {
        Self::Remote { call, source }
    }

    /// Shape errors are never worth retrying; everything else is the
    /// caller's call.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}
