//! Request-level errors returned to the dispatcher.

use thiserror::Error;

/// JSON-RPC error code for requests the server cannot honor.
pub const REQUEST_FAILED: i32 = -32803;

/// An error a feature handler returns instead of a response. The
/// dispatcher translates it into an LSP error reply; handlers never
/// panic or throw past this boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("{reason}")]
    RequestFailed { reason: String },
}

impl RpcError {
    pub fn request_failed(reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            RpcError::RequestFailed { .. } => REQUEST_FAILED,
        }
    }
}

pub type RpcResult<T> = Result<T, RpcError>;
