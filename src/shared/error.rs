//! Adapter Error Types
//!
//! Centralized error handling for the hook and peer layers.

use std::fmt;
use std::sync::Arc;

use crate::domain::UpgradeResponse;

/// Boxed error accepted from hooks, resolvers and backends
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Adapter result type
pub type Result<T, E = AdapterError> = std::result::Result<T, E>;

/// Adapter error type
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The `upgrade` hook declined the connection.
    #[error("Upgrade rejected with status {}", .0.status)]
    UpgradeRejected(UpgradeResponse),

    /// A hook or resolver failed without attaching a response.
    #[error("Hook failed: {0}")]
    Hook(#[source] BoxError),

    #[error(transparent)]
    Transport(#[from] WsError),

    #[error(transparent)]
    Send(#[from] SendError),
}

impl AdapterError {
    /// Reject an upgrade with the given response
    pub fn reject(response: impl Into<UpgradeResponse>) -> Self {
        AdapterError::UpgradeRejected(response.into())
    }

    /// Wrap an arbitrary failure raised inside a hook
    pub fn hook(error: impl Into<BoxError>) -> Self {
        AdapterError::Hook(error.into())
    }

    /// The response attached to this error, if it carries one
    pub fn response(&self) -> Option<&UpgradeResponse> {
        match self {
            AdapterError::UpgradeRejected(res) => Some(res),
            _ => None,
        }
    }
}

/// Outbound send failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The underlying socket is gone or its writer has stopped.
    #[error("Connection closed")]
    Closed,

    #[error("Encode error: {0}")]
    Encode(String),
}

/// Backend-native error normalized into one kind.
///
/// Construction never fails: anything convertible into a boxed error
/// (strings, io errors, transport errors) is accepted and kept as the cause.
#[derive(Clone)]
pub struct WsError {
    cause: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl WsError {
    pub fn new(cause: impl Into<BoxError>) -> Self {
        Self {
            cause: Arc::from(cause.into()),
        }
    }

    /// The original backend value
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.cause
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WebSocket error: {}", self.cause)
    }
}

impl fmt::Debug for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsError")
            .field("cause", &self.cause)
            .finish()
    }
}

impl std::error::Error for WsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.cause)
    }
}
