//! Backend Connection Contract
//!
//! The raw socket handle a runtime binding owns. Peers only ever talk to the
//! socket through these traits, so backend differences (compression support,
//! native multicast, how the remote address is found) stay behind them.

use super::message::Payload;
use crate::shared::SendError;

/// Options accepted by `send` and `publish`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Per-message compression hint; backends without support ignore it.
    pub compress: Option<bool>,
}

impl SendOptions {
    pub fn compressed() -> Self {
        Self {
            compress: Some(true),
        }
    }
}

/// Non-owning handle to one physical socket
pub trait Connection: Send + Sync + 'static {
    /// Queue a frame, returning the number of bytes accepted
    fn send(&self, payload: &Payload, options: SendOptions) -> Result<usize, SendError>;

    /// Start the close handshake
    fn close(&self, code: Option<u16>, reason: Option<String>);

    /// Drop the socket without a close handshake
    fn terminate(&self);

    /// `None` when the backend can't tell or the socket is already gone
    fn remote_address(&self) -> Option<String>;

    /// Backend-provided topic broadcast, when the backend has one
    fn multicast(&self) -> Option<&dyn Multicast> {
        None
    }
}

/// Native topic broadcast scoped to one connection.
///
/// `publish` must never deliver to the connection it is called on.
pub trait Multicast: Send + Sync {
    fn subscribe(&self, topic: &str);

    fn unsubscribe(&self, topic: &str);

    /// Returns the number of subscribers reached
    fn publish(&self, topic: &str, payload: &Payload, options: SendOptions) -> Result<usize, SendError>;

    /// Drop every backend subscription of this connection
    fn leave_all(&self);
}
