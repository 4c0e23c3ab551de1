//! Channel-backed connection without native multicast.
//!
//! Frames are queued on an unbounded channel drained by the socket writer
//! task; topic publish falls back to registry fan-out.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use super::Outbound;
use crate::domain::{Connection, Payload, SendOptions};
use crate::infrastructure::metrics;
use crate::shared::SendError;

/// Connection handle for backends that can only send point-to-point
#[derive(Debug, Clone)]
pub struct ChannelConnection {
    tx: mpsc::UnboundedSender<Outbound>,
    remote_addr: Option<SocketAddr>,
}

impl ChannelConnection {
    pub fn new(remote_addr: Option<SocketAddr>) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, remote_addr }, rx)
    }

    pub(crate) fn sender(&self) -> &mpsc::UnboundedSender<Outbound> {
        &self.tx
    }

    pub(crate) fn push(&self, frame: Outbound) -> Result<(), SendError> {
        let is_frame = matches!(frame, Outbound::Frame { .. });
        self.tx.send(frame).map_err(|_| SendError::Closed)?;
        if is_frame {
            metrics::record_message("outbound");
        }
        Ok(())
    }
}

impl Connection for ChannelConnection {
    fn send(&self, payload: &Payload, _options: SendOptions) -> Result<usize, SendError> {
        // No per-message compression on this backend
        self.push(Outbound::Frame {
            payload: payload.clone(),
            compress: false,
        })?;
        Ok(payload.len())
    }

    fn close(&self, code: Option<u16>, reason: Option<String>) {
        let _ = self.push(Outbound::Close { code, reason });
    }

    fn terminate(&self) {
        let _ = self.push(Outbound::Terminate);
    }

    fn remote_address(&self) -> Option<String> {
        if self.tx.is_closed() {
            return None;
        }
        self.remote_addr.map(|addr| addr.ip().to_string())
    }
}
