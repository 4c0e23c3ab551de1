//! Socket Backends
//!
//! Connection implementations handed to peers. The backend is chosen once
//! when the binding is built; shared code never asks which one it got.

pub mod channel;
pub mod hub;

use std::net::SocketAddr;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;

pub use channel::ChannelConnection;
pub use hub::{HubConnection, TopicHub};

use crate::domain::{Connection, Payload};

/// Instruction for a socket writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame { payload: Payload, compress: bool },
    Close { code: Option<u16>, reason: Option<String> },
    Terminate,
}

/// How topic publish is carried out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MulticastMode {
    /// Registry scan, one send per subscriber
    #[default]
    Manual,
    /// Hub-indexed subscribers
    Native,
}

/// Connection factory for one adapter
#[derive(Debug, Clone)]
pub enum Backend {
    Channel,
    Hub(Arc<TopicHub>),
}

impl Backend {
    pub fn new(mode: MulticastMode) -> Self {
        match mode {
            MulticastMode::Manual => Backend::Channel,
            MulticastMode::Native => Backend::Hub(TopicHub::new()),
        }
    }

    pub fn mode(&self) -> MulticastMode {
        match self {
            Backend::Channel => MulticastMode::Manual,
            Backend::Hub(_) => MulticastMode::Native,
        }
    }

    pub fn connect(
        &self,
        namespace: &str,
        remote_addr: Option<SocketAddr>,
    ) -> (Arc<dyn Connection>, mpsc::UnboundedReceiver<Outbound>) {
        match self {
            Backend::Channel => {
                let (conn, rx) = ChannelConnection::new(remote_addr);
                (Arc::new(conn), rx)
            }
            Backend::Hub(hub) => {
                let (conn, rx) = hub.connect(namespace, remote_addr);
                (Arc::new(conn), rx)
            }
        }
    }
}
