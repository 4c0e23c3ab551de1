//! Domain Layer
//!
//! Runtime-independent connection model:
//! - **Request**: upgrade request metadata, per-connection context, rejection responses
//! - **Peer**: one logical connection and its topic subscriptions
//! - **Registry**: live peers grouped by namespace, topic fan-out
//! - **Message**: inbound frames with lazy text decoding
//! - **Connection**: the socket contract runtime bindings implement

pub mod connection;
pub mod message;
pub mod peer;
pub mod registry;
pub mod request;

pub use connection::{Connection, Multicast, SendOptions};
pub use message::{Message, Payload};
pub use peer::{CloseDetails, Peer, ReadyState};
pub use registry::{PeerRegistry, PeerSet};
pub use request::{PeerContext, UpgradeOutcome, UpgradeRequest, UpgradeResponse};
