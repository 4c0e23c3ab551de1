//! Unit test fixtures.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, Method};
use tokio::sync::mpsc;

use crate::domain::{Payload, Peer, PeerRegistry, UpgradeRequest};
use crate::infrastructure::transport::{ChannelConnection, Outbound};

pub fn request(uri: &str) -> UpgradeRequest {
    let mut headers = HeaderMap::new();
    headers.insert(header::HOST, HeaderValue::from_static("localhost"));
    UpgradeRequest::new(Method::GET, uri.parse().unwrap(), headers)
}

/// Peer on a channel backend, not yet registered
pub fn unregistered_peer(
    registry: &PeerRegistry,
    namespace: &str,
) -> (Arc<Peer>, mpsc::UnboundedReceiver<Outbound>) {
    let (conn, rx) = ChannelConnection::new(None);
    let set = registry.get_or_create_set(namespace);
    (Peer::new(request(namespace), Arc::new(conn), set), rx)
}

/// Registered peer in `registry`
pub fn test_peer_in(
    registry: &PeerRegistry,
    namespace: &str,
) -> (Arc<Peer>, mpsc::UnboundedReceiver<Outbound>) {
    let (peer, rx) = unregistered_peer(registry, namespace);
    registry.add(&peer);
    (peer, rx)
}

/// Registered peer in a registry of its own
pub fn test_peer(namespace: &str) -> (Arc<Peer>, mpsc::UnboundedReceiver<Outbound>) {
    test_peer_in(&PeerRegistry::new(), namespace)
}

/// Frames queued so far, ignoring close and terminate instructions
pub fn drain_frames(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Payload> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|out| match out {
            Outbound::Frame { payload, .. } => Some(payload),
            _ => None,
        })
        .collect()
}
