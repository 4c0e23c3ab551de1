//! Peer Registry
//!
//! Live peers grouped by namespace. Sets are created on demand and kept for
//! the registry's lifetime, so a peer's handle to its set never dangles.

use std::sync::Arc;

use dashmap::DashMap;

use super::connection::SendOptions;
use super::message::Payload;
use super::peer::Peer;

/// Live peers of one namespace
#[derive(Debug)]
pub struct PeerSet {
    namespace: String,
    peers: DashMap<String, Arc<Peer>>,
}

impl PeerSet {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            peers: DashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns `false` if the peer was already present
    pub fn insert(&self, peer: Arc<Peer>) -> bool {
        self.peers.insert(peer.id().to_string(), peer).is_none()
    }

    /// Returns `false` if the peer was not present
    pub fn remove(&self, peer: &Peer) -> bool {
        self.peers.remove(peer.id()).is_some()
    }

    pub fn contains(&self, peer: &Peer) -> bool {
        self.peers.contains_key(peer.id())
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Arc<Peer>> {
        self.peers.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Any live member, used as a multicast origin
    pub fn first(&self) -> Option<Arc<Peer>> {
        self.peers.iter().next().map(|entry| entry.value().clone())
    }

    /// Send `payload` to every subscriber of `topic` except `origin`.
    ///
    /// Recipients are collected first and re-checked before each send, so a
    /// peer removed meanwhile is skipped. Failed sends are not retried.
    pub fn fan_out(
        &self,
        origin: Option<&Peer>,
        topic: &str,
        payload: &Payload,
        options: SendOptions,
    ) -> usize {
        let recipients: Vec<Arc<Peer>> = self
            .peers
            .iter()
            .filter(|entry| !origin.is_some_and(|o| std::ptr::eq(entry.value().as_ref(), o)))
            .filter(|entry| entry.value().is_subscribed(topic))
            .map(|entry| entry.value().clone())
            .collect();

        let mut delivered = 0;
        for peer in recipients {
            if !self.contains(&peer) {
                continue;
            }
            match peer.send(payload.clone(), options) {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        peer_id = %peer.id(),
                        namespace = %self.namespace,
                        topic = topic,
                        error = %e,
                        "Dropped publish to peer"
                    );
                }
            }
        }

        tracing::debug!(
            namespace = %self.namespace,
            topic = topic,
            recipients = delivered,
            "Published to topic"
        );
        delivered
    }
}

/// Namespace-scoped collection of live peers
#[derive(Debug, Default)]
pub struct PeerRegistry {
    namespaces: DashMap<String, Arc<PeerSet>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing set for `namespace`, or a new empty one
    pub fn get_or_create_set(&self, namespace: &str) -> Arc<PeerSet> {
        if let Some(set) = self.namespaces.get(namespace) {
            return set.clone();
        }
        self.namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(PeerSet::new(namespace)))
            .clone()
    }

    pub fn get(&self, namespace: &str) -> Option<Arc<PeerSet>> {
        self.namespaces.get(namespace).map(|set| set.clone())
    }

    pub fn add(&self, peer: &Arc<Peer>) -> bool {
        self.get_or_create_set(peer.namespace()).insert(peer.clone())
    }

    /// Idempotent; removing an absent peer is a no-op
    pub fn remove(&self, peer: &Peer) -> bool {
        self.get(peer.namespace())
            .map(|set| set.remove(peer))
            .unwrap_or(false)
    }

    pub fn contains(&self, peer: &Peer) -> bool {
        self.get(peer.namespace())
            .map(|set| set.contains(peer))
            .unwrap_or(false)
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn sets(&self) -> Vec<Arc<PeerSet>> {
        self.namespaces.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Snapshot of `namespace -> peers`
    pub fn snapshot(&self) -> Vec<(String, Vec<Arc<Peer>>)> {
        self.sets()
            .into_iter()
            .map(|set| (set.namespace().to_string(), set.snapshot()))
            .collect()
    }

    /// Total live peers across namespaces
    pub fn len(&self) -> usize {
        self.namespaces.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
