//! Native multicast backend.
//!
//! A [`TopicHub`] indexes subscriber senders per `(namespace, topic)`, so a
//! publish goes straight to the subscribers without scanning the registry.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::channel::ChannelConnection;
use super::Outbound;
use crate::domain::{Connection, Multicast, Payload, SendOptions};
use crate::infrastructure::metrics;
use crate::shared::SendError;

type TopicKey = (String, String);

/// Shared topic index for every [`HubConnection`] of one adapter
#[derive(Debug, Default)]
pub struct TopicHub {
    next_id: AtomicU64,
    topics: DashMap<TopicKey, DashMap<u64, mpsc::UnboundedSender<Outbound>>>,
}

impl TopicHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a connection handle on this hub
    pub fn connect(
        self: &Arc<Self>,
        namespace: &str,
        remote_addr: Option<SocketAddr>,
    ) -> (HubConnection, mpsc::UnboundedReceiver<Outbound>) {
        let (inner, rx) = ChannelConnection::new(remote_addr);
        let conn = HubConnection {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            namespace: namespace.to_string(),
            hub: self.clone(),
            inner,
        };
        (conn, rx)
    }

    /// Subscriber count for a topic
    pub fn subscribers(&self, namespace: &str, topic: &str) -> usize {
        self.topics
            .get(&(namespace.to_string(), topic.to_string()))
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    fn join(&self, key: TopicKey, id: u64, tx: mpsc::UnboundedSender<Outbound>) {
        self.topics.entry(key).or_default().insert(id, tx);
    }

    fn leave(&self, key: &TopicKey, id: u64) {
        if let Some(subs) = self.topics.get(key) {
            subs.remove(&id);
        }
        self.topics.remove_if(key, |_, subs| subs.is_empty());
    }

    fn leave_all(&self, id: u64) {
        for entry in self.topics.iter() {
            entry.value().remove(&id);
        }
        self.topics.retain(|_, subs| !subs.is_empty());
    }

    fn broadcast(&self, key: &TopicKey, origin: u64, frame: &Outbound) -> usize {
        let Some(subs) = self.topics.get(key) else {
            return 0;
        };
        let delivered = subs
            .iter()
            .filter(|entry| *entry.key() != origin)
            .filter(|entry| entry.value().send(frame.clone()).is_ok())
            .count();
        metrics::record_messages("outbound", delivered);
        delivered
    }
}

/// Connection handle with hub-backed topic broadcast
#[derive(Debug)]
pub struct HubConnection {
    id: u64,
    namespace: String,
    hub: Arc<TopicHub>,
    inner: ChannelConnection,
}

impl HubConnection {
    fn key(&self, topic: &str) -> TopicKey {
        (self.namespace.clone(), topic.to_string())
    }
}

impl Connection for HubConnection {
    fn send(&self, payload: &Payload, options: SendOptions) -> Result<usize, SendError> {
        self.inner.push(Outbound::Frame {
            payload: payload.clone(),
            compress: options.compress.unwrap_or(false),
        })?;
        Ok(payload.len())
    }

    fn close(&self, code: Option<u16>, reason: Option<String>) {
        self.inner.close(code, reason);
    }

    fn terminate(&self) {
        self.inner.terminate();
    }

    fn remote_address(&self) -> Option<String> {
        self.inner.remote_address()
    }

    fn multicast(&self) -> Option<&dyn Multicast> {
        Some(self)
    }
}

impl Multicast for HubConnection {
    fn subscribe(&self, topic: &str) {
        self.hub.join(self.key(topic), self.id, self.inner.sender().clone());
    }

    fn unsubscribe(&self, topic: &str) {
        self.hub.leave(&self.key(topic), self.id);
    }

    fn publish(&self, topic: &str, payload: &Payload, options: SendOptions) -> Result<usize, SendError> {
        let frame = Outbound::Frame {
            payload: payload.clone(),
            compress: options.compress.unwrap_or(false),
        };
        Ok(self.hub.broadcast(&self.key(topic), self.id, &frame))
    }

    fn leave_all(&self) {
        self.hub.leave_all(self.id);
    }
}

impl Drop for HubConnection {
    fn drop(&mut self) {
        self.hub.leave_all(self.id);
    }
}
