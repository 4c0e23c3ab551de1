//! Peer Session
//!
//! One logical WebSocket connection, independent of the runtime that carries
//! it. All socket access goes through the [`Connection`] the binding handed in.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use super::connection::{Connection, SendOptions};
use super::message::Payload;
use super::registry::PeerSet;
use super::request::{PeerContext, UpgradeRequest};
use crate::shared::SendError;

/// Connection state as seen by hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

/// Details passed to the `close` hook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseDetails {
    pub code: Option<u16>,
    pub reason: Option<String>,
}

// Lifecycle hook guards
const OPEN_FIRED: u8 = 0b001;
const CLOSE_FIRED: u8 = 0b010;
const ERROR_FIRED: u8 = 0b100;
const RELEASED: u8 = 0b1000;

/// Live connection session
pub struct Peer {
    id: OnceLock<String>,
    namespace: String,
    request: UpgradeRequest,
    topics: RwLock<HashSet<String>>,
    connection: Arc<dyn Connection>,
    peers: Arc<PeerSet>,
    state: AtomicU8,
    fired: AtomicU8,
    connected_at: DateTime<Utc>,
}

impl Peer {
    pub fn new(
        request: UpgradeRequest,
        connection: Arc<dyn Connection>,
        peers: Arc<PeerSet>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: OnceLock::new(),
            namespace: peers.namespace().to_string(),
            request,
            topics: RwLock::new(HashSet::new()),
            connection,
            peers,
            state: AtomicU8::new(ReadyState::Connecting as u8),
            fired: AtomicU8::new(0),
            connected_at: Utc::now(),
        })
    }

    /// Stable id, generated on first access
    pub fn id(&self) -> &str {
        self.id.get_or_init(|| Uuid::new_v4().to_string())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn request(&self) -> &UpgradeRequest {
        &self.request
    }

    /// Context shared by every hook call of this connection
    pub fn context(&self) -> &PeerContext {
        self.request.context()
    }

    pub fn remote_address(&self) -> Option<String> {
        self.connection.remote_address()
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Live peers in the same namespace, this one included
    pub fn peers(&self) -> Vec<Arc<Peer>> {
        self.peers.snapshot()
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.read().iter().cloned().collect()
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.topics.read().contains(topic)
    }

    pub fn send(&self, data: impl Into<Payload>, options: SendOptions) -> Result<usize, SendError> {
        self.connection.send(&data.into(), options)
    }

    /// Send to every other subscriber of `topic` in this namespace.
    ///
    /// Returns how many subscribers the frame was handed to.
    pub fn publish(
        &self,
        topic: &str,
        data: impl Into<Payload>,
        options: SendOptions,
    ) -> Result<usize, SendError> {
        let payload = data.into();
        match self.connection.multicast() {
            Some(multicast) => multicast.publish(topic, &payload, options),
            None => Ok(self.peers.fan_out(Some(self), topic, &payload, options)),
        }
    }

    /// Ignored once the peer has left the registry
    pub fn subscribe(&self, topic: &str) {
        let mut topics = self.topics.write();
        if self.is_released() {
            return;
        }
        if topics.insert(topic.to_string()) {
            if let Some(multicast) = self.connection.multicast() {
                multicast.subscribe(topic);
            }
        }
    }

    pub fn unsubscribe(&self, topic: &str) {
        let mut topics = self.topics.write();
        if topics.remove(topic) {
            if let Some(multicast) = self.connection.multicast() {
                multicast.unsubscribe(topic);
            }
        }
    }

    /// Graceful close handshake
    pub fn close(&self, code: Option<u16>, reason: Option<String>) {
        self.begin_closing();
        self.connection.close(code, reason);
    }

    /// Immediate teardown without a close handshake
    pub fn terminate(&self) {
        self.begin_closing();
        self.connection.terminate();
    }

    /// Detach from topic delivery once the peer leaves the registry.
    ///
    /// Later `subscribe` calls are ignored, so neither backend can reach the
    /// peer again.
    pub(crate) fn detach(&self) {
        let mut topics = self.topics.write();
        self.fired.fetch_or(RELEASED, Ordering::AcqRel);
        topics.clear();
        if let Some(multicast) = self.connection.multicast() {
            multicast.leave_all();
        }
    }

    pub(crate) fn is_released(&self) -> bool {
        self.fired.load(Ordering::Acquire) & RELEASED != 0
    }

    /// Marks the peer open; `false` if it already was
    pub(crate) fn mark_open(&self) -> bool {
        if self.fired.fetch_or(OPEN_FIRED, Ordering::AcqRel) & OPEN_FIRED != 0 {
            return false;
        }
        let _ = self.state.compare_exchange(
            ReadyState::Connecting as u8,
            ReadyState::Open as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        true
    }

    pub(crate) fn is_opened(&self) -> bool {
        self.fired.load(Ordering::Acquire) & OPEN_FIRED != 0
    }

    /// Claims the `close` hook; `false` if it already fired
    pub(crate) fn mark_close_fired(&self) -> bool {
        self.state.store(ReadyState::Closed as u8, Ordering::Release);
        self.fired.fetch_or(CLOSE_FIRED, Ordering::AcqRel) & CLOSE_FIRED == 0
    }

    /// Claims the `error` hook; `false` if it already fired
    pub(crate) fn mark_error_fired(&self) -> bool {
        self.state.store(ReadyState::Closed as u8, Ordering::Release);
        self.fired.fetch_or(ERROR_FIRED, Ordering::AcqRel) & ERROR_FIRED == 0
    }

    fn begin_closing(&self) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                (state < ReadyState::Closing as u8).then_some(ReadyState::Closing as u8)
            });
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id())
            .field("namespace", &self.namespace)
            .field("state", &self.ready_state())
            .finish_non_exhaustive()
    }
}
