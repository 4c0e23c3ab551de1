//! Inbound and outbound frame data.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use super::peer::Peer;
use crate::shared::SendError;

/// Frame data, textual or binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    /// Encode any serializable value as a JSON text frame
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, SendError> {
        serde_json::to_string(value)
            .map(Payload::Text)
            .map_err(|e| SendError::Encode(e.to_string()))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Binary(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Payload::Binary(data)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(data))
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Payload::Binary(Bytes::copy_from_slice(data))
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Text(value.to_string())
    }
}

struct MessageInner {
    raw: Payload,
    peer: Arc<Peer>,
    event: Option<Box<dyn Any + Send + Sync>>,
    text: OnceLock<String>,
    id: OnceLock<String>,
}

/// One inbound frame received from a peer.
///
/// Immutable; clones share the decoded text cache.
#[derive(Clone)]
pub struct Message {
    inner: Arc<MessageInner>,
}

impl Message {
    pub fn new(raw: impl Into<Payload>, peer: Arc<Peer>) -> Self {
        Self::build(raw.into(), peer, None)
    }

    /// Keep the raw backend event alongside the payload
    pub fn with_event<E: Any + Send + Sync>(raw: impl Into<Payload>, peer: Arc<Peer>, event: E) -> Self {
        Self::build(raw.into(), peer, Some(Box::new(event)))
    }

    fn build(raw: Payload, peer: Arc<Peer>, event: Option<Box<dyn Any + Send + Sync>>) -> Self {
        Self {
            inner: Arc::new(MessageInner {
                raw,
                peer,
                event,
                text: OnceLock::new(),
                id: OnceLock::new(),
            }),
        }
    }

    /// Stable id, generated on first access
    pub fn id(&self) -> &str {
        self.inner.id.get_or_init(|| Uuid::new_v4().to_string())
    }

    pub fn peer(&self) -> &Arc<Peer> {
        &self.inner.peer
    }

    /// The payload exactly as received
    pub fn raw_data(&self) -> &Payload {
        &self.inner.raw
    }

    pub fn is_binary(&self) -> bool {
        self.inner.raw.is_binary()
    }

    /// UTF-8 view of the payload, decoded at most once
    pub fn text(&self) -> &str {
        match &self.inner.raw {
            Payload::Text(text) => text,
            Payload::Binary(data) => self
                .inner
                .text
                .get_or_init(|| String::from_utf8_lossy(data).into_owned()),
        }
    }

    /// Byte view of the payload
    pub fn bytes(&self) -> Bytes {
        match &self.inner.raw {
            Payload::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
            Payload::Binary(data) => data.clone(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(self.text())
    }

    /// Backend event this message was built from, if kept and of type `E`
    pub fn event<E: Any>(&self) -> Option<&E> {
        self.inner.event.as_ref().and_then(|e| e.downcast_ref::<E>())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("peer", &self.inner.peer.id())
            .field("raw", &self.inner.raw)
            .finish_non_exhaustive()
    }
}
