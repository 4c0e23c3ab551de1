//! Adapter
//!
//! Composition root handed to a runtime binding. It owns the hook dispatcher,
//! the peer registry and the socket backend, and keeps registry membership in
//! step with the lifecycle events the binding reports.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::dispatcher::{HookDispatcher, UpgradeResult};
use super::hooks::{HookSet, Resolver};
use crate::domain::{
    CloseDetails, Message, Payload, Peer, PeerRegistry, SendOptions, UpgradeRequest,
};
use crate::infrastructure::metrics;
use crate::infrastructure::transport::{Backend, MulticastMode, Outbound};
use crate::shared::{Result, WsError};

/// Picks the namespace a request joins
pub type NamespaceFn = Arc<dyn Fn(&UpgradeRequest) -> String + Send + Sync>;

/// Adapter construction options
#[derive(Default, Clone)]
pub struct AdapterOptions {
    pub hooks: HookSet,
    pub resolve: Option<Resolver>,
    pub namespace: Option<NamespaceFn>,
    pub multicast: MulticastMode,
}

impl AdapterOptions {
    pub fn new(hooks: HookSet) -> Self {
        Self {
            hooks,
            ..Self::default()
        }
    }

    pub fn resolve(mut self, resolve: Resolver) -> Self {
        self.resolve = Some(resolve);
        self
    }

    pub fn namespace<F>(mut self, namespace: F) -> Self
    where
        F: Fn(&UpgradeRequest) -> String + Send + Sync + 'static,
    {
        self.namespace = Some(Arc::new(namespace));
        self
    }

    pub fn multicast(mut self, mode: MulticastMode) -> Self {
        self.multicast = mode;
        self
    }
}

/// One adapter per server process
pub struct Adapter {
    dispatcher: HookDispatcher,
    registry: Arc<PeerRegistry>,
    backend: Backend,
    namespace: Option<NamespaceFn>,
}

impl Adapter {
    pub fn new(options: AdapterOptions) -> Self {
        Self {
            dispatcher: HookDispatcher::new(options.hooks, options.resolve),
            registry: Arc::new(PeerRegistry::new()),
            backend: Backend::new(options.multicast),
            namespace: options.namespace,
        }
    }

    /// Read-only view of the live peers
    pub fn peers(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &HookDispatcher {
        &self.dispatcher
    }

    pub fn multicast_mode(&self) -> MulticastMode {
        self.backend.mode()
    }

    /// Run the `upgrade` hooks for an inbound request.
    ///
    /// Callers must check `end_response` first and skip the handshake when it
    /// is set.
    pub async fn upgrade(&self, request: &UpgradeRequest) -> Result<UpgradeResult> {
        let mut result = match self.dispatcher.upgrade(request).await {
            Ok(result) => result,
            Err(e) => {
                metrics::record_upgrade("failed");
                tracing::warn!(path = %request.path(), error = %e, "Upgrade hook failed");
                return Err(e);
            }
        };

        if let Some(namespace) = &self.namespace {
            result.namespace = namespace(request);
        }

        if let Some(response) = &result.end_response {
            metrics::record_upgrade("rejected");
            tracing::debug!(
                path = %request.path(),
                status = %response.status,
                "Upgrade rejected"
            );
        } else {
            metrics::record_upgrade("accepted");
        }

        Ok(result)
    }

    /// Create the peer for an accepted upgrade. The peer joins the registry
    /// on [`Adapter::open`].
    pub fn connect(
        &self,
        request: UpgradeRequest,
        namespace: &str,
        remote_addr: Option<SocketAddr>,
    ) -> (Arc<Peer>, mpsc::UnboundedReceiver<Outbound>) {
        let (connection, rx) = self.backend.connect(namespace, remote_addr);
        let peers = self.registry.get_or_create_set(namespace);
        (Peer::new(request, connection, peers), rx)
    }

    /// Register the peer and fire `open`. Repeated calls are ignored.
    pub async fn open(&self, peer: &Arc<Peer>) -> Result<()> {
        if !peer.mark_open() {
            return Ok(());
        }

        self.registry.add(peer);
        metrics::peer_joined(peer.namespace());
        tracing::info!(
            peer_id = %peer.id(),
            namespace = %peer.namespace(),
            "Peer registered"
        );

        self.dispatcher.open(peer).await
    }

    /// Fire `message` for an open peer; frames for peers that are not open
    /// are dropped.
    pub async fn message(&self, peer: &Arc<Peer>, message: Message) -> Result<()> {
        if !peer.is_opened() || !self.registry.contains(peer) {
            tracing::debug!(peer_id = %peer.id(), "Dropped message for inactive peer");
            return Ok(());
        }

        metrics::record_message("inbound");
        self.dispatcher.message(peer, message).await
    }

    /// Unregister the peer and fire `close` at most once
    pub async fn close(&self, peer: &Arc<Peer>, details: CloseDetails) -> Result<()> {
        let was_open = self.release(peer);
        if !peer.mark_close_fired() || !was_open {
            return Ok(());
        }

        tracing::debug!(
            peer_id = %peer.id(),
            code = ?details.code,
            reason = ?details.reason,
            "Peer closed"
        );
        self.dispatcher.close(peer, details).await
    }

    /// Unregister the peer and fire `error` at most once
    pub async fn error(&self, peer: &Arc<Peer>, error: WsError) -> Result<()> {
        let was_open = self.release(peer);
        if !peer.mark_error_fired() || !was_open {
            return Ok(());
        }

        tracing::debug!(peer_id = %peer.id(), error = %error, "Peer transport error");
        self.dispatcher.error(peer, error).await
    }

    /// Server-side publish to every namespace.
    ///
    /// Each subscriber of `topic` receives `data` once. Returns the number of
    /// peers reached.
    pub fn publish(&self, topic: &str, data: impl Into<Payload>, options: SendOptions) -> usize {
        let payload = data.into();
        let mut delivered = 0;

        for set in self.registry.sets() {
            let Some(origin) = set.first() else {
                continue;
            };
            // The origin is excluded from its own publish
            if origin.is_subscribed(topic) && origin.send(payload.clone(), options).is_ok() {
                delivered += 1;
            }
            match origin.publish(topic, payload.clone(), options) {
                Ok(count) => delivered += count,
                Err(e) => {
                    tracing::debug!(
                        namespace = %set.namespace(),
                        topic = topic,
                        error = %e,
                        "Publish failed"
                    );
                }
            }
        }

        metrics::record_publish(delivered);
        delivered
    }

    /// Gracefully close every live peer
    pub fn close_all(&self, code: Option<u16>, reason: Option<&str>) {
        for set in self.registry.sets() {
            for peer in set.snapshot() {
                peer.close(code, reason.map(str::to_string));
            }
        }
    }

    /// Remove from the registry and native topics; returns whether the peer
    /// had been opened
    fn release(&self, peer: &Arc<Peer>) -> bool {
        if self.registry.remove(peer) {
            metrics::peer_left(peer.namespace());
            tracing::info!(
                peer_id = %peer.id(),
                namespace = %peer.namespace(),
                "Peer unregistered"
            );
        }
        peer.detach();
        peer.is_opened()
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("dispatcher", &self.dispatcher)
            .field("peers", &self.registry.len())
            .field("backend", &self.backend.mode())
            .finish()
    }
}
