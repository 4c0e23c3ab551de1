//! Hook Configuration
//!
//! A [`HookSet`] is an immutable record of up to five lifecycle callbacks.
//! One set is configured globally per adapter; a [`Resolver`] may produce
//! another set per request.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::domain::{CloseDetails, Message, Peer, UpgradeOutcome, UpgradeRequest};
use crate::shared::{Result, WsError};

/// Future returned by a stored hook
pub type HookFuture<T> = BoxFuture<'static, Result<Option<T>>>;

/// Stored hook taking `A` and producing an optional `T`
pub type Hook<A, T> = Arc<dyn Fn(A) -> HookFuture<T> + Send + Sync>;

/// Maps a request to its per-request hook set
pub type Resolver = Arc<dyn Fn(UpgradeRequest) -> BoxFuture<'static, Result<Option<HookSet>>> + Send + Sync>;

/// Lifecycle event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Upgrade,
    Open,
    Message,
    Close,
    Error,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::Upgrade => "upgrade",
            HookEvent::Open => "open",
            HookEvent::Message => "message",
            HookEvent::Close => "close",
            HookEvent::Error => "error",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Up to five lifecycle callbacks
#[derive(Clone, Default)]
pub struct HookSet {
    upgrade: Option<Hook<UpgradeRequest, UpgradeOutcome>>,
    open: Option<Hook<Arc<Peer>, ()>>,
    message: Option<Hook<(Arc<Peer>, Message), ()>>,
    close: Option<Hook<(Arc<Peer>, CloseDetails), ()>>,
    error: Option<Hook<(Arc<Peer>, WsError), ()>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called before the handshake. `Ok(None)` proceeds unchanged; an
    /// outcome adds headers or ends the upgrade with a response, and so does
    /// returning `Err(AdapterError::UpgradeRejected(..))`.
    pub fn on_upgrade<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(UpgradeRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<UpgradeOutcome>>> + Send + 'static,
    {
        self.upgrade = Some(Arc::new(move |request: UpgradeRequest| hook(request).boxed()));
        self
    }

    pub fn on_open<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<Peer>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.open = Some(Arc::new(move |peer: Arc<Peer>| hook(peer).map(|r| r.map(Some)).boxed()));
        self
    }

    pub fn on_message<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<Peer>, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.message = Some(Arc::new(move |(peer, message): (Arc<Peer>, Message)| {
            hook(peer, message).map(|r| r.map(Some)).boxed()
        }));
        self
    }

    pub fn on_close<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<Peer>, CloseDetails) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.close = Some(Arc::new(move |(peer, details): (Arc<Peer>, CloseDetails)| {
            hook(peer, details).map(|r| r.map(Some)).boxed()
        }));
        self
    }

    pub fn on_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<Peer>, WsError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.error = Some(Arc::new(move |(peer, error): (Arc<Peer>, WsError)| {
            hook(peer, error).map(|r| r.map(Some)).boxed()
        }));
        self
    }

    pub fn has(&self, event: HookEvent) -> bool {
        match event {
            HookEvent::Upgrade => self.upgrade.is_some(),
            HookEvent::Open => self.open.is_some(),
            HookEvent::Message => self.message.is_some(),
            HookEvent::Close => self.close.is_some(),
            HookEvent::Error => self.error.is_some(),
        }
    }

    pub(crate) fn upgrade_hook(&self) -> Option<&Hook<UpgradeRequest, UpgradeOutcome>> {
        self.upgrade.as_ref()
    }

    pub(crate) fn open_hook(&self) -> Option<&Hook<Arc<Peer>, ()>> {
        self.open.as_ref()
    }

    pub(crate) fn message_hook(&self) -> Option<&Hook<(Arc<Peer>, Message), ()>> {
        self.message.as_ref()
    }

    pub(crate) fn close_hook(&self) -> Option<&Hook<(Arc<Peer>, CloseDetails), ()>> {
        self.close.as_ref()
    }

    pub(crate) fn error_hook(&self) -> Option<&Hook<(Arc<Peer>, WsError), ()>> {
        self.error.as_ref()
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("upgrade", &self.upgrade.is_some())
            .field("open", &self.open.is_some())
            .field("message", &self.message.is_some())
            .field("close", &self.close.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Wrap an async function as a [`Resolver`]
pub fn resolver<F, Fut>(resolve: F) -> Resolver
where
    F: Fn(UpgradeRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<HookSet>>> + Send + 'static,
{
    Arc::new(move |request: UpgradeRequest| resolve(request).boxed())
}
