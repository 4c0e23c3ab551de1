//! Hook Dispatcher
//!
//! Runs the global hook and, when a resolver is configured, the per-request
//! hook for every lifecycle event. Both branches run concurrently and are
//! always awaited; the per-request result wins when it produced a value.

use std::sync::Arc;

use axum::http::HeaderMap;
use futures::future;

use super::hooks::{Hook, HookEvent, HookSet, Resolver};
use crate::domain::{
    CloseDetails, Message, Peer, PeerContext, UpgradeOutcome, UpgradeRequest, UpgradeResponse,
};
use crate::shared::{AdapterError, Result, WsError};

/// Event plus its arguments, for callers that dispatch by name
#[derive(Debug, Clone)]
pub enum HookCall {
    Upgrade(UpgradeRequest),
    Open(Arc<Peer>),
    Message(Arc<Peer>, Message),
    Close(Arc<Peer>, CloseDetails),
    Error(Arc<Peer>, WsError),
}

impl HookCall {
    pub fn event(&self) -> HookEvent {
        match self {
            HookCall::Upgrade(_) => HookEvent::Upgrade,
            HookCall::Open(_) => HookEvent::Open,
            HookCall::Message(..) => HookEvent::Message,
            HookCall::Close(..) => HookEvent::Close,
            HookCall::Error(..) => HookEvent::Error,
        }
    }
}

/// Interpreted result of the `upgrade` hooks
#[derive(Debug, Clone)]
pub struct UpgradeResult {
    /// Context attached to the request, shared with the future peer
    pub context: PeerContext,
    /// Namespace the connection will join
    pub namespace: String,
    /// Extra handshake response headers
    pub upgrade_headers: Option<HeaderMap>,
    /// When set, answer with this response and do not open a connection
    pub end_response: Option<UpgradeResponse>,
}

/// Invokes global and per-request hooks with one merge rule
pub struct HookDispatcher {
    global: HookSet,
    resolve: Option<Resolver>,
}

impl HookDispatcher {
    pub fn new(global: HookSet, resolve: Option<Resolver>) -> Self {
        Self { global, resolve }
    }

    pub fn global(&self) -> &HookSet {
        &self.global
    }

    pub fn has_resolver(&self) -> bool {
        self.resolve.is_some()
    }

    /// Dispatch any event by name; only `upgrade` yields a value
    pub async fn dispatch(&self, call: HookCall) -> Result<Option<UpgradeOutcome>> {
        match call {
            HookCall::Upgrade(request) => {
                self.invoke(HookEvent::Upgrade, HookSet::upgrade_hook, &request, request.clone())
                    .await
            }
            HookCall::Open(peer) => {
                let request = peer.request().clone();
                self.invoke(HookEvent::Open, HookSet::open_hook, &request, peer)
                    .await
                    .map(|_| None)
            }
            HookCall::Message(peer, message) => {
                let request = peer.request().clone();
                self.invoke(HookEvent::Message, HookSet::message_hook, &request, (peer, message))
                    .await
                    .map(|_| None)
            }
            HookCall::Close(peer, details) => {
                let request = peer.request().clone();
                self.invoke(HookEvent::Close, HookSet::close_hook, &request, (peer, details))
                    .await
                    .map(|_| None)
            }
            HookCall::Error(peer, error) => {
                let request = peer.request().clone();
                self.invoke(HookEvent::Error, HookSet::error_hook, &request, (peer, error))
                    .await
                    .map(|_| None)
            }
        }
    }

    /// Run the `upgrade` hooks and decide how the handshake proceeds.
    ///
    /// A rejection raised as `AdapterError::UpgradeRejected` is turned into
    /// `end_response`; any other hook error is returned to the caller.
    pub async fn upgrade(&self, request: &UpgradeRequest) -> Result<UpgradeResult> {
        let mut result = UpgradeResult {
            context: request.context().clone(),
            namespace: request.path().to_string(),
            upgrade_headers: None,
            end_response: None,
        };

        match self.dispatch(HookCall::Upgrade(request.clone())).await {
            Ok(None) => {}
            Ok(Some(UpgradeOutcome::Headers(headers))) => {
                result.upgrade_headers = Some(headers);
            }
            Ok(Some(UpgradeOutcome::Response(response))) if !response.is_ok() => {
                result.end_response = Some(response);
            }
            Ok(Some(UpgradeOutcome::Response(response))) => {
                result.upgrade_headers = Some(response.headers);
            }
            Err(AdapterError::UpgradeRejected(response)) => {
                result.end_response = Some(response);
            }
            Err(e) => return Err(e),
        }

        Ok(result)
    }

    pub async fn open(&self, peer: &Arc<Peer>) -> Result<()> {
        self.dispatch(HookCall::Open(peer.clone())).await.map(|_| ())
    }

    pub async fn message(&self, peer: &Arc<Peer>, message: Message) -> Result<()> {
        self.dispatch(HookCall::Message(peer.clone(), message))
            .await
            .map(|_| ())
    }

    pub async fn close(&self, peer: &Arc<Peer>, details: CloseDetails) -> Result<()> {
        self.dispatch(HookCall::Close(peer.clone(), details))
            .await
            .map(|_| ())
    }

    pub async fn error(&self, peer: &Arc<Peer>, error: WsError) -> Result<()> {
        self.dispatch(HookCall::Error(peer.clone(), error))
            .await
            .map(|_| ())
    }

    async fn invoke<A, T>(
        &self,
        event: HookEvent,
        select: fn(&HookSet) -> Option<&Hook<A, T>>,
        request: &UpgradeRequest,
        args: A,
    ) -> Result<Option<T>>
    where
        A: Clone + Send + 'static,
        T: Send + 'static,
    {
        // The global hook starts before anything is resolved
        let global = select(&self.global).map(|hook| hook(args.clone()));
        let global = async move {
            match global {
                Some(fut) => fut.await,
                None => Ok(None),
            }
        };

        let Some(resolve) = &self.resolve else {
            return global.await;
        };

        let resolving = resolve(request.clone());
        let resolved = async move {
            let hooks = resolving.await?;
            match hooks.as_ref().and_then(select) {
                Some(hook) => hook(args).await,
                None => Ok(None),
            }
        };

        let (global_res, resolved_res) = future::join(global, resolved).await;
        if let Err(e) = &global_res {
            tracing::debug!(event = %event, error = %e, "Global hook failed");
        }
        if let Err(e) = &resolved_res {
            tracing::debug!(event = %event, error = %e, "Resolved hook failed");
        }

        let global_value = global_res?;
        Ok(resolved_res?.or(global_value))
    }
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("global", &self.global)
            .field("resolve", &self.resolve.is_some())
            .finish()
    }
}
