//! WebSocket Connection Handler
//!
//! Runs the upgrade hooks for each handshake and then pumps one socket: a
//! writer task drains the peer's outbound queue while the reader reports
//! frames, close and errors to the adapter.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message as WsMessage, WebSocket},
        ConnectInfo, Request, State, WebSocketUpgrade,
    },
    http::uri::Scheme,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::Notify;

use crate::application::Adapter;
use crate::domain::{CloseDetails, Message, Payload, UpgradeRequest};
use crate::infrastructure::transport::Outbound;
use crate::shared::WsError;
use crate::startup::AppState;

/// Close code reported when the socket ends without a close frame
const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code sent when the `open` hook fails
const INTERNAL_ERROR: u16 = 1011;

/// WebSocket upgrade handler
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    request: Request,
) -> Response {
    let (parts, _body) = request.into_parts();
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let secure = parts.uri.scheme() == Some(&Scheme::HTTPS)
        || parts
            .headers
            .get("x-forwarded-proto")
            .is_some_and(|proto| proto.as_bytes().eq_ignore_ascii_case(b"https"));

    let mut builder = UpgradeRequest::builder(parts.method, parts.uri, parts.headers).secure(secure);
    if let Some(addr) = remote_addr {
        builder = builder.remote_addr(addr);
    }
    let upgrade_request = builder.build();

    let adapter = state.adapter.clone();
    let result = match adapter.upgrade(&upgrade_request).await {
        Ok(result) => result,
        Err(e) => return e.into_response(),
    };

    if let Some(response) = result.end_response {
        return response.into_response();
    }

    let limits = &state.settings.websocket;
    let namespace = result.namespace;
    let mut response = ws
        .max_message_size(limits.max_message_size)
        .max_frame_size(limits.max_frame_size)
        .on_failed_upgrade(|e| tracing::debug!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| {
            handle_socket(socket, adapter, upgrade_request, namespace, remote_addr)
        });

    if let Some(headers) = result.upgrade_headers {
        for (name, value) in headers.iter() {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    response
}

/// Handle individual WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    adapter: Arc<Adapter>,
    request: UpgradeRequest,
    namespace: String,
    remote_addr: Option<SocketAddr>,
) {
    let (peer, mut outbound) = adapter.connect(request, &namespace, remote_addr);
    let (mut sender, mut receiver) = socket.split();
    let terminated = Arc::new(Notify::new());

    tracing::debug!(peer_id = %peer.id(), namespace = %namespace, "New WebSocket connection");

    // Forward queued frames to the socket
    let writer_peer_id = peer.id().to_string();
    let terminate = terminated.clone();
    let writer = tokio::spawn(async move {
        while let Some(out) = outbound.recv().await {
            let frame = match out {
                Outbound::Frame { payload, .. } => match payload {
                    Payload::Text(text) => WsMessage::Text(text.into()),
                    Payload::Binary(bytes) => WsMessage::Binary(bytes),
                },
                Outbound::Close { code, reason } => {
                    let frame = code.map(|code| CloseFrame {
                        code,
                        reason: reason.unwrap_or_default().into(),
                    });
                    let _ = sender.send(WsMessage::Close(frame)).await;
                    break;
                }
                Outbound::Terminate => {
                    terminate.notify_one();
                    break;
                }
            };
            if let Err(e) = sender.send(frame).await {
                tracing::debug!(peer_id = %writer_peer_id, error = %e, "Failed to write frame");
                break;
            }
        }
    });

    if let Err(e) = adapter.open(&peer).await {
        tracing::warn!(peer_id = %peer.id(), error = %e, "Open hook failed, closing");
        peer.close(Some(INTERNAL_ERROR), Some("internal error".into()));
    }

    // Main message loop
    let details = loop {
        tokio::select! {
            msg = receiver.next() => {
                let payload = match msg {
                    Some(Ok(WsMessage::Text(text))) => Payload::Text(text.as_str().to_owned()),
                    Some(Ok(WsMessage::Binary(bytes))) => Payload::Binary(bytes),
                    Some(Ok(WsMessage::Close(frame))) => {
                        break frame
                            .map(|frame| CloseDetails {
                                code: Some(frame.code),
                                reason: Some(frame.reason.as_str().to_owned()),
                            })
                            .unwrap_or_default();
                    }
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(peer_id = %peer.id(), error = %e, "WebSocket error");
                        if let Err(e) = adapter.error(&peer, WsError::new(e)).await {
                            tracing::warn!(peer_id = %peer.id(), error = %e, "Error hook failed");
                        }
                        break abnormal_closure();
                    }
                    None => break abnormal_closure(),
                };

                let message = Message::new(payload, peer.clone());
                if let Err(e) = adapter.message(&peer, message).await {
                    tracing::warn!(peer_id = %peer.id(), error = %e, "Message hook failed");
                }
            }
            _ = terminated.notified() => {
                tracing::debug!(peer_id = %peer.id(), "Connection terminated");
                break abnormal_closure();
            }
        }
    };

    if let Err(e) = adapter.close(&peer, details).await {
        tracing::warn!(peer_id = %peer.id(), error = %e, "Close hook failed");
    }
    writer.abort();

    tracing::debug!(peer_id = %peer.id(), "WebSocket connection finished");
}

fn abnormal_closure() -> CloseDetails {
    CloseDetails {
        code: Some(ABNORMAL_CLOSURE),
        reason: None,
    }
}
