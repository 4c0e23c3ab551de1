//! Demo hooks served by the bundled binary.
//!
//! A small chat: every peer joins the `chat` topic on open, plain text is
//! echoed back and relayed to the other members, and a few keywords answer
//! with diagnostics.

use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;
use serde_json::json;

use crate::application::HookSet;
use crate::domain::{
    CloseDetails, Message, Payload, Peer, SendOptions, UpgradeOutcome, UpgradeRequest,
    UpgradeResponse,
};
use crate::shared::{AdapterError, Result, WsError};

/// Topic every demo peer joins
pub const CHAT_TOPIC: &str = "chat";

/// Hook set for the demo server
pub fn hooks() -> HookSet {
    HookSet::new()
        .on_upgrade(|request: UpgradeRequest| async move { upgrade(&request) })
        .on_open(|peer: Arc<Peer>| async move { open(&peer) })
        .on_message(|peer: Arc<Peer>, message: Message| async move { message_received(&peer, &message) })
        .on_close(|peer: Arc<Peer>, details: CloseDetails| async move {
            tracing::info!(peer_id = %peer, code = ?details.code, reason = ?details.reason, "Peer left");
            Ok(())
        })
        .on_error(|peer: Arc<Peer>, error: WsError| async move {
            tracing::warn!(peer_id = %peer, error = %error, "Peer error");
            Ok(())
        })
}

fn upgrade(request: &UpgradeRequest) -> Result<Option<UpgradeOutcome>> {
    if request.url().ends_with("?unauthorized") {
        return Err(AdapterError::reject(
            UpgradeResponse::new(StatusCode::UNAUTHORIZED)
                .header("x-error", "unauthorized")
                .body("unauthorized"),
        ));
    }

    request.context().insert("test", "1");

    let mut headers = vec![
        ("x-powered-by", "peerbus"),
        ("set-cookie", "peerbus=1; SameSite=None; Secure"),
    ];
    if request.header("sec-websocket-protocol") == Some("supported") {
        headers.push(("sec-websocket-protocol", "supported"));
    }
    Ok(Some(UpgradeOutcome::headers(headers)))
}

fn open(peer: &Peer) -> Result<()> {
    let options = SendOptions::default();
    peer.send(
        format!("Welcome to the server {}! (namespace: {})", peer, peer.namespace()),
        options,
    )?;
    peer.subscribe(CHAT_TOPIC);
    peer.publish(CHAT_TOPIC, format!("{} joined!", peer), options)?;
    Ok(())
}

fn message_received(peer: &Peer, message: &Message) -> Result<()> {
    let options = SendOptions::default();
    match message.text() {
        "ping" => {
            peer.send("pong", options)?;
        }
        "binary" => {
            peer.send(Bytes::from_static(b"binary message works!"), options)?;
        }
        "debug" => {
            let request = peer.request();
            let headers: serde_json::Map<String, serde_json::Value> = request
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.to_string(), json!(value)))
                })
                .collect();
            let debug = Payload::json(&json!({
                "id": peer.id(),
                "remoteAddress": peer.remote_address(),
                "context": peer.context().snapshot(),
                "request": {
                    "url": request.url(),
                    "headers": headers,
                },
                "readyState": peer.ready_state(),
                "topics": peer.topics(),
            }))?;
            peer.send(debug, options)?;
        }
        "peers" => {
            let ids: Vec<String> = peer.peers().iter().map(|p| p.id().to_string()).collect();
            peer.send(Payload::json(&json!({ "peers": ids }))?, options)?;
        }
        text => {
            peer.send(text.to_string(), options)?;
            peer.publish(CHAT_TOPIC, text.to_string(), options)?;
        }
    }
    Ok(())
}
