//! WebSocket Session Tests
//!
//! Drive the demo hooks through real client connections.

use futures::{SinkExt, StreamExt};
use peerbus::infrastructure::transport::MulticastMode;
use pretty_assertions::assert_eq;
use test_case::test_case;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::common::{assert_silent, next_message, next_text, send_text, TestApp};

#[tokio::test]
async fn test_welcome_on_open() {
    let app = TestApp::spawn().await;
    let mut client = app.connect().await;

    let welcome = next_text(&mut client).await;

    assert!(welcome.starts_with("Welcome to the server "));
    assert!(welcome.ends_with("(namespace: /_ws)"));
}

#[tokio::test]
async fn test_ping_pong() {
    let app = TestApp::spawn().await;
    let (mut client, _) = app.connect_welcomed().await;

    send_text(&mut client, "ping").await;

    assert_eq!(next_text(&mut client).await, "pong");
}

#[tokio::test]
async fn test_binary_reply() {
    let app = TestApp::spawn().await;
    let (mut client, _) = app.connect_welcomed().await;

    send_text(&mut client, "binary").await;

    match next_message(&mut client).await {
        Message::Binary(data) => assert_eq!(&data[..], b"binary message works!"),
        other => panic!("expected binary frame, got {:?}", other),
    }
}

#[tokio::test]
async fn test_peers_command_lists_own_id() {
    let app = TestApp::spawn().await;
    let (mut client, id) = app.connect_welcomed().await;

    send_text(&mut client, "peers").await;

    let json: serde_json::Value = serde_json::from_str(&next_text(&mut client).await).unwrap();
    assert_eq!(json["peers"], serde_json::json!([id]));
}

#[tokio::test]
async fn test_debug_exposes_context() {
    let app = TestApp::spawn().await;
    let (mut client, id) = app.connect_welcomed().await;

    send_text(&mut client, "debug").await;

    let json: serde_json::Value = serde_json::from_str(&next_text(&mut client).await).unwrap();
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["context"]["test"], "1");
    assert_eq!(json["readyState"], "open");
    assert_eq!(json["remoteAddress"], "127.0.0.1");
}

#[test_case(MulticastMode::Manual ; "manual")]
#[test_case(MulticastMode::Native ; "native")]
#[tokio::test]
async fn test_chat_relay(mode: MulticastMode) {
    let app = TestApp::spawn_with(mode).await;
    let (mut alice, _) = app.connect_welcomed().await;
    let (mut bob, bob_id) = app.connect_welcomed().await;
    assert_eq!(next_text(&mut alice).await, format!("{} joined!", bob_id));

    send_text(&mut bob, "hello").await;

    // Sender gets the echo, the other subscriber gets the relay
    assert_eq!(next_text(&mut bob).await, "hello");
    assert_eq!(next_text(&mut alice).await, "hello");
    assert_silent(&mut bob).await;
}

#[test_case(MulticastMode::Manual ; "manual")]
#[test_case(MulticastMode::Native ; "native")]
#[tokio::test]
async fn test_closed_peer_leaves_registry_and_topics(mode: MulticastMode) {
    let app = TestApp::spawn_with(mode).await;
    let (mut alice, _) = app.connect_welcomed().await;
    let (mut bob, bob_id) = app.connect_welcomed().await;
    assert_eq!(next_text(&mut alice).await, format!("{} joined!", bob_id));
    app.wait_for_peers(2).await;

    bob.close(None).await.unwrap();
    app.wait_for_peers(1).await;

    send_text(&mut alice, "anyone?").await;
    assert_eq!(next_text(&mut alice).await, "anyone?");
    assert_silent(&mut alice).await;
    assert!(!app
        .adapter
        .peers()
        .snapshot()
        .iter()
        .any(|(_, peers)| peers.iter().any(|p| p.id() == bob_id)));
}

#[tokio::test]
async fn test_unauthorized_upgrade_is_rejected() {
    let app = TestApp::spawn().await;

    let err = app
        .connect_request("?unauthorized", &[])
        .await
        .expect_err("upgrade should fail");

    match err {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), 401);
            assert_eq!(response.headers()["x-error"], "unauthorized");
        }
        other => panic!("expected HTTP rejection, got {:?}", other),
    }
    assert_eq!(app.adapter.peers().len(), 0);
}

#[tokio::test]
async fn test_upgrade_headers_are_applied() {
    let app = TestApp::spawn().await;

    let (_client, response) = app.connect_request("", &[]).await.unwrap();

    assert_eq!(response.headers()["x-powered-by"], "peerbus");
    assert!(response.headers().get("sec-websocket-protocol").is_none());
}

#[tokio::test]
async fn test_subprotocol_negotiation() {
    let app = TestApp::spawn().await;

    let (_client, response) = app
        .connect_request("", &[("sec-websocket-protocol", "supported")])
        .await
        .unwrap();

    assert_eq!(response.headers()["sec-websocket-protocol"], "supported");
}

#[tokio::test]
async fn test_server_close_all_closes_clients() {
    let app = TestApp::spawn().await;
    let (mut client, _) = app.connect_welcomed().await;
    app.wait_for_peers(1).await;

    app.adapter.close_all(Some(1001), Some("bye"));

    let frame = tokio::time::timeout(crate::common::RECV_TIMEOUT, client.next())
        .await
        .expect("timed out waiting for close");
    match frame {
        Some(Ok(Message::Close(Some(close)))) => {
            assert_eq!(u16::from(close.code), 1001);
            assert_eq!(close.reason.as_str(), "bye");
        }
        other => panic!("expected close frame, got {:?}", other),
    }
    let _ = client.send(Message::Close(None)).await;
    app.wait_for_peers(0).await;
}
