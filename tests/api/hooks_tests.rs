//! Hook Resolution Tests
//!
//! Per-request hook sets and namespace selection against a live server.

use std::sync::Arc;

use peerbus::application::{resolver, AdapterOptions, HookSet};
use peerbus::domain::{Message, Peer, SendOptions, UpgradeOutcome, UpgradeRequest};
use peerbus::infrastructure::transport::MulticastMode;
use peerbus::presentation::websocket::demo;
use pretty_assertions::assert_eq;

use crate::common::{assert_silent, next_text, send_text, test_settings, TestApp};

fn vip_hooks() -> HookSet {
    HookSet::new()
        .on_upgrade(|_request: UpgradeRequest| async move {
            Ok(Some(UpgradeOutcome::headers([("x-room", "vip")])))
        })
        .on_message(|peer: Arc<Peer>, message: Message| async move {
            peer.send(format!("vip:{}", message.text()), SendOptions::default())?;
            Ok(())
        })
}

async fn spawn_with_resolver() -> TestApp {
    let options = AdapterOptions::new(demo::hooks()).resolve(resolver(
        |request: UpgradeRequest| async move {
            Ok((request.query() == Some("vip")).then(vip_hooks))
        },
    ));
    TestApp::spawn_with_options(test_settings(MulticastMode::Manual), options).await
}

#[tokio::test]
async fn test_resolved_upgrade_headers_replace_global() {
    let app = spawn_with_resolver().await;

    let (_client, response) = app.connect_request("?vip", &[]).await.unwrap();

    assert_eq!(response.headers()["x-room"], "vip");
    assert!(response.headers().get("x-powered-by").is_none());
}

#[tokio::test]
async fn test_unresolved_request_uses_global_hooks() {
    let app = spawn_with_resolver().await;

    let (_client, response) = tokio_test::assert_ok!(app.connect_request("", &[]).await);

    assert_eq!(response.headers()["x-powered-by"], "peerbus");
    assert!(response.headers().get("x-room").is_none());
}

#[tokio::test]
async fn test_global_and_resolved_message_hooks_both_run() {
    let app = spawn_with_resolver().await;
    let (mut client, _) = app.connect_request("?vip", &[]).await.unwrap();
    // Global open hook still greets
    assert!(next_text(&mut client).await.starts_with("Welcome"));

    send_text(&mut client, "hello").await;

    let mut frames = vec![next_text(&mut client).await, next_text(&mut client).await];
    frames.sort();
    assert_eq!(frames, vec!["hello".to_string(), "vip:hello".to_string()]);
}

#[tokio::test]
async fn test_namespace_override_isolates_rooms() {
    let options = AdapterOptions::new(demo::hooks()).namespace(|request: &UpgradeRequest| {
        format!("room-{}", request.query().unwrap_or("lobby"))
    });
    let app = TestApp::spawn_with_options(test_settings(MulticastMode::Manual), options).await;

    let (mut red, _) = app.connect_request("?red", &[]).await.unwrap();
    let (mut blue, _) = app.connect_request("?blue", &[]).await.unwrap();
    assert!(next_text(&mut red).await.ends_with("(namespace: room-red)"));
    assert!(next_text(&mut blue).await.ends_with("(namespace: room-blue)"));
    app.wait_for_peers(2).await;

    send_text(&mut red, "only red").await;

    assert_eq!(next_text(&mut red).await, "only red");
    assert_silent(&mut blue).await;

    let mut namespaces = app.adapter.peers().namespaces();
    namespaces.sort();
    assert_eq!(namespaces, vec!["room-blue".to_string(), "room-red".to_string()]);
}
