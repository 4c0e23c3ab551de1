//! Peer Listing and Server Publish Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{body_string, next_text, TestApp, TestRouter};

#[tokio::test]
async fn test_peers_empty() {
    let app = TestRouter::new();

    let response = app.get("/peers").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"peers":[]}"#);
}

#[tokio::test]
async fn test_publish_without_peers() {
    let app = TestRouter::new();

    let response = app.get("/publish?topic=chat&message=hello").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "published");
}

#[tokio::test]
async fn test_peers_lists_namespace_and_id() {
    let app = TestApp::spawn().await;
    let (_alice, alice_id) = app.connect_welcomed().await;
    let (_bob, bob_id) = app.connect_welcomed().await;
    app.wait_for_peers(2).await;

    let (status, body) = app.http_get("/peers").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let mut peers: Vec<String> = serde_json::from_value(json["peers"].clone()).unwrap();
    peers.sort();

    let mut expected = vec![format!("/_ws:{}", alice_id), format!("/_ws:{}", bob_id)];
    expected.sort();
    assert_eq!(status, 200);
    assert_eq!(peers, expected);
}

#[tokio::test]
async fn test_server_publish_reaches_every_subscriber_once() {
    let app = TestApp::spawn().await;
    let (mut alice, _) = app.connect_welcomed().await;
    let (mut bob, _) = app.connect_welcomed().await;
    // Alice sees Bob's join announcement
    assert!(next_text(&mut alice).await.ends_with("joined!"));
    app.wait_for_peers(2).await;

    let (status, body) = app.http_get("/publish?topic=chat&message=broadcast").await;

    assert_eq!(status, 200);
    assert_eq!(body, "published");
    assert_eq!(next_text(&mut alice).await, "broadcast");
    assert_eq!(next_text(&mut bob).await, "broadcast");
    crate::common::assert_silent(&mut alice).await;
    crate::common::assert_silent(&mut bob).await;
}

#[tokio::test]
async fn test_publish_to_unknown_topic_is_silent() {
    let app = TestApp::spawn().await;
    let (mut alice, _) = app.connect_welcomed().await;
    app.wait_for_peers(1).await;

    let (status, _) = app.http_get("/publish?topic=nobody&message=x").await;

    assert_eq!(status, 200);
    crate::common::assert_silent(&mut alice).await;
}
