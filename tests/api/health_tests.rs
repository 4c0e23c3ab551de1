//! Health Check and Metrics Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{body_string, TestRouter};

/// Test basic health check endpoint returns 200 OK
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestRouter::new();

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
}

/// Test health check reports the WebSocket endpoint
#[tokio::test]
async fn test_health_check_returns_json() {
    let app = TestRouter::new();

    let response = app.get("/health").await;
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();

    assert_eq!(json["status"], "healthy");
    assert_eq!(json["websocket"]["path"], "/_ws");
    assert_eq!(json["websocket"]["active_peers"], 0);
    assert_eq!(json["websocket"]["multicast"], "manual");
}

/// Test liveness probe endpoint
#[tokio::test]
async fn test_liveness_probe() {
    let app = TestRouter::new();

    let response = app.get("/health/live").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"status":"alive"}"#);
}

/// Test metrics endpoint exposes Prometheus text
#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestRouter::new();
    app.adapter
        .publish("metrics-probe", "x", peerbus::SendOptions::default());

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = body_string(response).await;
    assert!(body.contains("peerbus_publish_recipients"));
}

/// Test unknown routes return 404
#[tokio::test]
async fn test_unknown_route_returns_not_found() {
    let app = TestRouter::new();

    let response = app.get("/nonexistent").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
