//! Health Check Handlers
//!
//! # Endpoints
//! - `GET /health` - Health summary with live peer count
//! - `GET /health/live` - Liveness probe (is the server running?)

use std::time::Instant;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::infrastructure::transport::MulticastMode;
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Health summary
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub websocket: WebSocketHealth,
}

/// WebSocket endpoint state
#[derive(Debug, Serialize)]
pub struct WebSocketHealth {
    pub path: String,
    pub active_peers: usize,
    pub namespaces: usize,
    pub multicast: &'static str,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let peers = state.adapter.peers();
    let multicast = match state.adapter.multicast_mode() {
        MulticastMode::Manual => "manual",
        MulticastMode::Native => "native",
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        websocket: WebSocketHealth {
            path: state.settings.websocket.path.clone(),
            active_peers: peers.len(),
            namespaces: peers.namespaces().len(),
            multicast,
        },
    })
}

/// Liveness probe - checks if the server is running
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}
