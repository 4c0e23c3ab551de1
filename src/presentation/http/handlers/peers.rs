//! Peer Handlers
//!
//! Inspection of live peers and server-side topic publish.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::SendOptions;
use crate::startup::AppState;

/// Live peers as `namespace:id`
#[derive(Debug, Serialize)]
pub struct PeersResponse {
    pub peers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublishParams {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub message: String,
}

/// `GET /peers`
pub async fn list_peers(State(state): State<AppState>) -> Json<PeersResponse> {
    let peers = state
        .adapter
        .peers()
        .snapshot()
        .into_iter()
        .flat_map(|(namespace, peers)| {
            peers
                .into_iter()
                .map(move |peer| format!("{}:{}", namespace, peer.id()))
        })
        .collect();

    Json(PeersResponse { peers })
}

/// `GET /publish?topic=..&message=..`
pub async fn publish(
    State(state): State<AppState>,
    Query(params): Query<PublishParams>,
) -> &'static str {
    let delivered = state
        .adapter
        .publish(&params.topic, params.message, SendOptions::default());
    tracing::debug!(topic = %params.topic, recipients = delivered, "Server publish");
    "published"
}
