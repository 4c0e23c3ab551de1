//! HTTP responses for ended upgrades and adapter failures.

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::UpgradeResponse;
use crate::shared::AdapterError;

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
}

impl IntoResponse for UpgradeResponse {
    fn into_response(self) -> Response {
        let body = self.body.map(Body::from).unwrap_or_else(Body::empty);
        (self.status, self.headers, body).into_response()
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        match self {
            AdapterError::UpgradeRejected(response) => response.into_response(),
            other => {
                tracing::error!(error = %other, "Upgrade failed");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ErrorResponse {
                    code: status.as_u16(),
                    message: "Internal server error".into(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
