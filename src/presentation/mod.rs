//! Presentation Layer
//!
//! HTTP routes and the axum WebSocket binding.

pub mod http;
pub mod middleware;
pub mod websocket;
