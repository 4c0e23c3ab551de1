//! WebSocket Binding
//!
//! Carries axum WebSocket connections into the adapter.

pub mod demo;
pub mod handler;
mod response;

pub use handler::ws_handler;
