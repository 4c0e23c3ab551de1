//! HTTP Layer
//!
//! Routes and handlers served next to the WebSocket endpoint.

pub mod handlers;
pub mod routes;
