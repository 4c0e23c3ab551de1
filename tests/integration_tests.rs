//! Integration Tests
//!
//! - `api/` - HTTP routes, WebSocket sessions and hook resolution against a
//!   live server on an ephemeral port
//! - `common/` - `TestApp`, `TestRouter` and client helpers

mod api;
mod common;

pub use common::*;
