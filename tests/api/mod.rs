//! API Tests

mod health_tests;
mod hooks_tests;
mod peers_tests;
mod websocket_tests;
