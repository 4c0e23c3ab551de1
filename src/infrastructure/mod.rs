//! Infrastructure Layer
//!
//! Socket backends and metrics.

pub mod metrics;
pub mod transport;
