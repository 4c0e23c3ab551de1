//! Prometheus Metrics Module
//!
//! Provides adapter-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Live peers per namespace
//! - Messages by direction (inbound, outbound) and publish fan-out size
//! - Upgrade outcomes (accepted, rejected, failed)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Live peers gauge, labelled by namespace
pub static PEERS_ACTIVE: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("peers_active", "Number of registered peers").namespace("peerbus"),
        &["namespace"],
    )
    .expect("Failed to create PEERS_ACTIVE metric")
});

/// Message counter by direction
pub static MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_total", "Total number of WebSocket messages").namespace("peerbus"),
        &["direction"],
    )
    .expect("Failed to create MESSAGES_TOTAL metric")
});

/// Recipients reached per server-side publish
pub static PUBLISH_RECIPIENTS: Lazy<Histogram> = Lazy::new(|| {
    let buckets = vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0];
    Histogram::with_opts(
        HistogramOpts::new("publish_recipients", "Peers reached per publish")
            .namespace("peerbus")
            .buckets(buckets),
    )
    .expect("Failed to create PUBLISH_RECIPIENTS metric")
});

/// Upgrade attempts by outcome
pub static UPGRADES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("upgrades_total", "Total number of upgrade attempts").namespace("peerbus"),
        &["outcome"], // "accepted", "rejected", "failed"
    )
    .expect("Failed to create UPGRADES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(PEERS_ACTIVE.clone()))
        .expect("Failed to register PEERS_ACTIVE");
    registry
        .register(Box::new(MESSAGES_TOTAL.clone()))
        .expect("Failed to register MESSAGES_TOTAL");
    registry
        .register(Box::new(PUBLISH_RECIPIENTS.clone()))
        .expect("Failed to register PUBLISH_RECIPIENTS");
    registry
        .register(Box::new(UPGRADES_TOTAL.clone()))
        .expect("Failed to register UPGRADES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn peer_joined(namespace: &str) {
    PEERS_ACTIVE.with_label_values(&[namespace]).inc();
}

pub fn peer_left(namespace: &str) {
    PEERS_ACTIVE.with_label_values(&[namespace]).dec();
}

pub fn record_message(direction: &str) {
    MESSAGES_TOTAL.with_label_values(&[direction]).inc();
}

pub fn record_messages(direction: &str, count: usize) {
    MESSAGES_TOTAL
        .with_label_values(&[direction])
        .inc_by(count as u64);
}

pub fn record_publish(recipients: usize) {
    PUBLISH_RECIPIENTS.observe(recipients as f64);
}

pub fn record_upgrade(outcome: &str) {
    UPGRADES_TOTAL.with_label_values(&[outcome]).inc();
}
