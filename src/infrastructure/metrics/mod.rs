//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Live gateway sessions
//! - Join attempts by outcome
//! - Ingested messages by type
//! - Broadcast deliveries by event
//! - Sessions evicted by cause
//! - Relayed peer signals
//! - HTTP request counts and latency

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "groupchat";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Live gateway sessions
pub static GATEWAY_SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("gateway_sessions_active", "Number of live gateway sessions")
            .namespace(NAMESPACE),
    )
    .expect("Failed to create GATEWAY_SESSIONS_ACTIVE metric")
});

/// Join attempts, by outcome ("joined", "banned")
pub static CHANNEL_JOINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("channel_joins_total", "Channel join attempts").namespace(NAMESPACE),
        &["outcome"],
    )
    .expect("Failed to create CHANNEL_JOINS_TOTAL metric")
});

/// Messages persisted and broadcast, by message type
pub static MESSAGES_INGESTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_ingested_total", "Messages persisted and broadcast")
            .namespace(NAMESPACE),
        &["message_type"],
    )
    .expect("Failed to create MESSAGES_INGESTED_TOTAL metric")
});

/// Events enqueued to session outbound queues, by event name
pub static EVENT_DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("event_deliveries_total", "Events enqueued to sessions").namespace(NAMESPACE),
        &["event"],
    )
    .expect("Failed to create EVENT_DELIVERIES_TOTAL metric")
});

/// Sessions torn down by the server, by cause ("slow_consumer", "closed")
pub static SESSION_EVICTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("session_evictions_total", "Sessions evicted by the server")
            .namespace(NAMESPACE),
        &["cause"],
    )
    .expect("Failed to create SESSION_EVICTIONS_TOTAL metric")
});

/// Peer signals relayed to at least one recipient
pub static PEER_SIGNALS_RELAYED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("peer_signals_relayed_total", "Peer signals relayed").namespace(NAMESPACE),
    )
    .expect("Failed to create PEER_SIGNALS_RELAYED_TOTAL metric")
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(GATEWAY_SESSIONS_ACTIVE.clone()))
        .expect("Failed to register GATEWAY_SESSIONS_ACTIVE");
    registry
        .register(Box::new(CHANNEL_JOINS_TOTAL.clone()))
        .expect("Failed to register CHANNEL_JOINS_TOTAL");
    registry
        .register(Box::new(MESSAGES_INGESTED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_INGESTED_TOTAL");
    registry
        .register(Box::new(EVENT_DELIVERIES_TOTAL.clone()))
        .expect("Failed to register EVENT_DELIVERIES_TOTAL");
    registry
        .register(Box::new(SESSION_EVICTIONS_TOTAL.clone()))
        .expect("Failed to register SESSION_EVICTIONS_TOTAL");
    registry
        .register(Box::new(PEER_SIGNALS_RELAYED_TOTAL.clone()))
        .expect("Failed to register PEER_SIGNALS_RELAYED_TOTAL");
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn set_active_sessions(count: usize) {
    GATEWAY_SESSIONS_ACTIVE.set(count as i64);
}

pub fn record_join(outcome: &str) {
    CHANNEL_JOINS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_ingest(message_type: &str) {
    MESSAGES_INGESTED_TOTAL.with_label_values(&[message_type]).inc();
}

pub fn record_deliveries(event: &str, count: usize) {
    EVENT_DELIVERIES_TOTAL
        .with_label_values(&[event])
        .inc_by(count as u64);
}

pub fn record_eviction(cause: &str) {
    SESSION_EVICTIONS_TOTAL.with_label_values(&[cause]).inc();
}

/// Count a relay; signals that reached nobody are not counted.
pub fn record_relay(delivered: usize) {
    if delivered > 0 {
        PEER_SIGNALS_RELAYED_TOTAL.inc();
    }
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}
