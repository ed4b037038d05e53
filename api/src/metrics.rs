use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use once_cell::sync::Lazy;
use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder,
};

use crate::state::AppState;

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}
macro_rules! histogram_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| {
            HistogramVec::new(HistogramOpts::new($name, $help).buckets(LATENCY_BUCKETS.to_vec()), $labels)
                .unwrap()
        })
    };
}
macro_rules! counter {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntCounter::new($name, $help).unwrap())
    };
}

const LATENCY_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

// ── HTTP ────────────────────────────────────────────────────────────────────
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("http_requests_total", "Total HTTP requests", &["method", "path", "status"]);
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("http_request_duration_seconds", "HTTP request latency", &["method", "path"]);

// ── Validation ──────────────────────────────────────────────────────────────
pub static VALIDATION_REJECTIONS: Lazy<IntCounterVec> = counter_vec!(
    "validation_rejections_total",
    "Requests rejected by route validation",
    &["kind"]
);
pub static ENTITY_LOOKUPS: Lazy<IntCounterVec> = counter_vec!(
    "entity_lookups_total",
    "Entity existence lookups",
    &["entity", "result"]
);

// ── Database ────────────────────────────────────────────────────────────────
pub static DB_QUERY_DURATION: Lazy<HistogramVec> =
    histogram_vec!("db_query_duration_seconds", "DB query latency", &["query"]);
pub static DB_QUERY_ERRORS: Lazy<IntCounter> = counter!("db_query_errors_total", "Failed DB queries");

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    r.register(Box::new(VALIDATION_REJECTIONS.clone()))?;
    r.register(Box::new(ENTITY_LOOKUPS.clone()))?;
    r.register(Box::new(DB_QUERY_DURATION.clone()))?;
    r.register(Box::new(DB_QUERY_ERRORS.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

/// `GET /metrics` in the Prometheus text format
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
        gather_metrics(&state.registry),
    )
}

pub fn observe_http(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn observe_rejection(kind: &str) {
    VALIDATION_REJECTIONS.with_label_values(&[kind]).inc();
}

pub fn observe_lookup(entity: &str, result: &str) {
    ENTITY_LOOKUPS.with_label_values(&[entity, result]).inc();
}

pub fn observe_db_query(query: &str, duration_secs: f64, ok: bool) {
    DB_QUERY_DURATION
        .with_label_values(&[query])
        .observe(duration_secs);
    if !ok {
        DB_QUERY_ERRORS.inc();
    }
}
