//! Observability utilities for the events recommendation engine.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Custom metrics for ingestion, recommendations, and compensation
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, IngestionMetrics};
//!
//! // Initialize metrics recorder
//! init_metrics();
//!
//! // Record ingestion outcomes
//! IngestionMetrics::record_success(4, 182);
//! IngestionMetrics::record_failure("vector_upsert");
//!
//! // Add metrics endpoint to router
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod engine;
pub mod middleware;

pub use engine::{CompensationMetrics, IngestionMetrics, RecommendationMetrics, TagUpdateMetrics};
pub use middleware::metrics_middleware;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup.
/// Returns the PrometheusHandle for rendering metrics.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        info!("Prometheus metrics recorder initialized");

        // Register metric descriptions
        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!(
        "http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Ingestion metrics
    describe_counter!(
        "event_ingestion_total",
        "Event ingestion attempts by status"
    );
    describe_histogram!(
        "event_ingestion_duration_seconds",
        "End-to-end event ingestion duration in seconds"
    );
    describe_counter!(
        "event_ingestion_failed_operations_total",
        "Ingestion failures by the operation that failed"
    );
    describe_counter!(
        "interaction_logged_total",
        "Interactions logged by action"
    );

    // Recommendation metrics
    describe_counter!(
        "recommendation_requests_total",
        "Recommendation requests by serving source"
    );
    describe_histogram!(
        "recommendation_duration_seconds",
        "Recommendation pipeline duration in seconds"
    );
    describe_counter!(
        "exploration_injections_total",
        "Exploration items injected by source"
    );
    describe_counter!(
        "ab_assignments_total",
        "New A/B group assignments by group"
    );

    // Compensation metrics
    describe_counter!(
        "compensation_enqueued_total",
        "Compensation actions enqueued by type"
    );
    describe_counter!(
        "compensation_processed_total",
        "Compensation actions processed by type and outcome"
    );
    describe_gauge!(
        "compensation_queue_depth",
        "Pending compensation actions"
    );

    // Tag vector metrics
    describe_counter!(
        "tag_vector_updates_total",
        "Tag vector refresh runs by status"
    );
    describe_histogram!(
        "tag_vector_update_duration_seconds",
        "Tag vector refresh duration in seconds"
    );
    describe_gauge!(
        "tag_vectors_tracked",
        "Tags updated in the last refresh run"
    );
}
