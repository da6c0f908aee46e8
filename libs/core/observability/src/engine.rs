//! Engine-specific metrics for ingestion, recommendations, and compensation.

use metrics::{counter, gauge, histogram};

/// Event ingestion metrics recorder
pub struct IngestionMetrics;

impl IngestionMetrics {
    /// Record a fully successful ingestion
    pub fn record_success(operations: usize, duration_ms: u64) {
        counter!("event_ingestion_total", "status" => "success").increment(1);
        histogram!("event_ingestion_duration_seconds").record(duration_ms as f64 / 1000.0);

        tracing::debug!(
            operations = operations,
            duration_ms = duration_ms,
            "Event ingested"
        );
    }

    /// Record an ingestion that failed partway through the write fan-out
    pub fn record_failure(failed_operation: &str) {
        counter!("event_ingestion_total", "status" => "error").increment(1);
        counter!(
            "event_ingestion_failed_operations_total",
            "operation" => failed_operation.to_string()
        )
        .increment(1);
    }

    /// Record a logged user interaction
    pub fn record_interaction(action: &str) {
        counter!("interaction_logged_total", "action" => action.to_string()).increment(1);
    }
}

/// Recommendation pipeline metrics recorder
pub struct RecommendationMetrics;

impl RecommendationMetrics {
    /// Record a request served from the Redis cache
    pub fn record_cache_hit() {
        counter!("recommendation_requests_total", "source" => "cache").increment(1);
    }

    /// Record a request that ran the full pipeline
    pub fn record_computed(duration_ms: u64) {
        counter!("recommendation_requests_total", "source" => "computed").increment(1);
        histogram!("recommendation_duration_seconds").record(duration_ms as f64 / 1000.0);
    }

    /// Record a request that fell back to trending results
    pub fn record_fallback() {
        counter!("recommendation_requests_total", "source" => "fallback").increment(1);
    }

    /// Record exploration items injected into a response
    pub fn record_exploration_injected(source: &str, count: usize) {
        counter!(
            "exploration_injections_total",
            "source" => source.to_string()
        )
        .increment(count as u64);
    }

    /// Record a fresh A/B group assignment
    pub fn record_ab_assignment(group: &str) {
        counter!("ab_assignments_total", "group" => group.to_string()).increment(1);
    }
}

/// Compensation queue metrics recorder
pub struct CompensationMetrics;

impl CompensationMetrics {
    /// Record an action entering the queue
    pub fn record_enqueued(action_type: &str) {
        counter!(
            "compensation_enqueued_total",
            "action_type" => action_type.to_string()
        )
        .increment(1);
    }

    /// Record a processed action and its outcome
    pub fn record_processed(action_type: &str, outcome: &str) {
        counter!(
            "compensation_processed_total",
            "action_type" => action_type.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
    }

    /// Set the current pending queue depth
    pub fn set_queue_depth(depth: u64) {
        gauge!("compensation_queue_depth").set(depth as f64);
    }
}

/// Scheduled tag vector refresh metrics recorder
pub struct TagUpdateMetrics;

impl TagUpdateMetrics {
    /// Record a completed refresh run
    pub fn record_run(tags_updated: usize, duration_secs: f64) {
        counter!("tag_vector_updates_total", "status" => "completed").increment(1);
        histogram!("tag_vector_update_duration_seconds").record(duration_secs);
        gauge!("tag_vectors_tracked").set(tags_updated as f64);

        tracing::info!(
            tags_updated = tags_updated,
            duration_secs = duration_secs,
            "Tag vector refresh completed"
        );
    }

    /// Record a failed refresh run
    pub fn record_failure(error: &str) {
        counter!("tag_vector_updates_total", "status" => "failed").increment(1);

        tracing::error!(error = error, "Tag vector refresh failed");
    }
}
