//! Event ingestion orchestration
//!
//! One ingested event lands in three stores that cannot share a transaction:
//! the analytics sink, the vector index, and PostgreSQL. The orchestrator
//! tracks which writes completed and turns partial failures into queued
//! compensation actions instead of leaving the stores divergent.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use database::common::retry;
use domain_compensation::{
    CompensationQueue, ManualInterventionPayload, NewCompensationAction, OP_D1_INSERT,
    OP_EMBEDDING_GENERATION, OP_TINYBIRD_INGEST, OP_VECTOR_UPSERT, RollbackPayload,
    is_durable_operation,
};
use observability::IngestionMetrics;
use providers::{
    AnalyticsEvent, AnalyticsSink, EmbeddingProvider, VectorIndex, VectorMetadata, VectorRecord,
    embed_or_zero, is_zero_vector,
};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::error::{EventError, EventResult};
use crate::models::{IngestEvent, IngestEventResponse, NewEvent};
use crate::repository::EventRepository;

/// Coordinates the multi-store event write path
pub struct EventIngestionService<R: EventRepository> {
    repository: Arc<R>,
    embeddings: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    analytics: Arc<dyn AnalyticsSink>,
    compensation: Arc<dyn CompensationQueue>,
}

impl<R: EventRepository> EventIngestionService<R> {
    pub fn new(
        repository: Arc<R>,
        embeddings: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
        analytics: Arc<dyn AnalyticsSink>,
        compensation: Arc<dyn CompensationQueue>,
    ) -> Self {
        Self {
            repository,
            embeddings,
            vector_index,
            analytics,
            compensation,
        }
    }

    /// Ingest one event into all stores.
    ///
    /// Embedding generation and analytics ingestion run in parallel; the
    /// vector upsert and the relational insert follow in order. Every
    /// completed operation is tracked so a failure partway through can queue
    /// the matching compensation action.
    #[instrument(skip(self, input), fields(event_id = %input.id))]
    pub async fn ingest(&self, input: IngestEvent) -> EventResult<IngestEventResponse> {
        input
            .validate()
            .map_err(|e| EventError::Validation(e.to_string()))?;

        let started = Instant::now();
        let now_ms = Utc::now().timestamp_millis();
        let analytics_event = AnalyticsEvent {
            id: input.id.clone(),
            title: input.title.clone(),
            description: input.description.clone(),
            tags: input.tags.clone(),
            host: input.host.clone(),
            category: input.category.clone(),
            location: input.location.clone(),
            created_at: now_ms,
            updated_at: now_ms,
        };
        let embedding_text = input.embedding_text();

        let (vector, ingest_result) = tokio::join!(
            embed_or_zero(self.embeddings.as_ref(), &embedding_text),
            retry(|| self.analytics.ingest_event(&analytics_event)),
        );

        let mut completed: Vec<String> = Vec::new();
        let mut analytics_response = None;
        let mut failure: Option<(&str, String)> = None;

        match ingest_result {
            Ok(value) => {
                completed.push(OP_TINYBIRD_INGEST.to_string());
                analytics_response = Some(value);
            }
            Err(error) => failure = Some((OP_TINYBIRD_INGEST, error.to_string())),
        }
        if is_zero_vector(&vector) {
            failure.get_or_insert((
                OP_EMBEDDING_GENERATION,
                "Failed to generate a valid embedding for the event.".to_string(),
            ));
        } else {
            completed.push(OP_EMBEDDING_GENERATION.to_string());
        }

        if let Some((failed_operation, reason)) = failure {
            return Err(self
                .initial_failure(&input, completed, failed_operation, reason)
                .await);
        }

        let vector_record = VectorRecord {
            id: input.id.clone(),
            vector: vector.clone(),
            metadata: Some(VectorMetadata {
                title: input.title.clone(),
                tags: input.tags.clone(),
                host: input.host.clone().unwrap_or_default(),
                category: input.category.clone().unwrap_or_default(),
                location: input.location.clone().unwrap_or_default(),
            }),
        };
        if let Err(error) = self
            .vector_index
            .upsert(std::slice::from_ref(&vector_record))
            .await
        {
            return Err(self
                .partial_failure(&input, completed, &vector, analytics_response, error.to_string())
                .await);
        }
        completed.push(OP_VECTOR_UPSERT.to_string());

        if let Err(error) = self.repository.insert(NewEvent::from(&input)).await {
            return Err(self
                .partial_failure(&input, completed, &vector, analytics_response, error.to_string())
                .await);
        }
        completed.push(OP_D1_INSERT.to_string());

        let duration_ms = started.elapsed().as_millis() as u64;
        IngestionMetrics::record_success(completed.len(), duration_ms);
        info!(
            operations = ?completed,
            duration_ms = duration_ms,
            "Event ingestion completed"
        );

        Ok(IngestEventResponse {
            success: true,
            message: format!("Event {} ingested.", input.id),
            tinybird_response: analytics_response,
        })
    }

    /// Handle a failure before any ordered store write started.
    ///
    /// A compensation action is queued only when a durable store already
    /// accepted a write; failing with nothing written needs no cleanup.
    async fn initial_failure(
        &self,
        input: &IngestEvent,
        completed: Vec<String>,
        failed_operation: &str,
        reason: String,
    ) -> EventError {
        IngestionMetrics::record_failure(failed_operation);

        if completed.iter().any(|op| is_durable_operation(op)) {
            let action = NewCompensationAction::manual_intervention(
                format!("Failed initial operations for event {}", input.id),
                &ManualInterventionPayload {
                    event_id: input.id.clone(),
                    event_data: serde_json::to_value(input).unwrap_or_default(),
                    error: reason.clone(),
                    completed_operations: completed,
                },
            );
            match self.compensation.enqueue(action).await {
                Ok(queued) => warn!(
                    event_id = %input.id,
                    action_id = %queued.id,
                    reason = %reason,
                    "Initial ingestion failure, manual intervention queued"
                ),
                Err(error) => return EventError::Compensation(error.to_string()),
            }
        }

        EventError::IngestionFailed {
            event_id: input.id.clone(),
            reason,
        }
    }

    /// Handle a failure after the parallel phase succeeded.
    ///
    /// By this point the analytics sink has durably accepted the event, so a
    /// rollback action carrying the completed-operation set is always queued.
    async fn partial_failure(
        &self,
        input: &IngestEvent,
        completed: Vec<String>,
        vector: &[f32],
        analytics_response: Option<serde_json::Value>,
        cause: String,
    ) -> EventError {
        let failed_operation = if completed.iter().any(|op| op == OP_VECTOR_UPSERT) {
            OP_D1_INSERT
        } else {
            OP_VECTOR_UPSERT
        };
        IngestionMetrics::record_failure(failed_operation);

        let action = NewCompensationAction::rollback(
            format!("Partial failure in event ingestion for {}", input.id),
            &RollbackPayload {
                event_id: input.id.clone(),
                operations: completed,
                failed_operation: failed_operation.to_string(),
                event_data: serde_json::to_value(input).unwrap_or_default(),
                vector: vector.to_vec(),
                analytics_result: analytics_response,
            },
        );

        match self.compensation.enqueue(action).await {
            Ok(queued) => {
                warn!(
                    event_id = %input.id,
                    action_id = %queued.id,
                    failed_operation = failed_operation,
                    cause = %cause,
                    "Partial ingestion failure, rollback queued"
                );
                EventError::PartialFailure {
                    event_id: input.id.clone(),
                    failed_operation: failed_operation.to_string(),
                    cause,
                }
            }
            Err(error) => EventError::Compensation(error.to_string()),
        }
    }
}
