use std::sync::Arc;

use async_trait::async_trait;
use observability::CompensationMetrics;
use providers::{AlertNotifier, AnalyticsEvent, AnalyticsSink, VectorIndex, VectorRecord};
use tracing::{info, instrument, warn};

use crate::error::{CompensationError, CompensationResult};
use crate::models::{
    ActionType, CompensationAction, ManualInterventionPayload, OP_D1_INSERT, OP_TINYBIRD_INGEST,
    OP_VECTOR_UPSERT, RetryPayload, RollbackPayload,
};
use crate::repository::CompensationQueue;

/// Relational side of rollback and replay.
///
/// Implemented by the store that owns the event rows; the processor only
/// knows how to undo or re-apply a write, not what the rows look like.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RollbackTarget: Send + Sync {
    /// Remove the relational row written during a partially failed ingestion.
    async fn delete_event(&self, event_id: &str) -> CompensationResult<()>;

    /// Re-apply a relational insert from the payload captured at failure time.
    async fn restore_event(&self, event: &serde_json::Value) -> CompensationResult<()>;
}

/// Executes queued compensation actions against the live stores.
///
/// Each call to [`process_next`](Self::process_next) takes the oldest
/// eligible action, runs it, and records the outcome on the queue. A failed
/// run puts the action back into the eligible set until its retries are
/// exhausted, at which point the alert webhook is notified and the action
/// stays visible through `get_failed_actions`.
pub struct CompensationProcessor<Q: CompensationQueue> {
    queue: Arc<Q>,
    vector_index: Arc<dyn VectorIndex>,
    analytics: Arc<dyn AnalyticsSink>,
    rollback: Arc<dyn RollbackTarget>,
    alerts: Arc<dyn AlertNotifier>,
}

impl<Q: CompensationQueue> CompensationProcessor<Q> {
    pub fn new(
        queue: Arc<Q>,
        vector_index: Arc<dyn VectorIndex>,
        analytics: Arc<dyn AnalyticsSink>,
        rollback: Arc<dyn RollbackTarget>,
        alerts: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            queue,
            vector_index,
            analytics,
            rollback,
            alerts,
        }
    }

    /// Process the oldest eligible action, if any.
    ///
    /// Returns `Ok(false)` when the queue is empty. Execution failures are
    /// recorded on the action and do not bubble up; only queue access errors
    /// abort the caller's drain loop.
    #[instrument(skip(self))]
    pub async fn process_next(&self) -> CompensationResult<bool> {
        let Some(action) = self.queue.dequeue().await? else {
            return Ok(false);
        };

        let outcome = match action.action_type {
            ActionType::Rollback => self.execute_rollback(&action).await,
            ActionType::Retry => self.execute_retry(&action).await,
            ActionType::ManualIntervention => self.flag_manual_intervention(&action).await,
        };

        match outcome {
            Ok(()) => {
                self.queue.mark_completed(action.id).await?;
                CompensationMetrics::record_processed(&action.action_type.to_string(), "completed");
            }
            Err(error) => {
                let updated = self.queue.mark_failed(action.id, &error.to_string()).await?;
                CompensationMetrics::record_processed(&action.action_type.to_string(), "failed");
                if updated.retries_exhausted() {
                    self.alert_exhausted(&updated).await;
                }
            }
        }
        Ok(true)
    }

    /// Publish the current queue depth gauge.
    pub async fn record_queue_depth(&self) {
        match self.queue.pending_depth().await {
            Ok(depth) => CompensationMetrics::set_queue_depth(depth),
            Err(error) => warn!(error = %error, "Failed to read compensation queue depth"),
        }
    }

    /// Reverse the stores that accepted a write before the ingestion failed.
    ///
    /// The payload's `operations` list names what succeeded; only those
    /// stores are touched. Analytics rows are append-only and stay in place.
    async fn execute_rollback(&self, action: &CompensationAction) -> CompensationResult<()> {
        let payload: RollbackPayload = serde_json::from_value(action.payload.clone())?;

        if payload.operations.iter().any(|op| op == OP_VECTOR_UPSERT) {
            self.vector_index
                .delete(std::slice::from_ref(&payload.event_id))
                .await?;
        }
        if payload.operations.iter().any(|op| op == OP_D1_INSERT) {
            self.rollback.delete_event(&payload.event_id).await?;
        }

        info!(
            event_id = %payload.event_id,
            failed_operation = %payload.failed_operation,
            reversed = payload.operations.len(),
            "Rolled back partially ingested event"
        );
        Ok(())
    }

    /// Replay a single store write that failed during ingestion.
    async fn execute_retry(&self, action: &CompensationAction) -> CompensationResult<()> {
        let payload: RetryPayload = serde_json::from_value(action.payload.clone())?;

        match payload.operation.as_str() {
            OP_TINYBIRD_INGEST => {
                let event: AnalyticsEvent = serde_json::from_value(payload.data)?;
                self.analytics.ingest_event(&event).await?;
            }
            OP_VECTOR_UPSERT => {
                let record: VectorRecord = serde_json::from_value(payload.data)?;
                self.vector_index.upsert(std::slice::from_ref(&record)).await?;
            }
            OP_D1_INSERT => {
                self.rollback.restore_event(&payload.data).await?;
            }
            other => return Err(CompensationError::UnknownOperation(other.to_string())),
        }

        info!(
            event_id = %payload.event_id,
            operation = %payload.operation,
            "Replayed failed store write"
        );
        Ok(())
    }

    /// Route an action no automatic recovery exists for to an operator.
    ///
    /// Nothing is written on this path; the action completes once the alert
    /// is delivered and the payload stays on the row for inspection.
    async fn flag_manual_intervention(&self, action: &CompensationAction) -> CompensationResult<()> {
        let payload: ManualInterventionPayload = serde_json::from_value(action.payload.clone())?;

        warn!(
            action_id = %action.id,
            event_id = %payload.event_id,
            error = %payload.error,
            "Manual intervention required"
        );
        self.alerts.notify(action.id, &action.description).await?;
        Ok(())
    }

    async fn alert_exhausted(&self, action: &CompensationAction) {
        let description = format!(
            "Compensation action exhausted retries ({}): {}",
            action.retry_count, action.description
        );
        if let Err(error) = self.alerts.notify(action.id, &description).await {
            warn!(
                action_id = %action.id,
                error = %error,
                "Failed to alert on exhausted compensation action"
            );
        }
    }
}
