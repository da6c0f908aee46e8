use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::processor::CompensationProcessor;
use crate::repository::CompensationQueue;

/// Tuning for the background compensation worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delay between drains while the queue has work.
    pub poll_interval: Duration,
    /// Ceiling for the idle backoff when consecutive drains find nothing.
    pub max_poll_interval: Duration,
    /// Upper bound on actions processed in a single drain.
    pub max_actions_per_drain: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_poll_interval: Duration::from_secs(300),
            max_actions_per_drain: 25,
        }
    }
}

/// Process eligible actions until the queue is empty or the bound is hit.
///
/// Returns how many actions were processed. A queue access error stops the
/// drain early; whatever is left is picked up on the next cycle.
pub async fn drain<Q: CompensationQueue>(
    processor: &CompensationProcessor<Q>,
    max_actions: usize,
) -> usize {
    let mut processed = 0;
    for _ in 0..max_actions {
        match processor.process_next().await {
            Ok(true) => processed += 1,
            Ok(false) => break,
            Err(error) => {
                error!(error = %error, "Compensation drain aborted");
                break;
            }
        }
    }
    processed
}

/// Run the compensation worker until a shutdown signal arrives.
///
/// Each cycle drains up to `max_actions_per_drain` actions, publishes the
/// queue depth gauge, then sleeps. Empty drains double the sleep up to
/// `max_poll_interval`; finding work resets it to `poll_interval`.
pub async fn run<Q: CompensationQueue>(
    processor: CompensationProcessor<Q>,
    config: WorkerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        poll_interval_secs = config.poll_interval.as_secs(),
        max_actions_per_drain = config.max_actions_per_drain,
        "Starting compensation worker"
    );

    let mut idle_backoff = config.poll_interval;
    loop {
        let processed = drain(&processor, config.max_actions_per_drain).await;
        processor.record_queue_depth().await;

        if processed == 0 {
            idle_backoff = (idle_backoff * 2).min(config.max_poll_interval);
        } else {
            debug!(processed, "Drained compensation actions");
            idle_backoff = config.poll_interval;
        }

        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("Shutdown signal received, stopping compensation worker");
                    break;
                }
            }
            _ = tokio::time::sleep(idle_backoff) => {}
        }
    }

    info!("Compensation worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionStatus, ActionType, CompensationAction, OP_TINYBIRD_INGEST};
    use crate::processor::MockRollbackTarget;
    use crate::repository::MockCompensationQueue;
    use chrono::Utc;
    use providers::{MockAlertNotifier, MockAnalyticsSink, MockVectorIndex};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn manual_action() -> CompensationAction {
        CompensationAction {
            id: Uuid::now_v7(),
            action_type: ActionType::ManualIntervention,
            description: "Failed initial operations for event evt-1".to_string(),
            payload: json!({
                "event_id": "evt-1",
                "event_data": { "id": "evt-1" },
                "error": "embedding API returned a zero vector",
                "completed_operations": [OP_TINYBIRD_INGEST],
            }),
            status: ActionStatus::Pending,
            retry_count: 0,
            max_retries: 3,
            last_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn processor(queue: MockCompensationQueue) -> CompensationProcessor<MockCompensationQueue> {
        CompensationProcessor::new(
            Arc::new(queue),
            Arc::new(MockVectorIndex::new()),
            Arc::new(MockAnalyticsSink::new()),
            Arc::new(MockRollbackTarget::new()),
            Arc::new(quiet_alerts()),
        )
    }

    fn quiet_alerts() -> MockAlertNotifier {
        let mut alerts = MockAlertNotifier::new();
        alerts.expect_notify().returning(|_, _| Ok(()));
        alerts
    }

    #[tokio::test]
    async fn test_drain_respects_bound() {
        let mut queue = MockCompensationQueue::new();
        queue
            .expect_dequeue()
            .times(3)
            .returning(|| Ok(Some(manual_action())));
        queue.expect_mark_completed().times(3).returning(|_| Ok(()));

        let processed = drain(&processor(queue), 3).await;
        assert_eq!(processed, 3);
    }

    #[tokio::test]
    async fn test_drain_stops_when_queue_empties() {
        let calls = AtomicUsize::new(0);
        let mut queue = MockCompensationQueue::new();
        queue.expect_dequeue().times(3).returning(move || {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(Some(manual_action()))
            } else {
                Ok(None)
            }
        });
        queue.expect_mark_completed().times(2).returning(|_| Ok(()));

        let processed = drain(&processor(queue), 25).await;
        assert_eq!(processed, 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_signal() {
        let mut queue = MockCompensationQueue::new();
        queue.expect_dequeue().returning(|| Ok(None));
        queue.expect_pending_depth().returning(|| Ok(0));

        let config = WorkerConfig {
            poll_interval: Duration::from_millis(10),
            max_poll_interval: Duration::from_millis(40),
            max_actions_per_drain: 5,
        };
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run(processor(queue), config, rx));

        tokio::time::sleep(Duration::from_millis(25)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
