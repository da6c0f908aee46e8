use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CompensationResult;
use crate::models::{CompensationAction, NewCompensationAction};

/// Durable queue of compensation actions
///
/// The queue is FIFO by creation time over the eligible set: actions that
/// are `pending`, or `failed` with retries remaining. `completed` and
/// `failed`-with-exhausted-retries are terminal.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait CompensationQueue: Send + Sync {
    /// Persist a new action in `pending` state
    async fn enqueue(&self, action: NewCompensationAction)
        -> CompensationResult<CompensationAction>;

    /// Oldest eligible action, or None when the queue is drained
    async fn dequeue(&self) -> CompensationResult<Option<CompensationAction>>;

    /// Terminal success
    async fn mark_completed(&self, action_id: Uuid) -> CompensationResult<()>;

    /// Record a failed attempt: sets `failed`, increments `retry_count`,
    /// stores the error. Returns the updated action so callers can see
    /// whether the budget is spent.
    async fn mark_failed(
        &self,
        action_id: Uuid,
        error: &str,
    ) -> CompensationResult<CompensationAction>;

    /// Actions that exhausted their retries, for operator review
    async fn get_failed_actions(&self) -> CompensationResult<Vec<CompensationAction>>;

    /// Number of actions currently eligible for processing
    async fn pending_depth(&self) -> CompensationResult<u64>;
}
