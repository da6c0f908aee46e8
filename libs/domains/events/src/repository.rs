use async_trait::async_trait;

use crate::error::EventResult;
use crate::models::{Event, NewEvent};

/// Persistence seam for event rows
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert the relational row for an ingested event
    async fn insert(&self, event: NewEvent) -> EventResult<Event>;

    /// Delete an event row. Returns whether a row existed.
    async fn delete(&self, event_id: &str) -> EventResult<bool>;
}
