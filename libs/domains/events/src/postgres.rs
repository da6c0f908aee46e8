use async_trait::async_trait;
use domain_compensation::{CompensationResult, RollbackTarget};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use tracing::info;

use crate::entity::{ActiveModel, Entity};
use crate::error::EventResult;
use crate::models::{Event, IngestEvent, NewEvent};
use crate::repository::EventRepository;

/// PostgreSQL implementation of EventRepository
#[derive(Clone)]
pub struct PgEventRepository {
    db: DatabaseConnection,
}

impl PgEventRepository {
    /// Create a new PostgreSQL event repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn insert(&self, event: NewEvent) -> EventResult<Event> {
        let model: ActiveModel = event.into();
        Ok(model.insert(&self.db).await?.into())
    }

    async fn delete(&self, event_id: &str) -> EventResult<bool> {
        let result = Entity::delete_by_id(event_id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}

/// Compensation-side access to the events table.
///
/// Rollback deletes the row a partially failed ingestion wrote; retry
/// re-applies the insert from the payload captured at failure time.
#[async_trait]
impl RollbackTarget for PgEventRepository {
    async fn delete_event(&self, event_id: &str) -> CompensationResult<()> {
        let result = Entity::delete_by_id(event_id).exec(&self.db).await?;
        info!(
            event_id = event_id,
            deleted = result.rows_affected > 0,
            "Rolled back event row"
        );
        Ok(())
    }

    async fn restore_event(&self, event: &serde_json::Value) -> CompensationResult<()> {
        let input: IngestEvent = serde_json::from_value(event.clone())?;
        let model: ActiveModel = NewEvent::from(&input).into();
        model.insert(&self.db).await?;
        Ok(())
    }
}
