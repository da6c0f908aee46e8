use async_trait::async_trait;
use observability::CompensationMetrics;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, Statement,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::{ActiveModel, Entity};
use crate::error::{CompensationError, CompensationResult};
use crate::models::{ActionStatus, CompensationAction, NewCompensationAction};
use crate::repository::CompensationQueue;

/// PostgreSQL implementation of CompensationQueue
#[derive(Clone)]
pub struct PgCompensationQueue {
    db: DatabaseConnection,
}

impl PgCompensationQueue {
    /// Create a new PostgreSQL compensation queue
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct DepthRow {
    depth: i64,
}

#[async_trait]
impl CompensationQueue for PgCompensationQueue {
    async fn enqueue(
        &self,
        action: NewCompensationAction,
    ) -> CompensationResult<CompensationAction> {
        let action_type = action.action_type;
        let model: ActiveModel = action.into();
        let stored: CompensationAction = model.insert(&self.db).await?.into();

        CompensationMetrics::record_enqueued(&action_type.to_string());
        info!(
            action_id = %stored.id,
            action_type = %stored.action_type,
            description = %stored.description,
            "Compensation action queued"
        );
        Ok(stored)
    }

    async fn dequeue(&self) -> CompensationResult<Option<CompensationAction>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT * FROM compensation_queue
               WHERE status IN ('pending', 'failed') AND retry_count < max_retries
               ORDER BY created_at ASC
               LIMIT 1"#,
            [],
        );

        let action = Entity::find()
            .from_raw_sql(stmt)
            .one(&self.db)
            .await?
            .map(Into::into);
        Ok(action)
    }

    async fn mark_completed(&self, action_id: Uuid) -> CompensationResult<()> {
        let action = Entity::find_by_id(action_id)
            .one(&self.db)
            .await?
            .ok_or(CompensationError::NotFound(action_id))?;

        let mut model: ActiveModel = action.into();
        model.status = Set(ActionStatus::Completed);
        model.updated_at = Set(chrono::Utc::now().into());
        model.update(&self.db).await?;

        info!(action_id = %action_id, "Compensation action completed");
        Ok(())
    }

    async fn mark_failed(
        &self,
        action_id: Uuid,
        error: &str,
    ) -> CompensationResult<CompensationAction> {
        let action = Entity::find_by_id(action_id)
            .one(&self.db)
            .await?
            .ok_or(CompensationError::NotFound(action_id))?;

        let retry_count = action.retry_count + 1;
        let mut model: ActiveModel = action.into();
        model.status = Set(ActionStatus::Failed);
        model.retry_count = Set(retry_count);
        model.last_error = Set(Some(error.to_string()));
        model.updated_at = Set(chrono::Utc::now().into());
        let updated: CompensationAction = model.update(&self.db).await?.into();

        tracing::error!(
            action_id = %action_id,
            retry_count = updated.retry_count,
            error = error,
            "Compensation action failed"
        );
        Ok(updated)
    }

    async fn get_failed_actions(&self) -> CompensationResult<Vec<CompensationAction>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT * FROM compensation_queue
               WHERE status = 'failed' AND retry_count >= max_retries
               ORDER BY created_at ASC"#,
            [],
        );

        let actions = Entity::find()
            .from_raw_sql(stmt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(actions)
    }

    async fn pending_depth(&self) -> CompensationResult<u64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT COUNT(*) AS depth FROM compensation_queue
               WHERE status IN ('pending', 'failed') AND retry_count < max_retries"#,
            [],
        );

        let row = DepthRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(row.map(|r| r.depth as u64).unwrap_or(0))
    }
}
