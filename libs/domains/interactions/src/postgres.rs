use async_trait::async_trait;
use chrono::Duration;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
};

use crate::entity::interaction::{ActiveModel, Column, Entity};
use crate::entity::user_profile;
use crate::error::InteractionResult;
use crate::models::{
    Interaction, InteractionAction, NewInteraction, SimilarUser, TrendingEvent, UserProfile,
};
use crate::repository::InteractionRepository;

/// PostgreSQL implementation of InteractionRepository
#[derive(Clone)]
pub struct PgInteractionRepository {
    db: DatabaseConnection,
}

impl PgInteractionRepository {
    /// Create a new PostgreSQL interaction repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct EngagementRow {
    rate: f64,
}

#[async_trait]
impl InteractionRepository for PgInteractionRepository {
    async fn insert(&self, input: NewInteraction) -> InteractionResult<Interaction> {
        let model: ActiveModel = input.into();
        let result = model.insert(&self.db).await?.into();
        Ok(result)
    }

    async fn user_exists(&self, user_id: &str) -> InteractionResult<bool> {
        let found = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn interactions_for_user(&self, user_id: &str) -> InteractionResult<Vec<Interaction>> {
        let rows = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Action.ne(InteractionAction::Signup))
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn interaction_count(&self, user_id: &str) -> InteractionResult<u64> {
        let count = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn engagement_rate(&self, user_id: &str, window: Duration) -> InteractionResult<f32> {
        let cutoff = chrono::Utc::now() - window;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT COALESCE(AVG(CASE WHEN action IN ('like', 'click') THEN 1.0 ELSE 0.0 END)::float8, 0.0) AS rate
               FROM interactions
               WHERE user_id = $1 AND created_at > $2"#,
            [user_id.into(), cutoff.into()],
        );

        let row = EngagementRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(row.map(|r| r.rate as f32).unwrap_or(0.0))
    }

    async fn similar_users(
        &self,
        user_id: &str,
        limit: u64,
    ) -> InteractionResult<Vec<SimilarUser>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT i2.user_id, COUNT(i1.event_id) AS common_interactions
               FROM interactions i1
               JOIN interactions i2
                 ON i1.event_id = i2.event_id AND i1.user_id != i2.user_id
               WHERE i1.user_id = $1 AND i1.action IN ('like', 'click')
               GROUP BY i2.user_id
               ORDER BY common_interactions DESC
               LIMIT $2"#,
            [user_id.into(), (limit as i64).into()],
        );

        let rows = SimilarUser::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows)
    }

    async fn interactions_for_users(
        &self,
        user_ids: &[String],
        limit: u64,
    ) -> InteractionResult<Vec<Interaction>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Entity::find()
            .filter(Column::UserId.is_in(user_ids.iter().cloned()))
            .filter(Column::Action.is_in([InteractionAction::Like, InteractionAction::Click]))
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn trending_events(
        &self,
        window: Duration,
        limit: u64,
    ) -> InteractionResult<Vec<TrendingEvent>> {
        let cutoff = chrono::Utc::now() - window;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT event_id,
                      COUNT(*) AS interaction_count,
                      AVG(CASE WHEN action IN ('like', 'click') THEN 1.0 ELSE 0.0 END)::float8 AS engagement_rate
               FROM interactions
               WHERE created_at > $1 AND action != 'signup'
               GROUP BY event_id
               ORDER BY COUNT(*) * AVG(CASE WHEN action IN ('like', 'click') THEN 1.0 ELSE 0.0 END) DESC
               LIMIT $2"#,
            [cutoff.into(), (limit as i64).into()],
        );

        let rows = TrendingEvent::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows)
    }

    async fn recently_interacted_event_ids(
        &self,
        window: Duration,
        limit: u64,
    ) -> InteractionResult<Vec<String>> {
        let cutoff: chrono::DateTime<chrono::FixedOffset> = (chrono::Utc::now() - window).into();
        let ids = Entity::find()
            .select_only()
            .column(Column::EventId)
            .distinct()
            .filter(Column::CreatedAt.gt(cutoff))
            .filter(Column::Action.is_in([
                InteractionAction::Like,
                InteractionAction::Click,
                InteractionAction::View,
            ]))
            .limit(limit)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    async fn user_profile(&self, user_id: &str) -> InteractionResult<Option<UserProfile>> {
        let profile = user_profile::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(Into::into);
        Ok(profile)
    }
}
