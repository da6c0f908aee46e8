use crate::models::{ActionStatus, ActionType};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

/// Sea-ORM Entity for the compensation_queue table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "compensation_queue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub action_type: ActionType,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub payload: Json,
    pub status: ActionStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::CompensationAction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            action_type: model.action_type,
            description: model.description,
            payload: model.payload,
            status: model.status,
            retry_count: model.retry_count,
            max_retries: model.max_retries,
            last_error: model.last_error,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<crate::models::NewCompensationAction> for ActiveModel {
    fn from(input: crate::models::NewCompensationAction) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: Set(Uuid::now_v7()),
            action_type: Set(input.action_type),
            description: Set(input.description),
            payload: Set(input.payload),
            status: Set(ActionStatus::Pending),
            retry_count: Set(0),
            max_retries: Set(input.max_retries),
            last_error: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}
