//! SeaORM entity for the `events` table

use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Event, NewEvent};

/// Relational event row.
///
/// Ids are caller-assigned text, shared with the vector index and the
/// analytics sink.
#[derive(Debug, Clone, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_type = "Text")]
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub host: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub category: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Event {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            host: model.host,
            category: model.category,
            location: model.location,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<NewEvent> for ActiveModel {
    fn from(event: NewEvent) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Set(event.id),
            title: Set(event.title),
            host: Set(event.host),
            category: Set(event.category),
            location: Set(event.location),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}
