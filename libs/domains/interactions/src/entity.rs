use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

// ===== Interactions Entity =====

pub mod interaction {
    use super::*;
    use crate::models::InteractionAction;

    /// One interaction row. `event_id` is plain text rather than a foreign
    /// key: signup rows carry a sentinel id that never exists in `events`.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "interactions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: String,
        pub event_id: String,
        pub action: InteractionAction,
        #[sea_orm(column_type = "Float")]
        pub weight: f32,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::Interaction {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                user_id: model.user_id,
                event_id: model.event_id,
                action: model.action,
                weight: model.weight,
                created_at: model.created_at.into(),
            }
        }
    }

    impl From<crate::models::NewInteraction> for ActiveModel {
        fn from(input: crate::models::NewInteraction) -> Self {
            ActiveModel {
                id: Set(Uuid::now_v7()),
                user_id: Set(input.user_id),
                event_id: Set(input.event_id),
                action: Set(input.action),
                weight: Set(input.weight),
                created_at: Set(chrono::Utc::now().into()),
            }
        }
    }
}

// ===== User Profiles Entity =====

pub mod user_profile {
    use super::*;

    /// Demographic profile maintained by the account system. The engine
    /// only ever reads these rows.
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "user_profiles")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: String,
        #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
        pub country: Option<String>,
        #[sea_orm(column_type = "JsonBinary")]
        pub interests: serde_json::Value,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::UserProfile {
        fn from(model: Model) -> Self {
            let interests: Vec<String> =
                serde_json::from_value(model.interests).unwrap_or_default();

            Self {
                user_id: model.user_id,
                country: model.country,
                interests,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }
}
