use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter, FromQueryResult};
use serde::{Deserialize, Serialize};
use strum::Display;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Sentinel event id recorded with the synthetic signup interaction that
/// precedes a user's first real interaction.
pub const SIGNUP_SENTINEL_EVENT_ID: &str = "initial_signup";

/// User actions the engine learns from
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
    TS,
)]
#[ts(export)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "interaction_action")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InteractionAction {
    #[sea_orm(string_value = "click")]
    Click,
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "view")]
    View,
    #[sea_orm(string_value = "select_tags")]
    SelectTags,
    #[sea_orm(string_value = "dislike")]
    Dislike,
    #[sea_orm(string_value = "signup")]
    Signup,
}

/// Weight attached to each action at write time.
///
/// Interactions carry their weight forward, so changing these only affects
/// rows written afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionWeights {
    pub click: f32,
    pub like: f32,
    pub view: f32,
    pub select_tags: f32,
    pub dislike: f32,
    pub signup: f32,
}

impl Default for ActionWeights {
    fn default() -> Self {
        Self {
            click: 1.0,
            like: 2.0,
            view: 0.5,
            select_tags: 5.0,
            dislike: -1.0,
            signup: 0.0,
        }
    }
}

impl ActionWeights {
    pub fn for_action(&self, action: InteractionAction) -> f32 {
        match action {
            InteractionAction::Click => self.click,
            InteractionAction::Like => self.like,
            InteractionAction::View => self.view,
            InteractionAction::SelectTags => self.select_tags,
            InteractionAction::Dislike => self.dislike,
            InteractionAction::Signup => self.signup,
        }
    }
}

/// A recorded interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: String,
    pub event_id: String,
    pub action: InteractionAction,
    pub weight: f32,
    pub created_at: DateTime<Utc>,
}

/// Input for appending one interaction row
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub user_id: String,
    pub event_id: String,
    pub action: InteractionAction,
    pub weight: f32,
}

/// DTO for the log-interactions endpoint
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, TS)]
#[ts(export)]
pub struct LogInteraction {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub event_id: String,
    pub action: InteractionAction,
    /// Required and non-empty for `select_tags`, ignored otherwise
    pub tags: Option<Vec<String>>,
}

impl LogInteraction {
    /// True when this is a `select_tags` interaction missing its tag payload.
    /// Field-level validation cannot express the cross-field rule.
    pub fn missing_selected_tags(&self) -> bool {
        self.action == InteractionAction::SelectTags
            && self.tags.as_ref().is_none_or(|tags| tags.is_empty())
    }
}

/// Response for the log-interactions endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct LogInteractionResponse {
    pub success: bool,
    pub message: String,
}

/// A user sharing liked/clicked events with the target user
#[derive(Debug, Clone, FromQueryResult)]
pub struct SimilarUser {
    pub user_id: String,
    pub common_interactions: i64,
}

/// Aggregate row for recently popular events
#[derive(Debug, Clone, FromQueryResult)]
pub struct TrendingEvent {
    pub event_id: String,
    pub interaction_count: i64,
    pub engagement_rate: f64,
}

/// Optional demographic profile, read-only to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub country: Option<String>,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Free-text rendering embedded as the demographic sub-vector.
    /// Empty when the profile carries no usable signal.
    pub fn demographics_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(country) = &self.country {
            parts.push(country);
        }
        parts.extend(self.interests.iter().map(String::as_str));
        parts.join(" ")
    }
}
