use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Write-operation names recorded in compensation payloads.
///
/// These are wire constants shared with queued payload rows; renaming them
/// would orphan actions already in the queue.
pub const OP_TINYBIRD_INGEST: &str = "tinybird_ingest";
pub const OP_EMBEDDING_GENERATION: &str = "embedding_generation";
pub const OP_VECTOR_UPSERT: &str = "vector_upsert";
pub const OP_D1_INSERT: &str = "d1_insert";

/// Default retry budget for a queued action
pub const DEFAULT_MAX_RETRIES: i32 = 3;

/// True for operations that leave durable state in an external store.
///
/// Embedding generation is pure compute; failing before any durable write
/// leaves nothing to compensate.
pub fn is_durable_operation(operation: &str) -> bool {
    matches!(
        operation,
        OP_TINYBIRD_INGEST | OP_VECTOR_UPSERT | OP_D1_INSERT
    )
}

/// Kind of remediation an action performs
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "compensation_action_type")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    #[sea_orm(string_value = "rollback")]
    Rollback,
    #[sea_orm(string_value = "retry")]
    Retry,
    #[sea_orm(string_value = "manual_intervention")]
    ManualIntervention,
}

/// Lifecycle state of a queued action
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "compensation_action_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// A queued remediation task for a partially-failed multi-store write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationAction {
    pub id: Uuid,
    pub action_type: ActionType,
    pub description: String,
    pub payload: serde_json::Value,
    pub status: ActionStatus,
    pub retry_count: i32,
    pub max_retries: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompensationAction {
    /// True once the retry budget is spent
    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

/// Input for enqueueing one action
#[derive(Debug, Clone)]
pub struct NewCompensationAction {
    pub action_type: ActionType,
    pub description: String,
    pub payload: serde_json::Value,
    pub max_retries: i32,
}

impl NewCompensationAction {
    pub fn rollback(description: impl Into<String>, payload: &RollbackPayload) -> Self {
        Self {
            action_type: ActionType::Rollback,
            description: description.into(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn retry(description: impl Into<String>, payload: &RetryPayload) -> Self {
        Self {
            action_type: ActionType::Retry,
            description: description.into(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn manual_intervention(
        description: impl Into<String>,
        payload: &ManualInterventionPayload,
    ) -> Self {
        Self {
            action_type: ActionType::ManualIntervention,
            description: description.into(),
            payload: serde_json::to_value(payload).unwrap_or_default(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Undo instructions for writes that committed before a later one failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPayload {
    pub event_id: String,
    /// Operations that completed, by wire name
    pub operations: Vec<String>,
    pub failed_operation: String,
    pub event_data: serde_json::Value,
    pub vector: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_result: Option<serde_json::Value>,
}

/// Replay instructions for a single failed write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPayload {
    pub event_id: String,
    pub operation: String,
    pub data: serde_json::Value,
}

/// Context handed to an operator when automation gives up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualInterventionPayload {
    pub event_id: String,
    pub event_data: serde_json::Value,
    pub error: String,
    pub completed_operations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_generation_is_not_durable() {
        assert!(is_durable_operation(OP_TINYBIRD_INGEST));
        assert!(is_durable_operation(OP_VECTOR_UPSERT));
        assert!(is_durable_operation(OP_D1_INSERT));
        assert!(!is_durable_operation(OP_EMBEDDING_GENERATION));
    }

    #[test]
    fn test_rollback_payload_round_trip() {
        let payload = RollbackPayload {
            event_id: "evt-1".to_string(),
            operations: vec![
                OP_TINYBIRD_INGEST.to_string(),
                OP_EMBEDDING_GENERATION.to_string(),
                OP_VECTOR_UPSERT.to_string(),
            ],
            failed_operation: OP_D1_INSERT.to_string(),
            event_data: serde_json::json!({"id": "evt-1", "title": "Rust meetup"}),
            vector: vec![0.1, 0.2],
            analytics_result: None,
        };

        let action = NewCompensationAction::rollback("partial failure", &payload);
        assert_eq!(action.action_type, ActionType::Rollback);
        assert_eq!(action.max_retries, DEFAULT_MAX_RETRIES);

        let parsed: RollbackPayload = serde_json::from_value(action.payload).unwrap();
        assert_eq!(parsed.event_id, "evt-1");
        assert_eq!(parsed.failed_operation, OP_D1_INSERT);
        assert_eq!(parsed.operations.len(), 3);
    }

    #[test]
    fn test_action_type_serialization() {
        assert_eq!(ActionType::ManualIntervention.to_string(), "manual_intervention");
        let parsed: ActionType = serde_json::from_str(r#""rollback""#).unwrap();
        assert_eq!(parsed, ActionType::Rollback);
    }

    #[test]
    fn test_retries_exhausted() {
        let action = CompensationAction {
            id: Uuid::now_v7(),
            action_type: ActionType::Rollback,
            description: "x".to_string(),
            payload: serde_json::Value::Null,
            status: ActionStatus::Failed,
            retry_count: 3,
            max_retries: 3,
            last_error: Some("store down".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(action.retries_exhausted());
    }
}
