use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderResult;

/// Event row shipped to the analytics backend on ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Unix milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

/// Interaction row shipped to the analytics backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsInteraction {
    pub user_id: String,
    pub event_id: String,
    pub action: String,
    pub weight: f32,
    /// Unix milliseconds
    pub timestamp: i64,
}

/// Trait for the external analytics sink
///
/// The returned value is the sink's acknowledgement body; the ingestion
/// orchestrator records it in compensation payloads for operator review.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn ingest_event(&self, event: &AnalyticsEvent) -> ProviderResult<Value>;

    async fn ingest_interaction(&self, interaction: &AnalyticsInteraction)
    -> ProviderResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_row_omits_absent_fields() {
        let event = AnalyticsEvent {
            id: "evt-1".to_string(),
            title: "Rust Meetup".to_string(),
            description: None,
            tags: vec!["rust".to_string()],
            host: None,
            category: None,
            location: None,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("description").is_none());
        assert!(value.get("host").is_none());
        assert_eq!(value["tags"][0], "rust");
    }
}
