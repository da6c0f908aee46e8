use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use validator::Validate;

/// DTO for the ingest-event endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, TS)]
#[ts(export)]
pub struct IngestEvent {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub tags: Vec<String>,
    pub host: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl IngestEvent {
    /// Text handed to the embedding API.
    ///
    /// Title, description, tags, then the host clause; absent segments are
    /// left out entirely.
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.title.clone()];
        if let Some(description) = &self.description {
            parts.push(description.clone());
        }
        parts.push(self.tags.join(" "));
        if let Some(host) = &self.host {
            parts.push(format!("hosted by {host}"));
        }
        parts.join(" ")
    }
}

/// Response for a fully ingested event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct IngestEventResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "unknown")]
    pub tinybird_response: Option<serde_json::Value>,
}

/// Relational event row.
///
/// The embedding and the tags live in the vector index; this row carries the
/// attributes other services join on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub host: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting one event row
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub id: String,
    pub title: String,
    pub host: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl From<&IngestEvent> for NewEvent {
    fn from(input: &IngestEvent) -> Self {
        Self {
            id: input.id.clone(),
            title: input.title.clone(),
            host: input.host.clone(),
            category: input.category.clone(),
            location: input.location.clone(),
        }
    }
}
