use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

/// Metadata stored alongside each event vector.
///
/// Optional event fields are stored as empty strings rather than omitted so
/// downstream readers always see the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
}

/// A stored vector with its id and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VectorMetadata>,
}

/// A similarity-search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<VectorMetadata>,
}

/// Trait for the vector index the engine queries and writes
///
/// Query scores are cosine similarity in `[0, 1]`, highest first.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace vectors by id
    async fn upsert(&self, records: &[VectorRecord]) -> ProviderResult<()>;

    /// Similarity search against the index
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> ProviderResult<Vec<VectorMatch>>;

    /// Fetch stored vectors by id; missing ids are absent from the result
    async fn fetch(&self, ids: &[String]) -> ProviderResult<Vec<VectorRecord>>;

    /// Delete vectors by id
    async fn delete(&self, ids: &[String]) -> ProviderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults_on_partial_payload() {
        let metadata: VectorMetadata = serde_json::from_str(r#"{"title":"Rust Meetup"}"#).unwrap();
        assert_eq!(metadata.title, "Rust Meetup");
        assert!(metadata.tags.is_empty());
        assert_eq!(metadata.host, "");
        assert_eq!(metadata.category, "");
        assert_eq!(metadata.location, "");
    }

    #[test]
    fn test_record_omits_missing_metadata() {
        let record = VectorRecord {
            id: "evt-1".to_string(),
            vector: vec![0.1, 0.2],
            metadata: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("metadata").is_none());
    }
}
