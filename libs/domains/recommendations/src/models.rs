use serde::{Deserialize, Serialize};
use strum::Display;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

/// One ranked item as served to clients and stored in the cache.
///
/// `diversified` marks items placed by the diversification tail or the
/// exploration injector rather than raw similarity rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct EnrichedRecommendation {
    pub event_id: String,
    pub score: f32,
    pub diversified: bool,
}

/// Where an exploration candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExplorationType {
    AntiCorrelated,
    Trending,
    Serendipity,
    Temporal,
}

/// Candidate considered for injection, never returned directly
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationItem {
    pub event_id: String,
    pub score: f32,
    pub exploration_type: ExplorationType,
    pub confidence: f32,
}

/// Per-request facts about how the list was produced.
///
/// Always computed live, even when the recommendation list itself came from
/// the cache.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct RecommendationMetadata {
    pub user_id: String,
    /// Number of items in the response
    pub count: usize,
    /// Set to `"trending"` when the user had no signal to personalize on
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub fallback: Option<String>,
    pub ab_group: String,
    pub exploration_rate: f32,
    /// Candidate count after tag filtering, before slicing
    pub total_candidates: usize,
    pub cached: bool,
}

/// Response for the get-recommendations endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<EnrichedRecommendation>,
    pub metadata: RecommendationMetadata,
}

/// One semantic search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct SearchResult {
    pub event_id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub score: f32,
}

/// Response for the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// Query parameters for the search endpoint
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct SearchQuery {
    /// Free-text search query
    #[serde(default)]
    pub query: String,
}

/// Tunables for the request-time pipeline.
///
/// Injected through the service constructor so tests and deployments can
/// vary pool sizes without touching call sites.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    /// Candidate pool for group A (diversification applied)
    pub top_k_group_a: usize,
    /// Candidate pool for group B (plain ranked slice)
    pub top_k_group_b: usize,
    /// Candidate pool for ad-hoc search
    pub search_top_k: usize,
    /// Maximum items returned when diversification is skipped
    pub response_limit: usize,
    /// Minimum candidates before the head/tail split applies
    pub diversify_min_candidates: usize,
    /// Top-ranked items kept as-is by diversification
    pub diversify_head: usize,
    /// Lowest-ranked items surfaced by diversification
    pub diversify_tail: usize,
    /// Share of the candidate count pulled as exploration items
    pub exploration_share: f32,
    /// Floor on the exploration pool size when the share rounds low
    pub exploration_min_items: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            top_k_group_a: 40,
            top_k_group_b: 50,
            search_top_k: 20,
            response_limit: 15,
            diversify_min_candidates: 10,
            diversify_head: 8,
            diversify_tail: 2,
            exploration_share: 0.15,
            exploration_min_items: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exploration_type_labels() {
        assert_eq!(ExplorationType::AntiCorrelated.to_string(), "anti_correlated");
        assert_eq!(ExplorationType::Trending.to_string(), "trending");
        assert_eq!(ExplorationType::Serendipity.to_string(), "serendipity");
        assert_eq!(ExplorationType::Temporal.to_string(), "temporal");
    }

    #[test]
    fn test_metadata_omits_absent_fallback() {
        let metadata = RecommendationMetadata {
            user_id: "u1".to_string(),
            count: 2,
            fallback: None,
            ab_group: "A".to_string(),
            exploration_rate: 0.4,
            total_candidates: 12,
            cached: false,
        };

        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value.get("fallback").is_none());
        assert_eq!(value["ab_group"], "A");
    }

    #[test]
    fn test_recommendation_round_trips_through_cache_payload() {
        let items = vec![
            EnrichedRecommendation {
                event_id: "evt-1".to_string(),
                score: 0.91,
                diversified: false,
            },
            EnrichedRecommendation {
                event_id: "evt-2".to_string(),
                score: 0.12,
                diversified: true,
            },
        ];

        let payload = serde_json::to_string(&items).unwrap();
        let parsed: Vec<EnrichedRecommendation> = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed, items);
    }
}
