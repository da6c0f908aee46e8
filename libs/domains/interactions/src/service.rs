use std::sync::Arc;

use observability::IngestionMetrics;
use providers::{AnalyticsInteraction, AnalyticsSink, RecommendationCache};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::error::{InteractionError, InteractionResult};
use crate::models::{
    ActionWeights, InteractionAction, LogInteraction, LogInteractionResponse, NewInteraction,
    SIGNUP_SENTINEL_EVENT_ID,
};
use crate::repository::InteractionRepository;

/// Service layer for the interaction write path
///
/// Coordinates the relational insert with cache invalidation and a
/// non-blocking forward to the analytics sink.
#[derive(Clone)]
pub struct InteractionService<R: InteractionRepository> {
    repository: Arc<R>,
    cache: Arc<dyn RecommendationCache>,
    analytics: Arc<dyn AnalyticsSink>,
    weights: ActionWeights,
}

impl<R: InteractionRepository> InteractionService<R> {
    pub fn new(
        repository: R,
        cache: Arc<dyn RecommendationCache>,
        analytics: Arc<dyn AnalyticsSink>,
        weights: ActionWeights,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            cache,
            analytics,
            weights,
        }
    }

    /// Record one interaction with validation
    ///
    /// A user's first-ever interaction is preceded by a synthetic signup
    /// row so downstream aggregates can distinguish "new user" from
    /// "no rows yet". Logging an interaction invalidates the user's cached
    /// recommendations; `select_tags` additionally caches the tag list.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, action = %input.action))]
    pub async fn log_interaction(
        &self,
        input: LogInteraction,
    ) -> InteractionResult<LogInteractionResponse> {
        input
            .validate()
            .map_err(|e| InteractionError::Validation(e.to_string()))?;

        if input.missing_selected_tags() {
            return Err(InteractionError::Validation(
                "Tags array must be provided and non-empty for 'select_tags' action".to_string(),
            ));
        }

        if !self.repository.user_exists(&input.user_id).await? {
            self.repository
                .insert(NewInteraction {
                    user_id: input.user_id.clone(),
                    event_id: SIGNUP_SENTINEL_EVENT_ID.to_string(),
                    action: InteractionAction::Signup,
                    weight: self.weights.for_action(InteractionAction::Signup),
                })
                .await?;
            info!(user_id = %input.user_id, "First interaction, recorded signup row");
        }

        let interaction = self
            .repository
            .insert(NewInteraction {
                user_id: input.user_id.clone(),
                event_id: input.event_id.clone(),
                action: input.action,
                weight: self.weights.for_action(input.action),
            })
            .await?;

        if input.action == InteractionAction::SelectTags {
            if let Some(tags) = &input.tags {
                self.cache.store_user_tags(&input.user_id, tags).await?;
            }
        }

        // Stale recommendations are worse than a recompute
        self.cache
            .invalidate_recommendations(&input.user_id)
            .await?;

        // Forward to the analytics sink off the response path (non-blocking,
        // log errors)
        let analytics = Arc::clone(&self.analytics);
        let row = AnalyticsInteraction {
            user_id: interaction.user_id.clone(),
            event_id: interaction.event_id.clone(),
            action: interaction.action.to_string(),
            weight: interaction.weight,
            timestamp: interaction.created_at.timestamp_millis(),
        };
        tokio::spawn(async move {
            if let Err(e) = analytics.ingest_interaction(&row).await {
                warn!(error = %e, "Failed to forward interaction to analytics sink");
            }
        });

        IngestionMetrics::record_interaction(&input.action.to_string());

        Ok(LogInteractionResponse {
            success: true,
            message: format!("Interaction logged for user {}", input.user_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interaction;
    use crate::repository::MockInteractionRepository;
    use chrono::Utc;
    use providers::{MockAnalyticsSink, MockRecommendationCache};
    use uuid::Uuid;

    fn stored(input: &NewInteraction) -> Interaction {
        Interaction {
            id: Uuid::now_v7(),
            user_id: input.user_id.clone(),
            event_id: input.event_id.clone(),
            action: input.action,
            weight: input.weight,
            created_at: Utc::now(),
        }
    }

    fn quiet_cache() -> MockRecommendationCache {
        let mut cache = MockRecommendationCache::new();
        cache
            .expect_invalidate_recommendations()
            .returning(|_| Ok(()));
        cache
    }

    fn quiet_analytics() -> MockAnalyticsSink {
        let mut analytics = MockAnalyticsSink::new();
        analytics
            .expect_ingest_interaction()
            .times(0..=1)
            .returning(|_| Ok(serde_json::json!({"successful_rows": 1})));
        analytics
    }

    fn like_input() -> LogInteraction {
        LogInteraction {
            user_id: "user-1".to_string(),
            event_id: "evt-1".to_string(),
            action: InteractionAction::Like,
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_log_interaction_for_known_user() {
        let mut repo = MockInteractionRepository::new();
        repo.expect_user_exists().returning(|_| Ok(true));
        repo.expect_insert()
            .withf(|input| {
                input.action == InteractionAction::Like
                    && input.weight == 2.0
                    && input.event_id == "evt-1"
            })
            .times(1)
            .returning(|input| Ok(stored(&input)));

        let service = InteractionService::new(
            repo,
            Arc::new(quiet_cache()),
            Arc::new(quiet_analytics()),
            ActionWeights::default(),
        );

        let response = service.log_interaction(like_input()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message, "Interaction logged for user user-1");
    }

    #[tokio::test]
    async fn test_first_interaction_records_signup_row() {
        let mut repo = MockInteractionRepository::new();
        repo.expect_user_exists().returning(|_| Ok(false));
        repo.expect_insert()
            .withf(|input| {
                input.action == InteractionAction::Signup
                    && input.event_id == SIGNUP_SENTINEL_EVENT_ID
                    && input.weight == 0.0
            })
            .times(1)
            .returning(|input| Ok(stored(&input)));
        repo.expect_insert()
            .withf(|input| input.action == InteractionAction::Like)
            .times(1)
            .returning(|input| Ok(stored(&input)));

        let service = InteractionService::new(
            repo,
            Arc::new(quiet_cache()),
            Arc::new(quiet_analytics()),
            ActionWeights::default(),
        );

        let response = service.log_interaction(like_input()).await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_select_tags_caches_tag_list() {
        let mut repo = MockInteractionRepository::new();
        repo.expect_user_exists().returning(|_| Ok(true));
        repo.expect_insert()
            .withf(|input| {
                input.action == InteractionAction::SelectTags && input.weight == 5.0
            })
            .times(1)
            .returning(|input| Ok(stored(&input)));

        let mut cache = MockRecommendationCache::new();
        cache
            .expect_store_user_tags()
            .withf(|user_id, tags| user_id == "user-1" && tags == ["music", "tech"])
            .times(1)
            .returning(|_, _| Ok(()));
        cache
            .expect_invalidate_recommendations()
            .withf(|user_id| user_id == "user-1")
            .times(1)
            .returning(|_| Ok(()));

        let service = InteractionService::new(
            repo,
            Arc::new(cache),
            Arc::new(quiet_analytics()),
            ActionWeights::default(),
        );

        let input = LogInteraction {
            user_id: "user-1".to_string(),
            event_id: "evt-1".to_string(),
            action: InteractionAction::SelectTags,
            tags: Some(vec!["music".to_string(), "tech".to_string()]),
        };
        service.log_interaction(input).await.unwrap();
    }

    #[tokio::test]
    async fn test_select_tags_without_tags_is_rejected() {
        let repo = MockInteractionRepository::new();
        let service = InteractionService::new(
            repo,
            Arc::new(MockRecommendationCache::new()),
            Arc::new(MockAnalyticsSink::new()),
            ActionWeights::default(),
        );

        let input = LogInteraction {
            user_id: "user-1".to_string(),
            event_id: "evt-1".to_string(),
            action: InteractionAction::SelectTags,
            tags: Some(vec![]),
        };
        let err = service.log_interaction(input).await.unwrap_err();
        match err {
            InteractionError::Validation(msg) => {
                assert!(msg.contains("select_tags"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_user_id_is_rejected() {
        let repo = MockInteractionRepository::new();
        let service = InteractionService::new(
            repo,
            Arc::new(MockRecommendationCache::new()),
            Arc::new(MockAnalyticsSink::new()),
            ActionWeights::default(),
        );

        let input = LogInteraction {
            user_id: String::new(),
            event_id: "evt-1".to_string(),
            action: InteractionAction::View,
            tags: None,
        };
        assert!(service.log_interaction(input).await.is_err());
    }
}
