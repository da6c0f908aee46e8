//! Builds the hybrid user vector the candidate query runs on.
//!
//! Four weighted sources feed the combination: the user's own interaction
//! history, an embedding of their explicitly selected tags, a collaborative
//! vector pooled from similar users, and an embedding of demographic text.
//! Every source degrades to [`Signal::NoSignal`] on its own; only the
//! surviving sources shape the result.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use domain_interactions::{Interaction, InteractionRepository};
use providers::{EmbeddingProvider, RecommendationCache, VectorIndex, embed_or_zero};
use tracing::{instrument, warn};

use crate::error::RecommendationResult;
use crate::signal::{Signal, combine_vectors};

/// Exponent applied per day of interaction age
const RECENCY_DECAY_PER_DAY: f32 = 0.1;

/// How many co-interacting users feed the collaborative vector
const SIMILAR_USERS_LIMIT: u64 = 5;

/// How many pooled like/click rows the collaborative vector reads
const POOLED_INTERACTIONS_LIMIT: u64 = 30;

const INTERACTION_WEIGHT: f32 = 0.5;
const TAG_WEIGHT: f32 = 0.3;
const COLLABORATIVE_WEIGHT: f32 = 0.2;
const DEMOGRAPHIC_WEIGHT: f32 = 0.1;

pub struct VectorComposer<R: InteractionRepository> {
    repository: Arc<R>,
    embeddings: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    cache: Arc<dyn RecommendationCache>,
}

impl<R: InteractionRepository> VectorComposer<R> {
    pub fn new(
        repository: Arc<R>,
        embeddings: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
        cache: Arc<dyn RecommendationCache>,
    ) -> Self {
        Self {
            repository,
            embeddings,
            vector_index,
            cache,
        }
    }

    /// Weighted, recency-decayed sum of the stored embeddings behind a set
    /// of interactions.
    ///
    /// Each row contributes its stored write-time weight scaled by
    /// `exp(-0.1 × age_days)`. Rows whose event has no stored vector are
    /// skipped; a zero accumulated weight is `NoSignal`.
    pub async fn build_interaction_vector(
        &self,
        interactions: &[Interaction],
    ) -> RecommendationResult<Signal> {
        if interactions.is_empty() {
            return Ok(Signal::NoSignal);
        }

        let mut ids: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for interaction in interactions {
            if seen.insert(interaction.event_id.as_str()) {
                ids.push(interaction.event_id.clone());
            }
        }

        let records = self.vector_index.fetch(&ids).await?;
        let by_id: HashMap<&str, &[f32]> = records
            .iter()
            .map(|record| (record.id.as_str(), record.vector.as_slice()))
            .collect();

        let dimensions = self.embeddings.dimensions();
        let mut sum = vec![0.0f32; dimensions];
        let mut total_weight = 0.0f32;
        let now = Utc::now();

        for interaction in interactions {
            let Some(vector) = by_id.get(interaction.event_id.as_str()) else {
                continue;
            };
            if vector.len() != dimensions {
                warn!(
                    event_id = %interaction.event_id,
                    "Skipping stored vector with unexpected dimensions"
                );
                continue;
            }

            let age_days = (now - interaction.created_at).num_seconds() as f32 / 86_400.0;
            let weight = interaction.weight * (-RECENCY_DECAY_PER_DAY * age_days).exp();
            total_weight += weight;
            for (acc, v) in sum.iter_mut().zip(vector.iter()) {
                *acc += v * weight;
            }
        }

        if total_weight == 0.0 {
            return Ok(Signal::NoSignal);
        }
        Ok(Signal::normalized(sum))
    }

    /// Interaction vector pooled from users who co-interacted with the
    /// target user.
    ///
    /// Up to five users sharing at least one liked or clicked event, ranked
    /// by overlap, contribute their 30 most recent likes and clicks.
    pub async fn collaborative_vector(&self, user_id: &str) -> RecommendationResult<Signal> {
        let similar = self
            .repository
            .similar_users(user_id, SIMILAR_USERS_LIMIT)
            .await?;
        if similar.is_empty() {
            return Ok(Signal::NoSignal);
        }

        let ids: Vec<String> = similar.into_iter().map(|user| user.user_id).collect();
        let pooled = self
            .repository
            .interactions_for_users(&ids, POOLED_INTERACTIONS_LIMIT)
            .await?;
        if pooled.is_empty() {
            return Ok(Signal::NoSignal);
        }

        self.build_interaction_vector(&pooled).await
    }

    /// Fan out to the four sources and combine with fixed weights.
    ///
    /// A failed source is logged and contributes `NoSignal`; retrieval must
    /// keep working with whatever signal remains, so this never returns an
    /// error.
    #[instrument(skip(self))]
    pub async fn hybrid_user_vector(&self, user_id: &str) -> Signal {
        let interaction = async {
            match self.own_interaction_vector(user_id).await {
                Ok(signal) => signal,
                Err(e) => {
                    warn!(error = %e, "Interaction vector unavailable");
                    Signal::NoSignal
                }
            }
        };

        let tags = async {
            match self.cache.user_tags(user_id).await {
                Ok(Some(tags)) if !tags.is_empty() => {
                    let text = tags.join(" ");
                    Signal::normalized(embed_or_zero(self.embeddings.as_ref(), &text).await)
                }
                Ok(_) => Signal::NoSignal,
                Err(e) => {
                    warn!(error = %e, "Selected tags unavailable");
                    Signal::NoSignal
                }
            }
        };

        let collaborative = async {
            match self.collaborative_vector(user_id).await {
                Ok(signal) => signal,
                Err(e) => {
                    warn!(error = %e, "Collaborative vector unavailable");
                    Signal::NoSignal
                }
            }
        };

        let demographics = async {
            match self.repository.user_profile(user_id).await {
                Ok(Some(profile)) => {
                    let text = profile.demographics_text();
                    if text.is_empty() {
                        Signal::NoSignal
                    } else {
                        Signal::normalized(embed_or_zero(self.embeddings.as_ref(), &text).await)
                    }
                }
                Ok(None) => Signal::NoSignal,
                Err(e) => {
                    warn!(error = %e, "Demographic profile unavailable");
                    Signal::NoSignal
                }
            }
        };

        let (interaction, tags, collaborative, demographics) =
            tokio::join!(interaction, tags, collaborative, demographics);

        combine_vectors(
            vec![
                (interaction, INTERACTION_WEIGHT),
                (tags, TAG_WEIGHT),
                (collaborative, COLLABORATIVE_WEIGHT),
                (demographics, DEMOGRAPHIC_WEIGHT),
            ],
            self.embeddings.dimensions(),
        )
    }

    async fn own_interaction_vector(&self, user_id: &str) -> RecommendationResult<Signal> {
        let interactions = self.repository.interactions_for_user(user_id).await?;
        self.build_interaction_vector(&interactions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain_interactions::{
        InteractionAction, MockInteractionRepository, SimilarUser, UserProfile,
    };
    use providers::{
        MockEmbeddingProvider, MockRecommendationCache, MockVectorIndex, VectorRecord,
    };
    use uuid::Uuid;

    const EPSILON: f32 = 1e-3;

    fn interaction(event_id: &str, action: InteractionAction, weight: f32, age_days: f32) -> Interaction {
        Interaction {
            id: Uuid::now_v7(),
            user_id: "user-1".to_string(),
            event_id: event_id.to_string(),
            action,
            weight,
            created_at: Utc::now() - Duration::seconds((age_days * 86_400.0) as i64),
        }
    }

    fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            vector,
            metadata: None,
        }
    }

    fn embedder(dimensions: usize) -> MockEmbeddingProvider {
        let mut embeddings = MockEmbeddingProvider::new();
        embeddings.expect_dimensions().return_const(dimensions);
        embeddings
    }

    fn composer(
        repository: MockInteractionRepository,
        embeddings: MockEmbeddingProvider,
        vector_index: MockVectorIndex,
        cache: MockRecommendationCache,
    ) -> VectorComposer<MockInteractionRepository> {
        VectorComposer::new(
            Arc::new(repository),
            Arc::new(embeddings),
            Arc::new(vector_index),
            Arc::new(cache),
        )
    }

    #[tokio::test]
    async fn test_interaction_vector_empty_history_is_no_signal() {
        let mut vector_index = MockVectorIndex::new();
        vector_index.expect_fetch().times(0);

        let composer = composer(
            MockInteractionRepository::new(),
            embedder(4),
            vector_index,
            MockRecommendationCache::new(),
        );

        let signal = composer.build_interaction_vector(&[]).await.unwrap();
        assert!(signal.is_no_signal());
    }

    #[tokio::test]
    async fn test_interaction_vector_weights_actions() {
        let mut vector_index = MockVectorIndex::new();
        vector_index.expect_fetch().returning(|_| {
            Ok(vec![
                record("evt-1", vec![1.0, 0.0, 0.0, 0.0]),
                record("evt-2", vec![0.0, 1.0, 0.0, 0.0]),
            ])
        });

        let composer = composer(
            MockInteractionRepository::new(),
            embedder(4),
            vector_index,
            MockRecommendationCache::new(),
        );

        let interactions = vec![
            interaction("evt-1", InteractionAction::Like, 2.0, 0.0),
            interaction("evt-2", InteractionAction::Click, 1.0, 0.0),
        ];
        let signal = composer
            .build_interaction_vector(&interactions)
            .await
            .unwrap();

        // sum ≈ [2, 1, 0, 0], normalized to [2/√5, 1/√5, 0, 0]
        let vector = signal.vector().unwrap();
        let expected = 5.0f32.sqrt();
        assert!((vector[0] - 2.0 / expected).abs() < EPSILON);
        assert!((vector[1] - 1.0 / expected).abs() < EPSILON);
        assert!((crate::signal::l2_norm(vector) - 1.0).abs() < EPSILON);
    }

    #[tokio::test]
    async fn test_interaction_vector_decays_with_age() {
        let mut vector_index = MockVectorIndex::new();
        vector_index.expect_fetch().returning(|_| {
            Ok(vec![
                record("evt-1", vec![1.0, 0.0]),
                record("evt-2", vec![0.0, 1.0]),
            ])
        });

        let composer = composer(
            MockInteractionRepository::new(),
            embedder(2),
            vector_index,
            MockRecommendationCache::new(),
        );

        let interactions = vec![
            interaction("evt-1", InteractionAction::View, 0.5, 0.0),
            interaction("evt-2", InteractionAction::View, 0.5, 10.0),
        ];
        let signal = composer
            .build_interaction_vector(&interactions)
            .await
            .unwrap();

        // The 10-day-old row is attenuated by e^(-1)
        let vector = signal.vector().unwrap();
        assert!(vector[0] > vector[1]);
        assert!((vector[1] / vector[0] - (-1.0f32).exp()).abs() < EPSILON);
    }

    #[tokio::test]
    async fn test_interaction_vector_fetches_each_event_once() {
        let mut vector_index = MockVectorIndex::new();
        vector_index
            .expect_fetch()
            .withf(|ids| ids == ["evt-1"])
            .times(1)
            .returning(|_| Ok(vec![record("evt-1", vec![0.0, 1.0])]));

        let composer = composer(
            MockInteractionRepository::new(),
            embedder(2),
            vector_index,
            MockRecommendationCache::new(),
        );

        let interactions = vec![
            interaction("evt-1", InteractionAction::Like, 2.0, 0.0),
            interaction("evt-1", InteractionAction::Click, 1.0, 0.0),
        ];
        let signal = composer
            .build_interaction_vector(&interactions)
            .await
            .unwrap();
        assert_eq!(signal.vector().unwrap()[1], 1.0);
    }

    #[tokio::test]
    async fn test_interaction_vector_zero_weight_rows_are_no_signal() {
        let mut vector_index = MockVectorIndex::new();
        vector_index
            .expect_fetch()
            .returning(|_| Ok(vec![record("evt-1", vec![1.0, 0.0])]));

        let composer = composer(
            MockInteractionRepository::new(),
            embedder(2),
            vector_index,
            MockRecommendationCache::new(),
        );

        let interactions = vec![interaction("evt-1", InteractionAction::Signup, 0.0, 0.0)];
        let signal = composer
            .build_interaction_vector(&interactions)
            .await
            .unwrap();
        assert!(signal.is_no_signal());
    }

    #[tokio::test]
    async fn test_interaction_vector_without_stored_vectors_is_no_signal() {
        let mut vector_index = MockVectorIndex::new();
        vector_index.expect_fetch().returning(|_| Ok(vec![]));

        let composer = composer(
            MockInteractionRepository::new(),
            embedder(2),
            vector_index,
            MockRecommendationCache::new(),
        );

        let interactions = vec![interaction("evt-1", InteractionAction::Like, 2.0, 0.0)];
        let signal = composer
            .build_interaction_vector(&interactions)
            .await
            .unwrap();
        assert!(signal.is_no_signal());
    }

    #[tokio::test]
    async fn test_collaborative_without_similar_users_is_no_signal() {
        let mut repository = MockInteractionRepository::new();
        repository.expect_similar_users().returning(|_, _| Ok(vec![]));
        repository.expect_interactions_for_users().times(0);

        let composer = composer(
            repository,
            embedder(2),
            MockVectorIndex::new(),
            MockRecommendationCache::new(),
        );

        let signal = composer.collaborative_vector("user-1").await.unwrap();
        assert!(signal.is_no_signal());
    }

    #[tokio::test]
    async fn test_collaborative_pools_similar_user_interactions() {
        let mut repository = MockInteractionRepository::new();
        repository.expect_similar_users().returning(|_, limit| {
            assert_eq!(limit, 5);
            Ok(vec![
                SimilarUser {
                    user_id: "user-2".to_string(),
                    common_interactions: 3,
                },
                SimilarUser {
                    user_id: "user-3".to_string(),
                    common_interactions: 1,
                },
            ])
        });
        repository
            .expect_interactions_for_users()
            .withf(|ids, limit| ids == ["user-2", "user-3"] && *limit == 30)
            .returning(|_, _| Ok(vec![interaction("evt-9", InteractionAction::Like, 2.0, 0.0)]));

        let mut vector_index = MockVectorIndex::new();
        vector_index
            .expect_fetch()
            .returning(|_| Ok(vec![record("evt-9", vec![0.0, 1.0])]));

        let composer = composer(
            repository,
            embedder(2),
            vector_index,
            MockRecommendationCache::new(),
        );

        let signal = composer.collaborative_vector("user-1").await.unwrap();
        assert_eq!(signal.vector().unwrap(), &[0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_hybrid_with_no_sources_is_no_signal() {
        let mut repository = MockInteractionRepository::new();
        repository
            .expect_interactions_for_user()
            .returning(|_| Ok(vec![]));
        repository.expect_similar_users().returning(|_, _| Ok(vec![]));
        repository.expect_user_profile().returning(|_| Ok(None));

        let mut cache = MockRecommendationCache::new();
        cache.expect_user_tags().returning(|_| Ok(None));

        let composer = composer(repository, embedder(4), MockVectorIndex::new(), cache);

        assert!(composer.hybrid_user_vector("user-1").await.is_no_signal());
    }

    #[tokio::test]
    async fn test_hybrid_survives_failed_interaction_source() {
        let mut repository = MockInteractionRepository::new();
        repository.expect_interactions_for_user().returning(|_| {
            Err(domain_interactions::InteractionError::Database(
                "connection reset".to_string(),
            ))
        });
        repository.expect_similar_users().returning(|_, _| Ok(vec![]));
        repository.expect_user_profile().returning(|_| Ok(None));

        let mut cache = MockRecommendationCache::new();
        cache
            .expect_user_tags()
            .returning(|_| Ok(Some(vec!["rust".to_string(), "music".to_string()])));

        let mut embeddings = embedder(4);
        embeddings
            .expect_embed()
            .withf(|text| text == "rust music")
            .returning(|_| Ok(vec![0.0, 1.0, 0.0, 0.0]));

        let composer = composer(repository, embeddings, MockVectorIndex::new(), cache);

        let signal = composer.hybrid_user_vector("user-1").await;
        assert_eq!(signal.vector().unwrap(), &[0.0, 1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_hybrid_weights_interaction_over_tags() {
        let mut repository = MockInteractionRepository::new();
        repository
            .expect_interactions_for_user()
            .returning(|_| Ok(vec![interaction("evt-1", InteractionAction::Like, 2.0, 0.0)]));
        repository.expect_similar_users().returning(|_, _| Ok(vec![]));
        repository.expect_user_profile().returning(|_| Ok(None));

        let mut cache = MockRecommendationCache::new();
        cache
            .expect_user_tags()
            .returning(|_| Ok(Some(vec!["techno".to_string()])));

        let mut embeddings = embedder(2);
        embeddings
            .expect_embed()
            .returning(|_| Ok(vec![0.0, 1.0]));

        let mut vector_index = MockVectorIndex::new();
        vector_index
            .expect_fetch()
            .returning(|_| Ok(vec![record("evt-1", vec![1.0, 0.0])]));

        let composer = composer(repository, embeddings, vector_index, cache);

        // interaction axis carries weight 0.5, tags axis 0.3
        let signal = composer.hybrid_user_vector("user-1").await;
        let vector = signal.vector().unwrap().to_vec();
        assert!((vector[0] / vector[1] - 0.5 / 0.3).abs() < EPSILON);
        assert!((crate::signal::l2_norm(&vector) - 1.0).abs() < EPSILON);
    }

    #[tokio::test]
    async fn test_hybrid_reads_demographics_text() {
        let mut repository = MockInteractionRepository::new();
        repository
            .expect_interactions_for_user()
            .returning(|_| Ok(vec![]));
        repository.expect_similar_users().returning(|_, _| Ok(vec![]));
        repository.expect_user_profile().returning(|_| {
            Ok(Some(UserProfile {
                user_id: "user-1".to_string(),
                country: Some("Portugal".to_string()),
                interests: vec!["jazz".to_string()],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let mut cache = MockRecommendationCache::new();
        cache.expect_user_tags().returning(|_| Ok(None));

        let mut embeddings = embedder(2);
        embeddings
            .expect_embed()
            .withf(|text| text == "Portugal jazz")
            .times(1)
            .returning(|_| Ok(vec![1.0, 0.0]));

        let composer = composer(repository, embeddings, MockVectorIndex::new(), cache);

        let signal = composer.hybrid_user_vector("user-1").await;
        assert_eq!(signal.vector().unwrap(), &[1.0, 0.0]);
    }
}
