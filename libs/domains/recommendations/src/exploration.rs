//! Exploration rate, candidate sources, and injection.
//!
//! The injector and the serendipity vector draw from a caller-supplied RNG,
//! so a seeded generator reproduces a run exactly.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use domain_interactions::InteractionRepository;
use providers::{RecommendationCache, VectorIndex};
use rand::Rng;
use tracing::warn;

use crate::models::{EnrichedRecommendation, ExplorationItem, ExplorationType};
use crate::signal::l2_normalize;

/// Ranked positions where exploration items may be spliced in
pub const INJECTION_SLOTS: [usize; 3] = [2, 5, 8];

/// Rate used when interaction stats cannot be read
pub const BASE_RATE: f32 = 0.4;

const MIN_RATE: f32 = 0.1;
const MAX_RATE: f32 = 0.6;
const RATE_DECAY_PER_INTERACTION: f32 = 0.01;
const LOW_ENGAGEMENT_THRESHOLD: f32 = 0.3;
const LOW_ENGAGEMENT_MULTIPLIER: f32 = 2.0;

const TRENDING_WINDOW_DAYS: i64 = 3;
const SERENDIPITY_CONFIDENCE: f32 = 0.5;
const ANTI_CORRELATED_MIN_CONFIDENCE: f32 = 0.3;

/// Per-user exploration rate in `[0.1, 0.6]`.
///
/// Decays with interaction count so power users get a narrow list, and
/// doubles for users whose recent engagement dropped below threshold.
pub fn exploration_rate(interaction_count: u64, engagement_rate: f32) -> f32 {
    let base = (BASE_RATE - RATE_DECAY_PER_INTERACTION * interaction_count as f32).max(MIN_RATE);
    if engagement_rate < LOW_ENGAGEMENT_THRESHOLD {
        (base * LOW_ENGAGEMENT_MULTIPLIER).min(MAX_RATE)
    } else {
        base
    }
}

/// Splice exploration items into a ranked list.
///
/// Each fixed slot admits the next unused item with probability `rate`.
/// Purely additive: every input item survives in its original relative
/// order, and an empty item pool returns the input unchanged.
pub fn inject_exploration<G: Rng>(
    main: Vec<EnrichedRecommendation>,
    items: &[ExplorationItem],
    rate: f32,
    rng: &mut G,
) -> Vec<EnrichedRecommendation> {
    if items.is_empty() {
        return main;
    }

    let mut result = main;
    let mut next_item = 0;

    for slot in INJECTION_SLOTS {
        if slot < result.len() && next_item < items.len() && rng.random_bool(rate as f64) {
            let item = &items[next_item];
            result.insert(
                slot,
                EnrichedRecommendation {
                    event_id: item.event_id.clone(),
                    score: item.score,
                    diversified: true,
                },
            );
            next_item += 1;
        }
    }

    result
}

/// Uniformly drawn direction used for serendipity queries
pub fn random_unit_vector<G: Rng>(dimensions: usize, rng: &mut G) -> Vec<f32> {
    let mut vector: Vec<f32> = (0..dimensions)
        .map(|_| rng.random_range(-1.0f32..1.0))
        .collect();
    l2_normalize(&mut vector);
    vector
}

/// The three exploration candidate generators.
///
/// Each swallows its own failures and returns an empty pool; exploration is
/// garnish, never a reason to fail a request.
pub struct ExplorationSources<R: InteractionRepository> {
    repository: Arc<R>,
    vector_index: Arc<dyn VectorIndex>,
    cache: Arc<dyn RecommendationCache>,
}

impl<R: InteractionRepository> ExplorationSources<R> {
    pub fn new(
        repository: Arc<R>,
        vector_index: Arc<dyn VectorIndex>,
        cache: Arc<dyn RecommendationCache>,
    ) -> Self {
        Self {
            repository,
            vector_index,
            cache,
        }
    }

    /// Items dissimilar to the user's known preference, found by querying
    /// with the negated user vector
    pub async fn anti_correlated(&self, user_vector: &[f32], limit: usize) -> Vec<ExplorationItem> {
        let inverted: Vec<f32> = user_vector.iter().map(|v| -v).collect();

        match self.vector_index.query(&inverted, limit * 2, true).await {
            Ok(matches) => matches
                .into_iter()
                .take(limit)
                .map(|hit| ExplorationItem {
                    event_id: hit.id,
                    score: hit.score,
                    exploration_type: ExplorationType::AntiCorrelated,
                    confidence: (1.0 - hit.score).max(ANTI_CORRELATED_MIN_CONFIDENCE),
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Anti-correlated query failed");
                Vec::new()
            }
        }
    }

    /// Recently popular events ranked by engagement over a 3-day window
    pub async fn trending(&self, limit: usize) -> Vec<ExplorationItem> {
        let window = Duration::days(TRENDING_WINDOW_DAYS);
        match self.repository.trending_events(window, limit as u64).await {
            Ok(rows) => rows
                .into_iter()
                .map(|row| ExplorationItem {
                    event_id: row.event_id,
                    score: row.engagement_rate as f32,
                    exploration_type: ExplorationType::Trending,
                    confidence: (row.interaction_count as f32 / 100.0).min(1.0),
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Trending query failed");
                Vec::new()
            }
        }
    }

    /// Events in a random direction, excluding the user's selected tags
    pub async fn serendipity<G: Rng + Send>(
        &self,
        user_id: &str,
        dimensions: usize,
        limit: usize,
        rng: &mut G,
    ) -> Vec<ExplorationItem> {
        let probe = random_unit_vector(dimensions, rng);

        let selected: HashSet<String> = match self.cache.user_tags(user_id).await {
            Ok(Some(tags)) => tags.into_iter().collect(),
            Ok(None) => HashSet::new(),
            Err(e) => {
                warn!(error = %e, "Selected tags unavailable, skipping exclusion");
                HashSet::new()
            }
        };

        match self.vector_index.query(&probe, limit * 2, true).await {
            Ok(matches) => matches
                .into_iter()
                .filter(|hit| {
                    hit.metadata.as_ref().is_none_or(|metadata| {
                        !metadata.tags.iter().any(|tag| selected.contains(tag))
                    })
                })
                .take(limit)
                .map(|hit| ExplorationItem {
                    event_id: hit.id,
                    score: hit.score,
                    exploration_type: ExplorationType::Serendipity,
                    confidence: SERENDIPITY_CONFIDENCE,
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Serendipity query failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_interactions::{InteractionError, MockInteractionRepository, TrendingEvent};
    use providers::{MockRecommendationCache, MockVectorIndex, VectorMatch, VectorMetadata};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rec(event_id: &str, score: f32) -> EnrichedRecommendation {
        EnrichedRecommendation {
            event_id: event_id.to_string(),
            score,
            diversified: false,
        }
    }

    fn item(event_id: &str) -> ExplorationItem {
        ExplorationItem {
            event_id: event_id.to_string(),
            score: 0.2,
            exploration_type: ExplorationType::Trending,
            confidence: 0.5,
        }
    }

    fn hit(id: &str, score: f32, tags: &[&str]) -> VectorMatch {
        VectorMatch {
            id: id.to_string(),
            score,
            metadata: Some(VectorMetadata {
                title: format!("Event {id}"),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..VectorMetadata::default()
            }),
        }
    }

    #[test]
    fn test_rate_stays_within_bounds() {
        for count in [0u64, 1, 10, 25, 40, 100, 10_000] {
            for engagement in [0.0f32, 0.1, 0.29, 0.3, 0.5, 1.0] {
                let rate = exploration_rate(count, engagement);
                assert!((0.1..=0.6).contains(&rate), "rate {rate} out of bounds");
            }
        }
    }

    #[test]
    fn test_new_disengaged_user_gets_maximum_exploration() {
        assert_eq!(exploration_rate(0, 0.0), 0.6);
    }

    #[test]
    fn test_engaged_power_user_gets_minimum_exploration() {
        assert_eq!(exploration_rate(40, 0.5), 0.1);
        assert_eq!(exploration_rate(500, 0.9), 0.1);
    }

    #[test]
    fn test_low_engagement_doubles_base_rate() {
        let rate = exploration_rate(20, 0.1);
        assert!((rate - 0.4).abs() < 1e-6);

        let undoubled = exploration_rate(20, 0.3);
        assert!((undoubled - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_injection_with_empty_pool_is_identity() {
        let main = vec![rec("evt-1", 0.9), rec("evt-2", 0.8), rec("evt-3", 0.7)];
        let mut rng = StdRng::seed_from_u64(7);

        let result = inject_exploration(main.clone(), &[], 1.0, &mut rng);
        assert_eq!(result, main);
    }

    #[test]
    fn test_injection_fills_all_slots_at_rate_one() {
        let main: Vec<EnrichedRecommendation> =
            (0..10).map(|i| rec(&format!("evt-{i}"), 0.9)).collect();
        let items = [item("exp-1"), item("exp-2"), item("exp-3")];
        let mut rng = StdRng::seed_from_u64(7);

        let result = inject_exploration(main.clone(), &items, 1.0, &mut rng);

        assert_eq!(result.len(), 13);
        for (slot, expected) in INJECTION_SLOTS.iter().zip(["exp-1", "exp-2", "exp-3"]) {
            assert_eq!(result[*slot].event_id, expected);
            assert!(result[*slot].diversified);
        }

        // Original items keep their relative order
        let kept: Vec<&str> = result
            .iter()
            .filter(|r| !r.diversified)
            .map(|r| r.event_id.as_str())
            .collect();
        let original: Vec<&str> = main.iter().map(|r| r.event_id.as_str()).collect();
        assert_eq!(kept, original);
    }

    #[test]
    fn test_injection_skips_slots_beyond_list_length() {
        let main = vec![rec("evt-1", 0.9), rec("evt-2", 0.8)];
        let items = [item("exp-1")];
        let mut rng = StdRng::seed_from_u64(7);

        // Highest slot is index 2; a two-item list has no eligible slot
        let result = inject_exploration(main.clone(), &items, 1.0, &mut rng);
        assert_eq!(result, main);

        let three = vec![rec("evt-1", 0.9), rec("evt-2", 0.8), rec("evt-3", 0.7)];
        let result = inject_exploration(three, &items, 1.0, &mut rng);
        assert_eq!(result.len(), 4);
        assert_eq!(result[2].event_id, "exp-1");
    }

    #[test]
    fn test_injection_is_deterministic_under_a_seed() {
        let main: Vec<EnrichedRecommendation> =
            (0..12).map(|i| rec(&format!("evt-{i}"), 0.5)).collect();
        let items = [item("exp-1"), item("exp-2"), item("exp-3")];

        let mut first_rng = StdRng::seed_from_u64(99);
        let mut second_rng = StdRng::seed_from_u64(99);

        let first = inject_exploration(main.clone(), &items, 0.5, &mut first_rng);
        let second = inject_exploration(main, &items, 0.5, &mut second_rng);
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_unit_vector_is_normalized_and_seeded() {
        let mut rng = StdRng::seed_from_u64(3);
        let vector = random_unit_vector(64, &mut rng);
        assert_eq!(vector.len(), 64);

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);

        let mut replay = StdRng::seed_from_u64(3);
        assert_eq!(random_unit_vector(64, &mut replay), vector);
    }

    fn sources(
        repository: MockInteractionRepository,
        vector_index: MockVectorIndex,
        cache: MockRecommendationCache,
    ) -> ExplorationSources<MockInteractionRepository> {
        ExplorationSources::new(Arc::new(repository), Arc::new(vector_index), Arc::new(cache))
    }

    #[tokio::test]
    async fn test_anti_correlated_negates_the_user_vector() {
        let mut vector_index = MockVectorIndex::new();
        vector_index
            .expect_query()
            .withf(|vector, top_k, include_metadata| {
                vector == [-0.6, 0.8] && *top_k == 4 && *include_metadata
            })
            .returning(|_, _, _| {
                Ok(vec![
                    hit("evt-1", 0.9, &[]),
                    hit("evt-2", 0.4, &[]),
                    hit("evt-3", 0.3, &[]),
                ])
            });

        let sources = sources(
            MockInteractionRepository::new(),
            vector_index,
            MockRecommendationCache::new(),
        );

        let items = sources.anti_correlated(&[0.6, -0.8], 2).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].event_id, "evt-1");
        assert_eq!(items[0].exploration_type, ExplorationType::AntiCorrelated);
        // Confidence floors at 0.3 for close matches, grows for distant ones
        assert_eq!(items[0].confidence, 0.3);
        assert!((items[1].confidence - 0.6).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_anti_correlated_swallows_index_errors() {
        let mut vector_index = MockVectorIndex::new();
        vector_index.expect_query().returning(|_, _, _| {
            Err(providers::ProviderError::ApiError("503".to_string()))
        });

        let sources = sources(
            MockInteractionRepository::new(),
            vector_index,
            MockRecommendationCache::new(),
        );

        assert!(sources.anti_correlated(&[1.0], 2).await.is_empty());
    }

    #[tokio::test]
    async fn test_trending_maps_engagement_to_scores() {
        let mut repository = MockInteractionRepository::new();
        repository
            .expect_trending_events()
            .withf(|window, limit| *window == Duration::days(3) && *limit == 2)
            .returning(|_, _| {
                Ok(vec![
                    TrendingEvent {
                        event_id: "evt-1".to_string(),
                        interaction_count: 250,
                        engagement_rate: 0.75,
                    },
                    TrendingEvent {
                        event_id: "evt-2".to_string(),
                        interaction_count: 30,
                        engagement_rate: 0.5,
                    },
                ])
            });

        let sources = sources(
            repository,
            MockVectorIndex::new(),
            MockRecommendationCache::new(),
        );

        let items = sources.trending(2).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].score, 0.75);
        assert_eq!(items[0].confidence, 1.0);
        assert!((items[1].confidence - 0.3).abs() < 1e-6);
        assert_eq!(items[1].exploration_type, ExplorationType::Trending);
    }

    #[tokio::test]
    async fn test_trending_swallows_database_errors() {
        let mut repository = MockInteractionRepository::new();
        repository
            .expect_trending_events()
            .returning(|_, _| Err(InteractionError::Database("timeout".to_string())));

        let sources = sources(
            repository,
            MockVectorIndex::new(),
            MockRecommendationCache::new(),
        );

        assert!(sources.trending(5).await.is_empty());
    }

    #[tokio::test]
    async fn test_serendipity_excludes_selected_tags() {
        let mut cache = MockRecommendationCache::new();
        cache
            .expect_user_tags()
            .returning(|_| Ok(Some(vec!["tech".to_string()])));

        let mut vector_index = MockVectorIndex::new();
        vector_index
            .expect_query()
            .withf(|_, top_k, _| *top_k == 4)
            .returning(|_, _, _| {
                Ok(vec![
                    hit("evt-1", 0.5, &["tech", "ai"]),
                    hit("evt-2", 0.4, &["music"]),
                    VectorMatch {
                        id: "evt-3".to_string(),
                        score: 0.3,
                        metadata: None,
                    },
                ])
            });

        let sources = sources(MockInteractionRepository::new(), vector_index, cache);

        let mut rng = StdRng::seed_from_u64(11);
        let items = sources.serendipity("user-1", 8, 2, &mut rng).await;

        let ids: Vec<&str> = items.iter().map(|i| i.event_id.as_str()).collect();
        assert_eq!(ids, ["evt-2", "evt-3"]);
        assert!(items.iter().all(|i| i.confidence == 0.5));
        assert!(
            items
                .iter()
                .all(|i| i.exploration_type == ExplorationType::Serendipity)
        );
    }

    #[tokio::test]
    async fn test_serendipity_swallows_index_errors() {
        let mut cache = MockRecommendationCache::new();
        cache.expect_user_tags().returning(|_| Ok(None));

        let mut vector_index = MockVectorIndex::new();
        vector_index.expect_query().returning(|_, _, _| {
            Err(providers::ProviderError::ApiError("503".to_string()))
        });

        let sources = sources(MockInteractionRepository::new(), vector_index, cache);

        let mut rng = StdRng::seed_from_u64(11);
        assert!(sources.serendipity("user-1", 8, 2, &mut rng).await.is_empty());
    }
}
