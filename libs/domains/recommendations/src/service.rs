//! Request-time orchestration for personalized recommendations and search.
//!
//! The read path degrades rather than fails: cache problems, missing stats,
//! and empty exploration pools all fall through to whatever can still be
//! served. Only input validation and an exhausted-retry candidate query
//! surface as errors.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;
use database::common::retry;
use domain_interactions::InteractionRepository;
use observability::RecommendationMetrics;
use providers::{
    EmbeddingProvider, RecommendationCache, VectorIndex, VectorMatch, content_hash, embed_or_zero,
    is_zero_vector,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::abtest;
use crate::composer::VectorComposer;
use crate::error::{RecommendationError, RecommendationResult};
use crate::exploration::{self, BASE_RATE, ExplorationSources, exploration_rate};
use crate::models::{
    EnrichedRecommendation, ExplorationItem, RecommendationConfig, RecommendationMetadata,
    RecommendationsResponse, SearchResponse, SearchResult,
};
use crate::signal::Signal;

/// Window the per-user engagement rate is computed over
const ENGAGEMENT_WINDOW_DAYS: i64 = 7;

pub struct RecommendationService<R: InteractionRepository> {
    repository: Arc<R>,
    composer: VectorComposer<R>,
    sources: ExplorationSources<R>,
    vector_index: Arc<dyn VectorIndex>,
    embeddings: Arc<dyn EmbeddingProvider>,
    cache: Arc<dyn RecommendationCache>,
    config: RecommendationConfig,
}

impl<R: InteractionRepository> RecommendationService<R> {
    pub fn new(
        repository: Arc<R>,
        embeddings: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
        cache: Arc<dyn RecommendationCache>,
        config: RecommendationConfig,
    ) -> Self {
        let composer = VectorComposer::new(
            repository.clone(),
            embeddings.clone(),
            vector_index.clone(),
            cache.clone(),
        );
        let sources =
            ExplorationSources::new(repository.clone(), vector_index.clone(), cache.clone());
        Self {
            repository,
            composer,
            sources,
            vector_index,
            embeddings,
            cache,
            config,
        }
    }

    /// Serve a user's ranked event list.
    ///
    /// Cached lists are returned as-is; everything else runs the full
    /// pipeline: hybrid vector, candidate query, tag filter, diversification,
    /// exploration injection, cache write. Metadata is computed live either
    /// way.
    #[instrument(skip(self))]
    pub async fn recommendations(
        &self,
        user_id: &str,
    ) -> RecommendationResult<RecommendationsResponse> {
        if user_id.trim().is_empty() {
            return Err(RecommendationError::Validation(
                "User ID is required".to_string(),
            ));
        }

        let started = Instant::now();
        let ab_group = abtest::resolve_group(user_id, self.cache.as_ref()).await;
        let rate = self.exploration_rate_for(user_id).await;

        if let Some(cached) = self.cached_list(user_id).await {
            RecommendationMetrics::record_cache_hit();
            debug!(user_id, "Serving recommendations from cache");
            let count = cached.len();
            return Ok(RecommendationsResponse {
                recommendations: cached,
                metadata: RecommendationMetadata {
                    user_id: user_id.to_string(),
                    count,
                    fallback: None,
                    ab_group,
                    exploration_rate: rate,
                    total_candidates: count,
                    cached: true,
                },
            });
        }

        let user_vector = match self.composer.hybrid_user_vector(user_id).await {
            Signal::Vector(vector) => vector,
            Signal::NoSignal => return Ok(self.trending_fallback(user_id, ab_group, rate).await),
        };

        let top_k = if ab_group == abtest::GROUP_A {
            self.config.top_k_group_a
        } else {
            self.config.top_k_group_b
        };
        let matches = retry(|| self.vector_index.query(&user_vector, top_k, true)).await?;

        let candidates = self.filter_by_selected_tags(user_id, matches).await;
        let total_candidates = candidates.len();
        if candidates.is_empty() {
            debug!(user_id, "No candidates survived tag filtering");
            return Ok(RecommendationsResponse {
                recommendations: Vec::new(),
                metadata: RecommendationMetadata {
                    user_id: user_id.to_string(),
                    count: 0,
                    fallback: None,
                    ab_group,
                    exploration_rate: rate,
                    total_candidates: 0,
                    cached: false,
                },
            });
        }

        let mut enriched = self.diversify(&ab_group, candidates);

        let mut rng = StdRng::from_os_rng();
        if rng.random_bool(rate as f64) {
            let pool = ((self.config.exploration_share * total_candidates as f32).ceil() as usize)
                .max(self.config.exploration_min_items);
            let per_source = pool.div_ceil(3);

            let (anti, serendipity, trending) = tokio::join!(
                self.sources.anti_correlated(&user_vector, per_source),
                self.sources
                    .serendipity(user_id, user_vector.len(), per_source, &mut rng),
                self.sources.trending(per_source),
            );
            let mut items: Vec<ExplorationItem> = anti;
            items.extend(serendipity);
            items.extend(trending);

            let before = enriched.len();
            enriched = exploration::inject_exploration(enriched, &items, rate, &mut rng);
            let injected = enriched.len() - before;
            for item in &items[..injected] {
                RecommendationMetrics::record_exploration_injected(
                    &item.exploration_type.to_string(),
                    1,
                );
            }
        }

        let diversified_ids: Vec<String> = enriched
            .iter()
            .filter(|r| r.diversified)
            .map(|r| r.event_id.clone())
            .collect();
        if !diversified_ids.is_empty() {
            let cache = self.cache.clone();
            let user = user_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = cache.track_exploration(&user, &diversified_ids).await {
                    warn!(error = %e, "Failed to track shown exploration items");
                }
            });
        }

        let payload = serde_json::to_string(&enriched)
            .map_err(|e| RecommendationError::Internal(e.to_string()))?;
        let hash = content_hash(&payload);
        if let Err(e) = self
            .cache
            .store_recommendations(user_id, &payload, &hash)
            .await
        {
            warn!(error = %e, "Failed to cache recommendations");
        }

        RecommendationMetrics::record_computed(started.elapsed().as_millis() as u64);

        let count = enriched.len();
        Ok(RecommendationsResponse {
            recommendations: enriched,
            metadata: RecommendationMetadata {
                user_id: user_id.to_string(),
                count,
                fallback: None,
                ab_group,
                exploration_rate: rate,
                total_candidates,
                cached: false,
            },
        })
    }

    /// Embed a free-text query and return the closest events
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> RecommendationResult<SearchResponse> {
        if query.trim().is_empty() {
            return Err(RecommendationError::Validation(
                "Query parameter is required".to_string(),
            ));
        }

        let embedding = embed_or_zero(self.embeddings.as_ref(), query).await;
        if is_zero_vector(&embedding) {
            return Err(RecommendationError::Validation(
                "Failed to perform search".to_string(),
            ));
        }

        let matches = retry(|| {
            self.vector_index
                .query(&embedding, self.config.search_top_k, true)
        })
        .await?;

        let results = matches
            .into_iter()
            .map(|hit| {
                let metadata = hit.metadata.unwrap_or_default();
                SearchResult {
                    event_id: hit.id,
                    title: metadata.title,
                    tags: metadata.tags,
                    score: hit.score,
                }
            })
            .collect();

        Ok(SearchResponse { results })
    }

    /// Cached list, treating read failures and unparseable payloads as misses
    async fn cached_list(&self, user_id: &str) -> Option<Vec<EnrichedRecommendation>> {
        let raw = match self.cache.cached_recommendations(user_id).await {
            Ok(value) => value?,
            Err(e) => {
                warn!(error = %e, "Recommendation cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!(error = %e, "Discarding unparseable cached payload");
                None
            }
        }
    }

    /// Exploration rate from live interaction stats, falling back to
    /// [`BASE_RATE`] when the stats cannot be read
    async fn exploration_rate_for(&self, user_id: &str) -> f32 {
        let window = Duration::days(ENGAGEMENT_WINDOW_DAYS);
        let stats = tokio::join!(
            self.repository.interaction_count(user_id),
            self.repository.engagement_rate(user_id, window),
        );
        match stats {
            (Ok(count), Ok(engagement)) => exploration_rate(count, engagement),
            (count, engagement) => {
                if let Some(e) = count.err().or_else(|| engagement.err()) {
                    warn!(error = %e, "Interaction stats unavailable, using base exploration rate");
                }
                BASE_RATE
            }
        }
    }

    /// Drop candidates that share no tag with the user's selected tags.
    ///
    /// Users without selected tags, and any cache failure, leave the
    /// candidate list untouched. With the filter active, candidates missing
    /// metadata are dropped too.
    async fn filter_by_selected_tags(
        &self,
        user_id: &str,
        matches: Vec<VectorMatch>,
    ) -> Vec<VectorMatch> {
        let selected: HashSet<String> = match self.cache.user_tags(user_id).await {
            Ok(Some(tags)) if !tags.is_empty() => tags.into_iter().collect(),
            Ok(_) => return matches,
            Err(e) => {
                warn!(error = %e, "Selected tags unavailable, skipping tag filter");
                return matches;
            }
        };

        matches
            .into_iter()
            .filter(|hit| {
                hit.metadata
                    .as_ref()
                    .is_some_and(|metadata| metadata.tags.iter().any(|tag| selected.contains(tag)))
            })
            .collect()
    }

    /// Slice ranked candidates into the served list.
    ///
    /// Group A with a large enough pool keeps the top ranks and surfaces the
    /// lowest ranked candidates as a marked tail; everyone else gets a plain
    /// ranked slice.
    fn diversify(&self, ab_group: &str, candidates: Vec<VectorMatch>) -> Vec<EnrichedRecommendation> {
        if ab_group == abtest::GROUP_A && candidates.len() >= self.config.diversify_min_candidates {
            let head = &candidates[..self.config.diversify_head];
            let tail = &candidates[candidates.len() - self.config.diversify_tail..];

            let mut picked: Vec<EnrichedRecommendation> = head
                .iter()
                .map(|hit| EnrichedRecommendation {
                    event_id: hit.id.clone(),
                    score: hit.score,
                    diversified: false,
                })
                .collect();
            picked.extend(tail.iter().map(|hit| EnrichedRecommendation {
                event_id: hit.id.clone(),
                score: hit.score,
                diversified: true,
            }));
            picked
        } else {
            candidates
                .into_iter()
                .take(self.config.response_limit)
                .map(|hit| EnrichedRecommendation {
                    event_id: hit.id,
                    score: hit.score,
                    diversified: false,
                })
                .collect()
        }
    }

    /// Trending list for users with no personalization signal.
    ///
    /// Served directly and never cached, so the next request after a first
    /// interaction gets a personalized recompute.
    async fn trending_fallback(
        &self,
        user_id: &str,
        ab_group: String,
        rate: f32,
    ) -> RecommendationsResponse {
        RecommendationMetrics::record_fallback();
        info!(user_id, "No user signal, serving trending fallback");

        let recommendations: Vec<EnrichedRecommendation> = self
            .sources
            .trending(self.config.response_limit)
            .await
            .into_iter()
            .map(|item| EnrichedRecommendation {
                event_id: item.event_id,
                score: item.score,
                diversified: false,
            })
            .collect();

        let count = recommendations.len();
        RecommendationsResponse {
            recommendations,
            metadata: RecommendationMetadata {
                user_id: user_id.to_string(),
                count,
                fallback: Some("trending".to_string()),
                ab_group,
                exploration_rate: rate,
                total_candidates: count,
                cached: false,
            },
        }
    }
}
