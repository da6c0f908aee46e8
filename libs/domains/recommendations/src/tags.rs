//! Scheduled refresh of per-tag centroid vectors.
//!
//! Every pass looks at events with recent like/click/view activity, groups
//! their stored embeddings by tag, and blends each tag's average into the
//! cached centroid with a small learning rate. Tags with no recent activity
//! are never touched, so centroids only ever drift toward fresh signal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;
use domain_interactions::InteractionRepository;
use observability::TagUpdateMetrics;
use providers::{RecommendationCache, VectorIndex};
use tracing::{debug, instrument, warn};

use crate::error::RecommendationResult;

const RECENT_WINDOW_HOURS: i64 = 24;
const RECENT_EVENTS_LIMIT: u64 = 500;
const LEARNING_RATE: f32 = 0.1;

pub struct TagVectorUpdater<R: InteractionRepository> {
    repository: Arc<R>,
    vector_index: Arc<dyn VectorIndex>,
    cache: Arc<dyn RecommendationCache>,
    dimensions: usize,
}

impl<R: InteractionRepository> TagVectorUpdater<R> {
    pub fn new(
        repository: Arc<R>,
        vector_index: Arc<dyn VectorIndex>,
        cache: Arc<dyn RecommendationCache>,
        dimensions: usize,
    ) -> Self {
        Self {
            repository,
            vector_index,
            cache,
            dimensions,
        }
    }

    /// One full refresh pass. Returns the number of tags written.
    ///
    /// Each tag is an independent unit of work: a failing tag is logged and
    /// skipped, never blocking the rest of the pass.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> RecommendationResult<usize> {
        let started = Instant::now();

        let event_ids = self
            .repository
            .recently_interacted_event_ids(
                Duration::hours(RECENT_WINDOW_HOURS),
                RECENT_EVENTS_LIMIT,
            )
            .await?;
        if event_ids.is_empty() {
            debug!("No recent interactions, tag vectors unchanged");
            TagUpdateMetrics::record_run(0, started.elapsed().as_secs_f64());
            return Ok(0);
        }

        let records = self.vector_index.fetch(&event_ids).await?;

        let mut grouped: HashMap<String, Vec<&[f32]>> = HashMap::new();
        for record in &records {
            let Some(metadata) = &record.metadata else {
                continue;
            };
            for tag in &metadata.tags {
                let tag = tag.trim();
                if tag.is_empty() {
                    continue;
                }
                grouped
                    .entry(tag.to_string())
                    .or_default()
                    .push(record.vector.as_slice());
            }
        }

        let mut updated = 0;
        for (tag, vectors) in &grouped {
            match self.blend_tag(tag, vectors).await {
                Ok(true) => updated += 1,
                Ok(false) => {}
                Err(e) => warn!(tag, error = %e, "Tag vector update failed"),
            }
        }

        TagUpdateMetrics::record_run(updated, started.elapsed().as_secs_f64());
        Ok(updated)
    }

    /// Blend one tag's event-vector average into its stored centroid.
    ///
    /// A missing or wrong-length centroid restarts from zeros. Returns
    /// `false` when no event vector had the expected dimensions.
    async fn blend_tag(&self, tag: &str, vectors: &[&[f32]]) -> RecommendationResult<bool> {
        let mut average = vec![0.0f32; self.dimensions];
        let mut counted = 0usize;
        for vector in vectors {
            if vector.len() != self.dimensions {
                continue;
            }
            for (acc, v) in average.iter_mut().zip(vector.iter()) {
                *acc += v;
            }
            counted += 1;
        }
        if counted == 0 {
            return Ok(false);
        }
        for v in average.iter_mut() {
            *v /= counted as f32;
        }

        let current = match self.cache.tag_vector(tag).await? {
            Some(stored) if stored.len() == self.dimensions => stored,
            _ => vec![0.0; self.dimensions],
        };

        let blended: Vec<f32> = current
            .iter()
            .zip(average.iter())
            .map(|(old, avg)| old * (1.0 - LEARNING_RATE) + avg * LEARNING_RATE)
            .collect();

        self.cache.store_tag_vector(tag, &blended).await?;
        Ok(true)
    }
}
