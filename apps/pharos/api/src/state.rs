//! Shared application state.
//!
//! One instance is built at startup and cloned into every handler. All
//! fields are connection handles or `Arc`s, so a clone is a handful of
//! pointer bumps.

use std::sync::Arc;

use axum_helpers::AppKey;
use providers::{AnalyticsSink, EmbeddingProvider, RecommendationCache, VectorIndex};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
    /// Redis connection manager
    pub redis: database::redis::ConnectionManager,
    /// Shared secret for pipeline callers hitting the ingestion route
    pub app_key: AppKey,
    /// Embedding API client used for ingestion and cold-start search
    pub embeddings: Arc<dyn EmbeddingProvider>,
    /// Vector index over event embeddings
    pub vector_index: Arc<dyn VectorIndex>,
    /// Analytics ingestion sink
    pub analytics: Arc<dyn AnalyticsSink>,
    /// Redis-backed recommendation cache
    pub cache: Arc<dyn RecommendationCache>,
}
