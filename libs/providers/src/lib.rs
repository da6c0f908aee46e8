//! External service clients for the recommendation engine.
//!
//! Every store the engine talks to besides PostgreSQL lives behind a trait
//! here: the embedding API, the hosted vector index, the analytics sink, the
//! alert webhook, and the Redis cache. Domain crates depend on the traits;
//! binaries construct the concrete clients from environment configuration.
//!
//! Enable the `mock` feature in dev-dependencies to use the generated
//! `Mock*` clients in downstream tests.

pub mod alerts;
pub mod analytics;
pub mod cache;
pub mod embedding;
pub mod error;
pub mod vector;

pub use alerts::{AlertNotifier, WebhookNotifier};
pub use analytics::{
    AnalyticsEvent, AnalyticsInteraction, AnalyticsSink, TinybirdConfig, TinybirdSink,
};
pub use cache::{RecommendationCache, RedisCache, content_hash};
pub use embedding::{
    EmbeddingConfig, EmbeddingProvider, OpenAIProvider, embed_or_zero, is_zero_vector,
};
pub use error::{ProviderError, ProviderResult};
pub use vector::{
    HttpVectorIndex, VectorIndex, VectorIndexConfig, VectorMatch, VectorMetadata, VectorRecord,
};

#[cfg(any(test, feature = "mock"))]
pub use alerts::MockAlertNotifier;
#[cfg(any(test, feature = "mock"))]
pub use analytics::MockAnalyticsSink;
#[cfg(any(test, feature = "mock"))]
pub use cache::MockRecommendationCache;
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingProvider;
#[cfg(any(test, feature = "mock"))]
pub use vector::MockVectorIndex;
