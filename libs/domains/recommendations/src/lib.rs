//! Recommendations Domain
//!
//! The read side of the events platform: builds a hybrid vector per user,
//! queries the shared vector index for candidates, and shapes the result
//! with tag filtering, A/B-gated diversification, and probabilistic
//! exploration injection. A scheduled updater keeps per-tag centroid
//! vectors fresh.
//!
//! # Request pipeline
//!
//! ```text
//! ┌────────────┐   miss   ┌─────────────────┐
//! │ CacheCheck ├─────────►│  VectorCompose  │  ← interactions + tags + collaborative + demographics
//! └─────┬──────┘          └────────┬────────┘
//!       │ hit                      │ NoSignal → trending fallback
//!       ▼                          ▼
//!   cached list           ┌─────────────────┐
//!                         │ CandidateQuery  │  ← vector index, retried
//!                         └────────┬────────┘
//!                                  ▼
//!                         ┌─────────────────┐
//!                         │ TagFilter       │
//!                         │ Diversify       │
//!                         │ ExplorationMix  │
//!                         │ CacheWrite      │
//!                         └─────────────────┘
//! ```

pub mod abtest;
pub mod composer;
pub mod error;
pub mod exploration;
pub mod handlers;
pub mod models;
pub mod service;
pub mod signal;
pub mod tags;

// Re-export commonly used types
pub use abtest::{assign_group, resolve_group};
pub use composer::VectorComposer;
pub use error::{RecommendationError, RecommendationResult};
pub use exploration::{
    BASE_RATE, ExplorationSources, INJECTION_SLOTS, exploration_rate, inject_exploration,
};
pub use handlers::ApiDoc;
pub use models::{
    EnrichedRecommendation, ExplorationItem, ExplorationType, RecommendationConfig,
    RecommendationMetadata, RecommendationsResponse, SearchQuery, SearchResponse, SearchResult,
};
pub use service::RecommendationService;
pub use signal::{Signal, combine_vectors};
pub use tags::TagVectorUpdater;
