//! Interactions Domain
//!
//! Relational store for raw interaction events and user demographic
//! profiles, plus the aggregate queries the recommendation pipeline reads
//! (engagement rate, similar users, trending events).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Write path: validation, signup bootstrap, cache invalidation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{InteractionError, InteractionResult};
pub use handlers::ApiDoc;
pub use models::{
    ActionWeights, Interaction, InteractionAction, LogInteraction, LogInteractionResponse,
    NewInteraction, SimilarUser, TrendingEvent, UserProfile, SIGNUP_SENTINEL_EVENT_ID,
};
pub use postgres::PgInteractionRepository;
pub use repository::InteractionRepository;
pub use service::InteractionService;

#[cfg(any(test, feature = "mock"))]
pub use repository::MockInteractionRepository;
