use async_trait::async_trait;
use chrono::Duration;

use crate::error::InteractionResult;
use crate::models::{Interaction, NewInteraction, SimilarUser, TrendingEvent, UserProfile};

/// Repository trait for interaction persistence
///
/// This is the engine's only window into the relational store.
/// Implementations can use different storage backends (PostgreSQL, etc.)
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Append one interaction row
    async fn insert(&self, input: NewInteraction) -> InteractionResult<Interaction>;

    /// True when the user has at least one interaction of any kind
    async fn user_exists(&self, user_id: &str) -> InteractionResult<bool>;

    /// All non-signup interactions for a user, newest first
    async fn interactions_for_user(&self, user_id: &str) -> InteractionResult<Vec<Interaction>>;

    /// Total interaction rows for a user, the signup row included
    async fn interaction_count(&self, user_id: &str) -> InteractionResult<u64>;

    /// Share of interactions within `window` that were likes or clicks.
    /// Zero when the user has no interactions in the window.
    async fn engagement_rate(&self, user_id: &str, window: Duration) -> InteractionResult<f32>;

    /// Users who liked or clicked the same events as `user_id`, ranked by
    /// overlap size
    async fn similar_users(
        &self,
        user_id: &str,
        limit: u64,
    ) -> InteractionResult<Vec<SimilarUser>>;

    /// Recent likes and clicks pooled across a set of users, newest first
    async fn interactions_for_users(
        &self,
        user_ids: &[String],
        limit: u64,
    ) -> InteractionResult<Vec<Interaction>>;

    /// Events ranked by recent interaction volume and engagement
    async fn trending_events(
        &self,
        window: Duration,
        limit: u64,
    ) -> InteractionResult<Vec<TrendingEvent>>;

    /// Distinct event ids with like/click/view activity within `window`
    async fn recently_interacted_event_ids(
        &self,
        window: Duration,
        limit: u64,
    ) -> InteractionResult<Vec<String>>;

    /// Demographic profile, if the account system has written one
    async fn user_profile(&self, user_id: &str) -> InteractionResult<Option<UserProfile>>;
}
