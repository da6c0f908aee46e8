use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use axum_helpers::require_app_key;
use domain_compensation::PgCompensationQueue;
use domain_events::{EventIngestionService, PgEventRepository};
use domain_interactions::{ActionWeights, InteractionService, PgInteractionRepository};
use domain_recommendations::{RecommendationConfig, RecommendationService};

pub mod health;
pub mod rate_limit;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
///
/// This function takes a reference to AppState and initializes all services.
/// Returns a stateless Router (all sub-routers have state already applied).
/// Only Arc pointer clones remain when domains extract shared connections.
///
/// Ingestion sits behind the app-key guard; the recommendations feed carries
/// its own per-user throttle on top of the global IP window that the caller
/// layers over the whole router.
pub fn routes(state: &crate::state::AppState, per_user: rate_limit::PerUserLimiter) -> Router {
    let ingestion = EventIngestionService::new(
        Arc::new(PgEventRepository::new(state.db.clone())),
        state.embeddings.clone(),
        state.vector_index.clone(),
        state.analytics.clone(),
        Arc::new(PgCompensationQueue::new(state.db.clone())),
    );
    let interactions = InteractionService::new(
        PgInteractionRepository::new(state.db.clone()),
        state.cache.clone(),
        state.analytics.clone(),
        ActionWeights::default(),
    );
    let recommendations = RecommendationService::new(
        Arc::new(PgInteractionRepository::new(state.db.clone())),
        state.embeddings.clone(),
        state.vector_index.clone(),
        state.cache.clone(),
        RecommendationConfig::default(),
    );

    Router::new()
        .merge(
            domain_events::handlers::router(ingestion).route_layer(
                middleware::from_fn_with_state(state.app_key.clone(), require_app_key),
            ),
        )
        .merge(domain_interactions::handlers::router(interactions))
        .merge(
            domain_recommendations::handlers::router(recommendations).route_layer(
                middleware::from_fn_with_state(per_user, rate_limit::per_user_rate_limit),
            ),
        )
}

/// Creates a router with the /ready endpoint that performs actual health checks.
///
/// This router has state applied and can be merged with the stateless app
/// router from `create_router`. The /ready endpoint checks database and
/// redis connections.
pub fn ready_router(state: crate::state::AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
