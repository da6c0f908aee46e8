use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get};
use axum_helpers::AppKey;
use axum_helpers::server::{create_production_app, health_router};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use providers::{
    AnalyticsSink, EmbeddingProvider, HttpVectorIndex, OpenAIProvider, RecommendationCache,
    RedisCache, TinybirdSink, VectorIndex,
};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    // The metrics recorder must exist before the first request is served
    observability::init_metrics();

    // Initialize database connections concurrently
    let postgres_future = async {
        database::postgres::connect_from_config_with_retry(config.database.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))
    };

    let redis_future = async {
        database::redis::connect_from_config_with_retry(config.redis.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))
    };

    let (db, redis) = tokio::try_join!(postgres_future, redis_future)?;

    // External providers: embeddings, vector index, analytics, cache
    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAIProvider::from_env()
            .map_err(|e| eyre::eyre!("Embedding provider configuration failed: {}", e))?,
    );
    let vector_index: Arc<dyn VectorIndex> = Arc::new(
        HttpVectorIndex::from_env()
            .map_err(|e| eyre::eyre!("Vector index configuration failed: {}", e))?,
    );
    let analytics: Arc<dyn AnalyticsSink> = Arc::new(
        TinybirdSink::from_env()
            .map_err(|e| eyre::eyre!("Analytics sink configuration failed: {}", e))?,
    );
    let cache: Arc<dyn RecommendationCache> = Arc::new(RedisCache::new(redis.clone()));

    let app_key = AppKey::from_env().map_err(|e| eyre::eyre!("App key loading failed: {}", e))?;

    // Initialize the application state with shared connections
    let state = AppState {
        config,
        db,
        redis,
        app_key,
        embeddings,
        vector_index,
        analytics,
        cache,
    };

    // Build router with API routes (pass reference, not ownership!)
    let per_user_limit = api::rate_limit::PerUserLimiter::new()?;
    let api_routes = api::routes(&state, per_user_limit).layer(api::rate_limit::global_layer()?);

    // create_router adds docs/middleware to our composed routes
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    // Merge operational endpoints into the app
    // - /health: liveness check with app name/version
    // - /ready: readiness check with actual db/redis health checks
    // - /metrics: Prometheus exposition
    let app = router
        .merge(health_router(state.config.app.clone()))
        .merge(api::ready_router(state.clone()))
        .route("/metrics", get(observability::metrics_handler))
        .layer(middleware::from_fn(observability::metrics_middleware));

    info!("Starting pharos API with production-ready shutdown (30s timeout)");

    // Production-ready server with graceful shutdown and cleanup
    // State moves here for cleanup
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30), // 30s graceful shutdown timeout
        async move {
            info!("Shutting down: closing database connections");

            // Close connections concurrently
            tokio::join!(
                async {
                    match state.db.close().await {
                        Ok(_) => info!("PostgreSQL connection closed successfully"),
                        Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
                    }
                },
                async {
                    // Redis ConnectionManager closes automatically on drop
                    drop(state.redis);
                    info!("Redis connection closed successfully");
                }
            );
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Pharos API shutdown complete");
    Ok(())
}
