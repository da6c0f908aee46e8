//! HTTP handlers for the recommendation read path

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_helpers::errors::responses::{BadRequestValidationResponse, InternalServerErrorResponse};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::RecommendationResult;
use crate::models::{
    EnrichedRecommendation, RecommendationMetadata, RecommendationsResponse, SearchQuery,
    SearchResponse, SearchResult,
};
use crate::service::RecommendationService;
use domain_interactions::InteractionRepository;

/// OpenAPI documentation for the recommendations API
#[derive(OpenApi)]
#[openapi(
    paths(get_recommendations, search_events),
    components(
        schemas(
            RecommendationsResponse,
            RecommendationMetadata,
            EnrichedRecommendation,
            SearchResponse,
            SearchResult,
            SearchQuery
        ),
        responses(BadRequestValidationResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "recommendations", description = "Personalized recommendations and event search")
    )
)]
pub struct ApiDoc;

/// Create the recommendations router
pub fn router<R: InteractionRepository + 'static>(service: RecommendationService<R>) -> Router {
    Router::new()
        .route("/get-recommendations/{user_id}", get(get_recommendations))
        .route("/search", get(search_events))
        .with_state(Arc::new(service))
}

/// Personalized recommendations for a user
#[utoipa::path(
    get,
    path = "/get-recommendations/{user_id}",
    tag = "recommendations",
    params(("user_id" = String, Path, description = "User to recommend events for")),
    responses(
        (status = 200, description = "Ranked recommendations with request metadata", body = RecommendationsResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_recommendations<R: InteractionRepository + 'static>(
    State(service): State<Arc<RecommendationService<R>>>,
    Path(user_id): Path<String>,
) -> RecommendationResult<Json<RecommendationsResponse>> {
    let response = service.recommendations(&user_id).await?;
    Ok(Json(response))
}

/// Semantic search over events
#[utoipa::path(
    get,
    path = "/search",
    tag = "recommendations",
    params(SearchQuery),
    responses(
        (status = 200, description = "Closest events for the query", body = SearchResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_events<R: InteractionRepository + 'static>(
    State(service): State<Arc<RecommendationService<R>>>,
    Query(params): Query<SearchQuery>,
) -> RecommendationResult<Json<SearchResponse>> {
    let response = service.search(&params.query).await?;
    Ok(Json(response))
}
