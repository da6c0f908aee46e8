//! HTTP handlers for the interaction write path

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_helpers::{
    errors::responses::{BadRequestValidationResponse, InternalServerErrorResponse},
    ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::InteractionResult;
use crate::models::{InteractionAction, LogInteraction, LogInteractionResponse};
use crate::repository::InteractionRepository;
use crate::service::InteractionService;

/// OpenAPI documentation for the interactions API
#[derive(OpenApi)]
#[openapi(
    paths(log_interaction),
    components(
        schemas(LogInteraction, LogInteractionResponse, InteractionAction),
        responses(BadRequestValidationResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "interactions", description = "Interaction logging endpoints")
    )
)]
pub struct ApiDoc;

/// Create the interactions router
pub fn router<R: InteractionRepository + 'static>(service: InteractionService<R>) -> Router {
    Router::new()
        .route("/log-interactions", post(log_interaction))
        .with_state(Arc::new(service))
}

/// Record a user interaction
#[utoipa::path(
    post,
    path = "/log-interactions",
    tag = "interactions",
    request_body = LogInteraction,
    responses(
        (status = 201, description = "Interaction logged", body = LogInteractionResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn log_interaction<R: InteractionRepository + 'static>(
    State(service): State<Arc<InteractionService<R>>>,
    ValidatedJson(input): ValidatedJson<LogInteraction>,
) -> InteractionResult<(StatusCode, Json<LogInteractionResponse>)> {
    let response = service.log_interaction(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
