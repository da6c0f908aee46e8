//! HTTP handlers for event ingestion

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_helpers::{
    errors::responses::{BadRequestValidationResponse, InternalServerErrorResponse},
    ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::EventResult;
use crate::models::{IngestEvent, IngestEventResponse};
use crate::repository::EventRepository;
use crate::service::EventIngestionService;

/// OpenAPI documentation for the events API
#[derive(OpenApi)]
#[openapi(
    paths(ingest_event),
    components(
        schemas(IngestEvent, IngestEventResponse),
        responses(BadRequestValidationResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "events", description = "Event ingestion endpoints")
    )
)]
pub struct ApiDoc;

/// Create the events router
pub fn router<R: EventRepository + 'static>(service: EventIngestionService<R>) -> Router {
    Router::new()
        .route("/ingest-event", post(ingest_event))
        .with_state(Arc::new(service))
}

/// Ingest an event into the analytics, vector, and relational stores
#[utoipa::path(
    post,
    path = "/ingest-event",
    tag = "events",
    request_body = IngestEvent,
    responses(
        (status = 201, description = "Event ingested", body = IngestEventResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn ingest_event<R: EventRepository + 'static>(
    State(service): State<Arc<EventIngestionService<R>>>,
    ValidatedJson(input): ValidatedJson<IngestEvent>,
) -> EventResult<(StatusCode, Json<IngestEventResponse>)> {
    let response = service.ingest(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
