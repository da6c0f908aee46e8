use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Pharos API",
        version = "0.1.0",
        description = "Event recommendations API: ingestion, interaction logging, personalized feeds, and semantic search"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = "", api = domain_events::handlers::ApiDoc),
        (path = "", api = domain_interactions::handlers::ApiDoc),
        (path = "", api = domain_recommendations::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;
