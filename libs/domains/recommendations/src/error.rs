use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Vector index error: {0}")]
    VectorStore(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RecommendationResult<T> = Result<T, RecommendationError>;

impl From<RecommendationError> for AppError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::Validation(msg) => AppError::BadRequest(msg),
            RecommendationError::VectorStore(msg) => {
                AppError::InternalServerError(format!("Vector index error: {}", msg))
            }
            RecommendationError::Database(msg) => {
                AppError::InternalServerError(format!("Database error: {}", msg))
            }
            RecommendationError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for RecommendationError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<providers::ProviderError> for RecommendationError {
    fn from(err: providers::ProviderError) -> Self {
        RecommendationError::VectorStore(err.to_string())
    }
}

impl From<domain_interactions::InteractionError> for RecommendationError {
    fn from(err: domain_interactions::InteractionError) -> Self {
        RecommendationError::Database(err.to_string())
    }
}
