use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InteractionResult<T> = Result<T, InteractionError>;

impl From<InteractionError> for AppError {
    fn from(err: InteractionError) -> Self {
        match err {
            InteractionError::Validation(msg) => AppError::BadRequest(msg),
            InteractionError::Database(msg) => {
                AppError::InternalServerError(format!("Database error: {}", msg))
            }
            InteractionError::Cache(msg) => {
                AppError::InternalServerError(format!("Cache error: {}", msg))
            }
            InteractionError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for InteractionError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for InteractionError {
    fn from(err: sea_orm::DbErr) -> Self {
        InteractionError::Database(err.to_string())
    }
}

impl From<providers::ProviderError> for InteractionError {
    fn from(err: providers::ProviderError) -> Self {
        InteractionError::Cache(err.to_string())
    }
}
