use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Ingestion failed for event {event_id}: {reason}")]
    IngestionFailed { event_id: String, reason: String },

    #[error("Partial ingestion failure for event {event_id}: {failed_operation} failed ({cause}), compensation queued")]
    PartialFailure {
        event_id: String,
        failed_operation: String,
        cause: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Compensation enqueue failed: {0}")]
    Compensation(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Validation(msg) => AppError::BadRequest(msg),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for EventError {
    fn from(err: sea_orm::DbErr) -> Self {
        EventError::Database(err.to_string())
    }
}
