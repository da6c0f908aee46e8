use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CompensationError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Compensation action {0} not found")]
    NotFound(Uuid),

    #[error("Invalid action payload: {0}")]
    InvalidPayload(String),

    #[error("Store operation failed: {0}")]
    Store(String),

    #[error("Unknown retry operation: {0}")]
    UnknownOperation(String),
}

pub type CompensationResult<T> = Result<T, CompensationError>;

impl From<sea_orm::DbErr> for CompensationError {
    fn from(err: sea_orm::DbErr) -> Self {
        CompensationError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for CompensationError {
    fn from(err: serde_json::Error) -> Self {
        CompensationError::InvalidPayload(err.to_string())
    }
}

impl From<providers::ProviderError> for CompensationError {
    fn from(err: providers::ProviderError) -> Self {
        CompensationError::Store(err.to_string())
    }
}
