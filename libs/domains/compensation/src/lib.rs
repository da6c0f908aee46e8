//! Compensation queue for multi-store write failures.
//!
//! Event ingestion writes to stores that cannot share a transaction: the
//! analytics sink, the vector index, and PostgreSQL. When a write fails
//! partway through, the ingestion path records what already succeeded here
//! and a background worker later reverses or replays it.
//!
//! ```text
//!   ingestion failure
//!         |
//!         v
//!   compensation_queue (postgres, oldest first)
//!         |
//!         v
//!   CompensationProcessor
//!         |-- rollback  -> delete the vector and relational writes that landed
//!         |-- retry     -> replay the one store write that failed
//!         `-- manual    -> alert webhook, an operator takes over
//! ```
//!
//! A failed run increments `retry_count` and the action stays eligible until
//! `max_retries` is reached. Exhausted actions keep status `failed`, fire the
//! alert webhook, and remain visible through `get_failed_actions`.

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod processor;
pub mod repository;
pub mod worker;

pub use error::{CompensationError, CompensationResult};
pub use models::{
    ActionStatus, ActionType, CompensationAction, DEFAULT_MAX_RETRIES, ManualInterventionPayload,
    NewCompensationAction, OP_D1_INSERT, OP_EMBEDDING_GENERATION, OP_TINYBIRD_INGEST,
    OP_VECTOR_UPSERT, RetryPayload, RollbackPayload, is_durable_operation,
};
pub use postgres::PgCompensationQueue;
pub use processor::{CompensationProcessor, RollbackTarget};
pub use repository::CompensationQueue;
pub use worker::WorkerConfig;

#[cfg(any(test, feature = "mock"))]
pub use processor::MockRollbackTarget;
#[cfg(any(test, feature = "mock"))]
pub use repository::MockCompensationQueue;
