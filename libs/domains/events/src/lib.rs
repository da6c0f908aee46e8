//! Event ingestion domain.
//!
//! An ingested event fans out to three stores, with compensation covering
//! the gaps between them:
//!
//! ```text
//!   POST /ingest-event
//!        |
//!        v
//!   EventIngestionService
//!        |-- embedding API  --.        (parallel)
//!        |-- analytics sink --'
//!        |-- vector index upsert       (ordered)
//!        `-- postgres insert
//!              |
//!              `-- on partial failure: compensation queue
//! ```
//!
//! The repository also implements the compensation crate's `RollbackTarget`,
//! so the background worker can undo or replay the relational write.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{EventError, EventResult};
pub use handlers::ApiDoc;
pub use models::{Event, IngestEvent, IngestEventResponse, NewEvent};
pub use postgres::PgEventRepository;
pub use repository::EventRepository;
pub use service::EventIngestionService;

#[cfg(any(test, feature = "mock"))]
pub use repository::MockEventRepository;
