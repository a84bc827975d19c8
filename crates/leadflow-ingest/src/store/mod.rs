//! Record store interface
//!
//! The pipeline only ever talks to the backend through [`RecordStore`]: create
//! and update one ingestion record, and bulk-insert lead rows. Implementations
//! must make `insert_leads` all-or-nothing so that processed-row accounting
//! matches what is durable.

use async_trait::async_trait;
use leadflow_common::types::{
    IngestionRecord, IngestionUpdate, NewIngestion, NormalizedLeadRecord,
};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Record store errors. Display is the backend's own message.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Ingestion '{0}' not found")]
    NotFound(Uuid),

    /// Error reported by a non-SQL backend
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new ingestion record and return its id
    async fn create_ingestion(&self, ingestion: NewIngestion) -> StoreResult<Uuid>;

    /// Apply a partial update to an ingestion record
    async fn update_ingestion(&self, id: Uuid, update: IngestionUpdate) -> StoreResult<()>;

    /// Insert a batch of leads atomically
    async fn insert_leads(&self, leads: &[NormalizedLeadRecord]) -> StoreResult<()>;

    async fn get_ingestion(&self, id: Uuid) -> StoreResult<Option<IngestionRecord>>;

    /// Most recent ingestions first
    async fn list_ingestions(&self, limit: i64) -> StoreResult<Vec<IngestionRecord>>;
}
