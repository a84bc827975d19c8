//! Leadflow Ingest Library
//!
//! Loads marketing lead spreadsheets (CSV, XLSX, XLS) into a record store.
//!
//! # Pipeline
//!
//! - **Intake**: detect the file format, estimate CSV row counts and open a
//!   [`intake::RowSource`] that yields batches of raw rows
//! - **Normalize**: sanitize cells, drop empty rows and map arbitrary column
//!   names onto first name, last name, email, phone and company
//! - **Privacy**: reduce phone numbers to digits and store a SHA-256 digest
//! - **Writer**: insert batches of 500 rows and keep the `lead_ingestions`
//!   record's progress current after every chunk
//!
//! # Example
//!
//! ```no_run
//! use leadflow_ingest::{LeadIngestor, MemoryRecordStore, TracingObserver};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ingestor = LeadIngestor::new(Arc::new(MemoryRecordStore::new()));
//!     let session = ingestor
//!         .upload(Path::new("./leads.csv"), &TracingObserver)
//!         .await;
//!     println!("{} rows", session.processed_rows());
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod intake;
pub mod normalize;
pub mod observer;
pub mod progress;
pub mod session;
pub mod store;
pub mod writer;

pub use config::Config;
pub use error::{IngestError, IngestResult};
pub use observer::{IngestionObserver, Notification, NotificationLevel, RecordingObserver, TracingObserver};
pub use session::{UploadSession, UploadStage};
pub use store::{MemoryRecordStore, PgRecordStore, RecordStore, StoreError};
pub use writer::LeadIngestor;
