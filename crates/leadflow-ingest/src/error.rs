//! Error taxonomy for the lead-ingestion pipeline
//!
//! Every variant except [`IngestError::ProgressPersistFailed`] ends the
//! upload. Messages are shown to the user verbatim, so backend errors keep
//! their original text.

use thiserror::Error;

use crate::session::InvalidTransition;
use crate::store::StoreError;

/// Result type alias for ingestion operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Message shown when the selected file is not a spreadsheet we can read
pub const UNSUPPORTED_FILE_TYPE_MESSAGE: &str = "Unsupported file type. Upload a CSV or XLSX file.";

#[derive(Error, Debug)]
pub enum IngestError {
    /// File extension is not one of csv, xlsx, xls
    #[error("Unsupported file type. Upload a CSV or XLSX file.")]
    UnsupportedFileType { file_name: String },

    /// No record store could be constructed
    #[error("Record store is not configured. Set DATABASE_URL to enable uploads.")]
    MissingBackendConfiguration,

    /// The initial `lead_ingestions` insert failed
    #[error("{0}")]
    IngestionRecordCreationFailed(#[source] StoreError),

    /// A bulk insert of leads failed; rows from earlier chunks stay committed
    #[error("{source}")]
    ChunkWriteFailed {
        chunk_index: usize,
        processed_rows: u64,
        #[source]
        source: StoreError,
    },

    /// A progress update failed after a successful chunk (logged, not fatal)
    #[error("Failed to persist ingestion progress: {0}")]
    ProgressPersistFailed(#[source] StoreError),

    /// The source file could not be opened or parsed
    #[error("Failed to read {file_name}: {message}")]
    Read { file_name: String, message: String },

    /// The upload was cancelled through its cancellation token
    #[error("Lead ingestion was cancelled")]
    Cancelled,

    /// Another upload is already running on this ingestor
    #[error("An upload is already in progress. Wait for it to finish before starting another.")]
    UploadInProgress,

    #[error(transparent)]
    Session(#[from] InvalidTransition),
}

impl IngestError {
    /// Create a read error with file context
    pub fn read(file_name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Read {
            file_name: file_name.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_file_type_message() {
        let err = IngestError::UnsupportedFileType {
            file_name: "brief.pdf".to_string(),
        };
        assert_eq!(err.to_string(), UNSUPPORTED_FILE_TYPE_MESSAGE);
    }

    #[test]
    fn test_backend_messages_pass_through() {
        let err = IngestError::ChunkWriteFailed {
            chunk_index: 2,
            processed_rows: 1000,
            source: StoreError::Backend("duplicate key value violates unique constraint".into()),
        };
        assert_eq!(err.to_string(), "duplicate key value violates unique constraint");
    }

    #[test]
    fn test_progress_persist_message() {
        let err = IngestError::ProgressPersistFailed(StoreError::Backend("timeout".into()));
        assert!(err.to_string().contains("timeout"));
    }
}
