//! Error types for Leadflow

use thiserror::Error;

/// Result type alias for Leadflow operations
pub type Result<T> = std::result::Result<T, LeadflowError>;

/// Errors raised by the shared Leadflow types
#[derive(Error, Debug)]
pub enum LeadflowError {
    #[error("Invalid ingestion status: {0}")]
    InvalidStatus(String),
}
