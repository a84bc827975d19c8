//! Common types used across Leadflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LeadflowError, Result};

/// Status of a durable ingestion record (`lead_ingestions.status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Processing,
    Succeeded,
    Failed,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Processing => "processing",
            IngestionStatus::Succeeded => "succeeded",
            IngestionStatus::Failed => "failed",
        }
    }

    /// Whether the record has reached its final status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, IngestionStatus::Processing)
    }
}

impl std::str::FromStr for IngestionStatus {
    type Err = LeadflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "processing" => Ok(IngestionStatus::Processing),
            "succeeded" => Ok(IngestionStatus::Succeeded),
            "failed" => Ok(IngestionStatus::Failed),
            other => Err(LeadflowError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ingestion Records
// ============================================================================

/// Durable progress record for one upload attempt (maps to `lead_ingestions`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub id: Uuid,
    pub filename: String,
    pub status: IngestionStatus,
    pub total_rows: Option<i64>,
    pub processed_rows: i64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields written when an ingestion record is first created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIngestion {
    pub filename: String,
    pub status: IngestionStatus,
    pub total_rows: Option<i64>,
    pub processed_rows: i64,
}

impl NewIngestion {
    /// A fresh `processing` record with nothing processed yet
    pub fn processing(filename: impl Into<String>, total_rows: Option<i64>) -> Self {
        Self {
            filename: filename.into(),
            status: IngestionStatus::Processing,
            total_rows,
            processed_rows: 0,
        }
    }
}

/// Partial update of an ingestion record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionUpdate {
    pub status: Option<IngestionStatus>,
    pub processed_rows: Option<i64>,
    pub total_rows: Option<i64>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl IngestionUpdate {
    /// Progress-only update written after each chunk
    pub fn progress(processed_rows: i64, total_rows: Option<i64>) -> Self {
        Self {
            processed_rows: Some(processed_rows),
            total_rows,
            ..Default::default()
        }
    }

    /// Terminal success update
    pub fn succeeded(processed_rows: i64, total_rows: i64, completed_at: DateTime<Utc>) -> Self {
        Self {
            status: Some(IngestionStatus::Succeeded),
            processed_rows: Some(processed_rows),
            total_rows: Some(total_rows),
            completed_at: Some(completed_at),
            ..Default::default()
        }
    }

    /// Terminal failure update, keeping the rows already committed
    pub fn failed(processed_rows: i64, error: impl Into<String>) -> Self {
        Self {
            status: Some(IngestionStatus::Failed),
            processed_rows: Some(processed_rows),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Apply this update onto an existing record
    pub fn apply_to(&self, record: &mut IngestionRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(processed) = self.processed_rows {
            record.processed_rows = processed;
        }
        if let Some(total) = self.total_rows {
            record.total_rows = Some(total);
        }
        if let Some(ref error) = self.error {
            record.error = Some(error.clone());
        }
        if let Some(completed_at) = self.completed_at {
            record.completed_at = Some(completed_at);
        }
    }
}

// ============================================================================
// Lead Records
// ============================================================================

/// One normalized, privacy-safe lead row (maps to `leads`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLeadRecord {
    pub ingestion_id: Uuid,
    pub source_filename: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub hashed_phone: Option<String>,
    /// Sanitized source row, column order preserved
    pub raw_payload: serde_json::Map<String, serde_json::Value>,
}
