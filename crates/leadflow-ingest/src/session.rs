//! In-memory state of one upload
//!
//! Stages only move forward: `Idle < Preparing < Uploading < {Success, Error}`.
//! A session in a terminal stage is finished; call [`UploadSession::reset`]
//! or start a new one to retry.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Idle,
    Preparing,
    Uploading,
    Success,
    Error,
}

impl UploadStage {
    fn rank(self) -> u8 {
        match self {
            UploadStage::Idle => 0,
            UploadStage::Preparing => 1,
            UploadStage::Uploading => 2,
            UploadStage::Success | UploadStage::Error => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStage::Success | UploadStage::Error)
    }

    /// Whether moving from `self` to `next` is a legal forward transition
    pub fn can_advance_to(self, next: UploadStage) -> bool {
        next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadStage::Idle => "idle",
            UploadStage::Preparing => "preparing",
            UploadStage::Uploading => "uploading",
            UploadStage::Success => "success",
            UploadStage::Error => "error",
        }
    }
}

impl std::fmt::Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected stage change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid upload stage transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: UploadStage,
    pub to: UploadStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSession {
    stage: UploadStage,
    file_name: Option<String>,
    ingestion_id: Option<Uuid>,
    processed_rows: u64,
    total_rows: Option<u64>,
    error_message: Option<String>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            stage: UploadStage::Idle,
            file_name: None,
            ingestion_id: None,
            processed_rows: 0,
            total_rows: None,
            error_message: None,
        }
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn ingestion_id(&self) -> Option<Uuid> {
        self.ingestion_id
    }

    pub fn processed_rows(&self) -> u64 {
        self.processed_rows
    }

    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// True while the upload is preparing or writing rows
    pub fn is_uploading(&self) -> bool {
        matches!(self.stage, UploadStage::Preparing | UploadStage::Uploading)
    }

    /// Progress for display, 0..=100.
    ///
    /// Uses the known total when there is one; a running upload with an
    /// unknown total reports a fixed 15% once rows start landing.
    pub fn progress_percent(&self) -> u8 {
        if let Some(total) = self.total_rows.filter(|total| *total > 0) {
            let percent = (self.processed_rows as f64 / total as f64 * 100.0).round();
            return percent.min(100.0) as u8;
        }
        if self.stage == UploadStage::Success {
            100
        } else if self.processed_rows > 0 {
            15
        } else {
            0
        }
    }

    /// Return to a fresh idle session
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn advance(&mut self, next: UploadStage) -> Result<(), InvalidTransition> {
        if !self.stage.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    /// `Idle → Preparing` once a file has been selected
    pub fn begin(&mut self, file_name: impl Into<String>) -> Result<(), InvalidTransition> {
        self.advance(UploadStage::Preparing)?;
        self.file_name = Some(file_name.into());
        Ok(())
    }

    /// `Preparing → Uploading` once the durable record exists
    pub fn start_uploading(
        &mut self,
        ingestion_id: Uuid,
        total_rows: Option<u64>,
    ) -> Result<(), InvalidTransition> {
        if self.stage != UploadStage::Preparing {
            return Err(InvalidTransition {
                from: self.stage,
                to: UploadStage::Uploading,
            });
        }
        self.advance(UploadStage::Uploading)?;
        self.ingestion_id = Some(ingestion_id);
        self.total_rows = total_rows;
        Ok(())
    }

    /// Set the total once it becomes known. Never lowers it below the
    /// rows already processed.
    pub fn set_total_rows(&mut self, total_rows: u64) {
        self.total_rows = Some(total_rows.max(self.processed_rows));
    }

    /// Add a committed chunk. Raises a known total that would otherwise be
    /// exceeded and returns the new processed count.
    pub fn record_chunk(&mut self, rows: u64) -> u64 {
        self.processed_rows += rows;
        if let Some(total) = self.total_rows {
            if self.processed_rows > total {
                self.total_rows = Some(self.processed_rows);
            }
        }
        self.processed_rows
    }

    pub fn succeed(&mut self) -> Result<(), InvalidTransition> {
        if self.stage != UploadStage::Uploading {
            return Err(InvalidTransition {
                from: self.stage,
                to: UploadStage::Success,
            });
        }
        self.advance(UploadStage::Success)
    }

    /// Move to `Error` from any non-terminal stage
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        self.advance(UploadStage::Error)?;
        self.error_message = Some(message.into());
        Ok(())
    }
}
