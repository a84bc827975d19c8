//! In-process record store
//!
//! Backs `--dry-run` uploads and the pipeline tests. Failures can be injected
//! per operation to exercise the writer's error paths.

use async_trait::async_trait;
use chrono::Utc;
use leadflow_common::types::{
    IngestionRecord, IngestionUpdate, NewIngestion, NormalizedLeadRecord,
};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    ingestions: Vec<IngestionRecord>,
    leads: Vec<NormalizedLeadRecord>,
    insert_batches: Vec<usize>,
    updates: Vec<(Uuid, IngestionUpdate)>,
    fail_create: Option<String>,
    fail_insert_call: Option<(usize, String)>,
    fail_progress: Option<String>,
    insert_calls: usize,
    insert_delay: Option<Duration>,
}

/// Record store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    state: Mutex<State>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_ingestion` fail with the given message
    pub async fn fail_create(&self, message: impl Into<String>) {
        self.state.lock().await.fail_create = Some(message.into());
    }

    /// Make the `call`-th `insert_leads` call (1-based) fail
    pub async fn fail_insert_on_call(&self, call: usize, message: impl Into<String>) {
        self.state.lock().await.fail_insert_call = Some((call, message.into()));
    }

    /// Make progress-only updates (those without a status) fail
    pub async fn fail_progress_updates(&self, message: impl Into<String>) {
        self.state.lock().await.fail_progress = Some(message.into());
    }

    /// Sleep inside every `insert_leads` call
    pub async fn set_insert_delay(&self, delay: Duration) {
        self.state.lock().await.insert_delay = Some(delay);
    }

    /// Sizes of every successful bulk insert, in call order
    pub async fn insert_batches(&self) -> Vec<usize> {
        self.state.lock().await.insert_batches.clone()
    }

    pub async fn leads(&self) -> Vec<NormalizedLeadRecord> {
        self.state.lock().await.leads.clone()
    }

    pub async fn ingestions(&self) -> Vec<IngestionRecord> {
        self.state.lock().await.ingestions.clone()
    }

    /// Every update applied (or attempted and rejected), in call order
    pub async fn updates(&self) -> Vec<(Uuid, IngestionUpdate)> {
        self.state.lock().await.updates.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_ingestion(&self, ingestion: NewIngestion) -> StoreResult<Uuid> {
        let mut state = self.state.lock().await;
        if let Some(ref message) = state.fail_create {
            return Err(StoreError::Backend(message.clone()));
        }

        let id = Uuid::new_v4();
        state.ingestions.push(IngestionRecord {
            id,
            filename: ingestion.filename,
            status: ingestion.status,
            total_rows: ingestion.total_rows,
            processed_rows: ingestion.processed_rows,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        });
        Ok(id)
    }

    async fn update_ingestion(&self, id: Uuid, update: IngestionUpdate) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.updates.push((id, update.clone()));

        if update.status.is_none() {
            if let Some(ref message) = state.fail_progress {
                return Err(StoreError::Backend(message.clone()));
            }
        }

        let record = state
            .ingestions
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound(id))?;
        update.apply_to(record);
        Ok(())
    }

    async fn insert_leads(&self, leads: &[NormalizedLeadRecord]) -> StoreResult<()> {
        let delay = {
            let mut state = self.state.lock().await;
            state.insert_calls += 1;
            if let Some((call, ref message)) = state.fail_insert_call {
                if call == state.insert_calls {
                    return Err(StoreError::Backend(message.clone()));
                }
            }
            state.insert_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        state.insert_batches.push(leads.len());
        state.leads.extend_from_slice(leads);
        Ok(())
    }

    async fn get_ingestion(&self, id: Uuid) -> StoreResult<Option<IngestionRecord>> {
        let state = self.state.lock().await;
        Ok(state.ingestions.iter().find(|record| record.id == id).cloned())
    }

    async fn list_ingestions(&self, limit: i64) -> StoreResult<Vec<IngestionRecord>> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(state.ingestions.iter().rev().take(limit).cloned().collect())
    }
}
