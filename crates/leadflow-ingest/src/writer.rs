//! Chunked ingestion writer
//!
//! Drives one upload end to end:
//! 1. Preparing: validate the file, estimate CSV rows, create the
//!    `lead_ingestions` record
//! 2. Uploading: pull batches from the row source, normalize them, bulk-insert
//!    each batch and persist progress after every committed chunk
//! 3. Terminal: mark the record succeeded or failed and notify the observer
//!
//! Chunks are strictly sequential. The next batch is only read once the
//! previous insert and its progress update have returned.

use chrono::Utc;
use leadflow_common::types::{IngestionUpdate, NewIngestion};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{Config, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ESTIMATE_BYTES};
use crate::error::{IngestError, IngestResult};
use crate::intake::{estimate_csv_row_count, open_row_source, FileKind};
use crate::normalize::transform_rows;
use crate::observer::{IngestionObserver, Notification};
use crate::session::UploadSession;
use crate::store::{PgRecordStore, RecordStore, StoreResult};

/// Uploads spreadsheet files into a [`RecordStore`]
pub struct LeadIngestor {
    store: Option<Arc<dyn RecordStore>>,
    chunk_size: usize,
    max_estimate_bytes: u64,
    cancel: CancellationToken,
    busy: AtomicBool,
}

/// Clears the busy flag when an upload ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LeadIngestor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_store(Some(store))
    }

    /// An ingestor with no record store. Every upload fails with
    /// [`IngestError::MissingBackendConfiguration`].
    pub fn without_backend() -> Self {
        Self::with_store(None)
    }

    fn with_store(store: Option<Arc<dyn RecordStore>>) -> Self {
        Self {
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_estimate_bytes: DEFAULT_MAX_ESTIMATE_BYTES,
            cancel: CancellationToken::new(),
            busy: AtomicBool::new(false),
        }
    }

    /// Connect to Postgres when `DATABASE_URL` is set, otherwise build an
    /// ingestor without a backend
    pub async fn from_config(config: &Config) -> StoreResult<Self> {
        let ingestor = match config.database.url {
            Some(ref url) => {
                let store = PgRecordStore::connect(&config.database, url).await?;
                Self::new(Arc::new(store))
            }
            None => Self::without_backend(),
        };

        Ok(ingestor
            .with_chunk_size(config.ingest.chunk_size)
            .with_max_estimate_bytes(config.ingest.max_estimate_bytes))
    }

    /// Rows per bulk insert. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_max_estimate_bytes(mut self, max_estimate_bytes: u64) -> Self {
        self.max_estimate_bytes = max_estimate_bytes;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Token that cancels the running upload at its next suspension point
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one upload to a terminal stage.
    ///
    /// Pipeline failures never surface as `Err`: they end the returned
    /// session in the `Error` stage and are reported to the observer.
    #[instrument(skip(self, path, observer), fields(path = %path.display()))]
    pub async fn upload(&self, path: &Path, observer: &dyn IngestionObserver) -> UploadSession {
        let mut session = UploadSession::new();

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejecting upload while another is running");
            self.finish_failed(&mut session, None, IngestError::UploadInProgress, observer)
                .await;
            return session;
        }
        let _guard = BusyGuard(&self.busy);

        let Some(store) = self.store.clone() else {
            self.finish_failed(
                &mut session,
                None,
                IngestError::MissingBackendConfiguration,
                observer,
            )
            .await;
            return session;
        };

        match self.run(&mut session, store.as_ref(), path, observer).await {
            Ok(()) => self.finish_succeeded(&mut session, store.as_ref(), observer).await,
            Err(e) => {
                self.finish_failed(&mut session, Some(store.as_ref()), e, observer)
                    .await
            }
        }

        session
    }

    async fn run(
        &self,
        session: &mut UploadSession,
        store: &dyn RecordStore,
        path: &Path,
        observer: &dyn IngestionObserver,
    ) -> IngestResult<()> {
        let file_name = display_file_name(path);

        session.begin(file_name.as_str())?;
        observer.on_stage_change(session.stage());

        let kind = FileKind::from_file_name(&file_name)?;

        let estimate = match kind {
            FileKind::Csv => {
                self.check_cancelled()?;
                estimate_csv_row_count(path, &file_name, self.max_estimate_bytes).await?
            }
            FileKind::Workbook => None,
        };
        debug!(file = %file_name, ?kind, ?estimate, "Prepared upload");

        self.check_cancelled()?;
        let ingestion_id = store
            .create_ingestion(NewIngestion::processing(
                file_name.as_str(),
                estimate.map(to_db_count),
            ))
            .await
            .map_err(IngestError::IngestionRecordCreationFailed)?;

        session.start_uploading(ingestion_id, estimate)?;
        observer.on_stage_change(session.stage());
        info!(%ingestion_id, file = %file_name, "Created ingestion record");

        let mut source = open_row_source(path, kind, &file_name, self.chunk_size).await?;
        if let Some(total) = source.total_rows() {
            session.set_total_rows(total);
            observer.on_progress(session.processed_rows(), session.total_rows());
        }

        let mut chunk_index = 0usize;
        loop {
            self.check_cancelled()?;
            let Some(rows) = source.next_batch().await? else {
                break;
            };
            chunk_index += 1;

            let records = transform_rows(&rows, ingestion_id, &file_name);
            if records.is_empty() {
                debug!(chunk_index, rows = rows.len(), "Chunk had no non-empty rows");
                continue;
            }

            self.check_cancelled()?;
            store
                .insert_leads(&records)
                .await
                .map_err(|source| IngestError::ChunkWriteFailed {
                    chunk_index,
                    processed_rows: session.processed_rows(),
                    source,
                })?;

            let processed = session.record_chunk(records.len() as u64);
            observer.on_progress(processed, session.total_rows());
            debug!(
                chunk_index,
                inserted = records.len(),
                processed,
                total = ?session.total_rows(),
                "Committed chunk"
            );

            self.persist_progress(store, ingestion_id, session).await;
        }

        if session.total_rows().is_none() {
            session.set_total_rows(session.processed_rows());
            observer.on_progress(session.processed_rows(), session.total_rows());
            self.persist_progress(store, ingestion_id, session).await;
        }

        Ok(())
    }

    /// Write the current counts to the ingestion record. Failures are logged only.
    async fn persist_progress(&self, store: &dyn RecordStore, id: Uuid, session: &UploadSession) {
        let update = IngestionUpdate::progress(
            to_db_count(session.processed_rows()),
            session.total_rows().map(to_db_count),
        );

        if let Err(e) = store.update_ingestion(id, update).await {
            let e = IngestError::ProgressPersistFailed(e);
            warn!(ingestion_id = %id, error = %e, "Continuing without progress update");
        }
    }

    async fn finish_succeeded(
        &self,
        session: &mut UploadSession,
        store: &dyn RecordStore,
        observer: &dyn IngestionObserver,
    ) {
        let processed = session.processed_rows();
        let total = session.total_rows().unwrap_or(processed);

        if let Some(id) = session.ingestion_id() {
            let update =
                IngestionUpdate::succeeded(to_db_count(processed), to_db_count(total), Utc::now());
            if let Err(e) = store.update_ingestion(id, update).await {
                warn!(ingestion_id = %id, error = %e, "Failed to mark ingestion succeeded");
            }
        }

        if let Err(e) = session.succeed() {
            error!(error = %e, "Upload finished in an unexpected stage");
            return;
        }
        observer.on_stage_change(session.stage());

        let file_name = session.file_name().unwrap_or_default();
        info!(
            ingestion_id = ?session.ingestion_id(),
            file = %file_name,
            processed,
            "Lead ingestion succeeded"
        );
        observer.on_notification(&Notification::success(success_message(processed, file_name)));
    }

    async fn finish_failed(
        &self,
        session: &mut UploadSession,
        store: Option<&dyn RecordStore>,
        err: IngestError,
        observer: &dyn IngestionObserver,
    ) {
        let message = err.to_string();

        if let (Some(store), Some(id)) = (store, session.ingestion_id()) {
            let update = IngestionUpdate::failed(to_db_count(session.processed_rows()), &message);
            if let Err(e) = store.update_ingestion(id, update).await {
                warn!(ingestion_id = %id, error = %e, "Failed to mark ingestion failed");
            }
        }

        error!(
            ingestion_id = ?session.ingestion_id(),
            processed = session.processed_rows(),
            error = %message,
            "Lead ingestion failed"
        );

        if let Err(e) = session.fail(message.as_str()) {
            error!(error = %e, "Upload failed in an unexpected stage");
            return;
        }
        observer.on_stage_change(session.stage());
        observer.on_notification(&Notification::error(message));
    }

    fn check_cancelled(&self) -> IngestResult<()> {
        if self.cancel.is_cancelled() {
            Err(IngestError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn to_db_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// `Ingested 1,200 lead records from leads.xlsx`
pub fn success_message(processed: u64, file_name: &str) -> String {
    format!(
        "Ingested {} lead records from {}",
        format_count(processed),
        file_name
    )
}

/// Group digits in threes: `1234567` → `1,234,567`
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
