//! Postgres record store
//!
//! Writes to `lead_ingestions` and `leads` (see `migrations/`). Lead batches
//! are inserted with multi-row `INSERT`s inside one transaction, so a batch
//! is either fully committed or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadflow_common::types::{
    IngestionRecord, IngestionStatus, IngestionUpdate, NewIngestion, NormalizedLeadRecord,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;

/// Rows per INSERT statement; 9 binds per row keeps us far below the
/// 65535 parameter limit.
const MAX_ROWS_PER_STATEMENT: usize = 5000;

/// Record store backed by a Postgres pool
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig, url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(url)
            .await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool created"
        );

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IngestionRow {
    id: Uuid,
    filename: String,
    status: String,
    total_rows: Option<i64>,
    processed_rows: i64,
    error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<IngestionRow> for IngestionRecord {
    type Error = StoreError;

    fn try_from(row: IngestionRow) -> Result<Self, Self::Error> {
        let status: IngestionStatus = row
            .status
            .parse()
            .map_err(|e: leadflow_common::LeadflowError| StoreError::Backend(e.to_string()))?;

        Ok(IngestionRecord {
            id: row.id,
            filename: row.filename,
            status,
            total_rows: row.total_rows,
            processed_rows: row.processed_rows,
            error: row.error,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

const SELECT_INGESTION: &str = r#"
    SELECT id, filename, status, total_rows, processed_rows, error, created_at, completed_at
    FROM lead_ingestions
"#;

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create_ingestion(&self, ingestion: NewIngestion) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO lead_ingestions (id, filename, status, total_rows, processed_rows)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&ingestion.filename)
        .bind(ingestion.status.as_str())
        .bind(ingestion.total_rows)
        .bind(ingestion.processed_rows)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_ingestion(&self, id: Uuid, update: IngestionUpdate) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE lead_ingestions
            SET status = COALESCE($2, status),
                processed_rows = COALESCE($3, processed_rows),
                total_rows = COALESCE($4, total_rows),
                error = COALESCE($5, error),
                completed_at = COALESCE($6, completed_at)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.processed_rows)
        .bind(update.total_rows)
        .bind(update.error.as_deref())
        .bind(update.completed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    async fn insert_leads(&self, leads: &[NormalizedLeadRecord]) -> StoreResult<()> {
        if leads.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for batch in leads.chunks(MAX_ROWS_PER_STATEMENT) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
                r#"
                INSERT INTO leads (
                    ingestion_id, source_filename, first_name, last_name,
                    email, phone, company, hashed_phone, raw_payload
                )
                "#,
            );

            query_builder.push_values(batch.iter(), |mut b, lead| {
                b.push_bind(lead.ingestion_id)
                    .push_bind(&lead.source_filename)
                    .push_bind(&lead.first_name)
                    .push_bind(&lead.last_name)
                    .push_bind(&lead.email)
                    .push_bind(&lead.phone)
                    .push_bind(&lead.company)
                    .push_bind(&lead.hashed_phone)
                    .push_bind(sqlx::types::Json(&lead.raw_payload));
            });

            query_builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        debug!(rows = leads.len(), "Inserted lead batch");
        Ok(())
    }

    async fn get_ingestion(&self, id: Uuid) -> StoreResult<Option<IngestionRecord>> {
        let row: Option<IngestionRow> =
            sqlx::query_as(&format!("{SELECT_INGESTION} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(IngestionRecord::try_from).transpose()
    }

    async fn list_ingestions(&self, limit: i64) -> StoreResult<Vec<IngestionRecord>> {
        let rows: Vec<IngestionRow> =
            sqlx::query_as(&format!("{SELECT_INGESTION} ORDER BY created_at DESC LIMIT $1"))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(IngestionRecord::try_from).collect()
    }
}
