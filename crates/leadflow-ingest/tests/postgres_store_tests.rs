//! Postgres record store tests using testcontainers
//!
//! These need Docker and are ignored by default:
//!
//! ```bash
//! cargo test -p leadflow-ingest --test postgres_store_tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use anyhow::{Context, Result};
use common::generated_csv;
use leadflow_common::types::{IngestionStatus, IngestionUpdate, NewIngestion};
use leadflow_ingest::config::DatabaseConfig;
use leadflow_ingest::observer::NoopObserver;
use leadflow_ingest::{LeadIngestor, PgRecordStore, RecordStore, StoreError, UploadStage};
use serial_test::serial;
use std::sync::Arc;
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;

struct TestDb {
    _container: ContainerAsync<Postgres>,
    store: PgRecordStore,
}

async fn start_db() -> Result<TestDb> {
    let container = Postgres::default()
        .start()
        .await
        .context("Failed to start PostgreSQL container")?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432.tcp()).await?;
    let url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    let store = PgRecordStore::connect(&DatabaseConfig::default(), &url).await?;
    sqlx::migrate!("../../migrations")
        .run(store.pool())
        .await
        .context("Failed to run migrations")?;

    Ok(TestDb {
        _container: container,
        store,
    })
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_ingestion_record_round_trip() {
    let db = start_db().await.unwrap();
    let store = &db.store;

    let id = store
        .create_ingestion(NewIngestion::processing("leads.csv", Some(10)))
        .await
        .unwrap();

    store
        .update_ingestion(id, IngestionUpdate::progress(5, None))
        .await
        .unwrap();

    let record = store.get_ingestion(id).await.unwrap().unwrap();
    assert_eq!(record.status, IngestionStatus::Processing);
    assert_eq!(record.processed_rows, 5);
    assert_eq!(record.total_rows, Some(10));
    assert_eq!(record.completed_at, None);

    store
        .update_ingestion(id, IngestionUpdate::failed(5, "boom"))
        .await
        .unwrap();
    let record = store.get_ingestion(id).await.unwrap().unwrap();
    assert_eq!(record.status, IngestionStatus::Failed);
    assert_eq!(record.error.as_deref(), Some("boom"));

    let missing = store
        .update_ingestion(uuid::Uuid::new_v4(), IngestionUpdate::progress(1, None))
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_upload_into_postgres() {
    let db = start_db().await.unwrap();
    let store = Arc::new(db.store.clone());
    let ingestor = LeadIngestor::new(store.clone());
    let file = generated_csv("leads.csv", 1200);

    let session = ingestor.upload(&file.path, &NoopObserver).await;
    assert_eq!(session.stage(), UploadStage::Success);

    let id = session.ingestion_id().unwrap();
    let record = store.get_ingestion(id).await.unwrap().unwrap();
    assert_eq!(record.status, IngestionStatus::Succeeded);
    assert_eq!(record.processed_rows, 1200);
    assert_eq!(record.total_rows, Some(1200));
    assert!(record.completed_at.is_some());

    let (count, hashed): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(hashed_phone) FROM leads WHERE ingestion_id = $1",
    )
    .bind(id)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(count, 1200);
    assert_eq!(hashed, 1200);

    let listed = store.list_ingestions(5).await.unwrap();
    assert_eq!(listed[0].id, id);
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_failed_batch_inserts_nothing() {
    let db = start_db().await.unwrap();
    let store = &db.store;

    // Leads must reference an existing ingestion, so the whole batch is rejected
    let orphan = leadflow_common::types::NormalizedLeadRecord {
        ingestion_id: uuid::Uuid::new_v4(),
        source_filename: "leads.csv".to_string(),
        first_name: Some("Ada".to_string()),
        last_name: None,
        email: None,
        phone: None,
        company: None,
        hashed_phone: None,
        raw_payload: serde_json::Map::new(),
    };

    let result = store.insert_leads(&[orphan.clone(), orphan]).await;
    assert!(matches!(result, Err(StoreError::Sqlx(_))));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}
