//! Subcommand implementations

pub mod list;
pub mod status;
pub mod upload;

use anyhow::Context;

use crate::config::Config;
use crate::error::IngestError;
use crate::store::PgRecordStore;

/// Connect to the configured Postgres store
pub(crate) async fn connect_store(config: &Config) -> anyhow::Result<PgRecordStore> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or(IngestError::MissingBackendConfiguration)?;

    PgRecordStore::connect(&config.database, url)
        .await
        .context("Failed to connect to the record store")
}
