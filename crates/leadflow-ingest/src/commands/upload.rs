//! `leadflow-ingest upload` command implementation

use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::progress::ProgressObserver;
use crate::session::UploadStage;
use crate::store::MemoryRecordStore;
use crate::writer::LeadIngestor;

/// Upload one file, cancelling cleanly on Ctrl-C
pub async fn run(file: &Path, chunk_size: Option<usize>, dry_run: bool) -> anyhow::Result<()> {
    let config = Config::load()?;

    let ingestor = if dry_run {
        info!("Dry run: writing to an in-memory store");
        LeadIngestor::new(Arc::new(MemoryRecordStore::new()))
            .with_chunk_size(config.ingest.chunk_size)
            .with_max_estimate_bytes(config.ingest.max_estimate_bytes)
    } else {
        LeadIngestor::from_config(&config).await?
    };
    let ingestor = match chunk_size {
        Some(size) => ingestor.with_chunk_size(size),
        None => ingestor,
    };

    let cancel = ingestor.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let observer = ProgressObserver::new(&file_name);

    let session = ingestor.upload(file, &observer).await;

    match session.stage() {
        UploadStage::Success => {
            let message = crate::writer::success_message(session.processed_rows(), &file_name);
            println!("{} {}", "✓".green(), message);
            if let Some(id) = session.ingestion_id() {
                println!("  Ingestion: {}", id);
            }
            if dry_run {
                println!("  {}", "Dry run, nothing was written".yellow());
            }
            Ok(())
        }
        _ => {
            let message = session
                .error_message()
                .unwrap_or("Upload did not complete")
                .to_string();
            if session.processed_rows() > 0 {
                eprintln!(
                    "{} {} rows were committed before the failure",
                    "!".yellow(),
                    session.processed_rows()
                );
            }
            Err(anyhow::anyhow!(message))
        }
    }
}

