//! `leadflow-ingest status` command implementation

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use leadflow_common::types::{IngestionRecord, IngestionStatus};
use uuid::Uuid;

use super::connect_store;
use crate::config::Config;
use crate::store::{RecordStore, StoreError};

/// Print one ingestion record
pub async fn run(id: Uuid) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = connect_store(&config).await?;

    let record = store
        .get_ingestion(id)
        .await?
        .ok_or(StoreError::NotFound(id))?;

    println!("{}", render_record(&record));
    Ok(())
}

pub(crate) fn colored_status(status: IngestionStatus) -> String {
    match status {
        IngestionStatus::Processing => status.as_str().yellow().to_string(),
        IngestionStatus::Succeeded => status.as_str().green().to_string(),
        IngestionStatus::Failed => status.as_str().red().to_string(),
    }
}

/// Progress column text, e.g. `500 / 1200 (42%)`
pub(crate) fn progress_text(record: &IngestionRecord) -> String {
    match record.total_rows {
        Some(total) if total > 0 => {
            let percent = ((record.processed_rows as f64 / total as f64) * 100.0)
                .round()
                .min(100.0);
            format!("{} / {} ({}%)", record.processed_rows, total, percent as i64)
        }
        Some(total) => format!("{} / {}", record.processed_rows, total),
        None => format!("{} / ?", record.processed_rows),
    }
}

fn render_record(record: &IngestionRecord) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    table.add_row(vec!["ID".to_string(), record.id.to_string()]);
    table.add_row(vec!["File".to_string(), record.filename.clone()]);
    table.add_row(vec!["Status".to_string(), colored_status(record.status)]);
    table.add_row(vec!["Progress".to_string(), progress_text(record)]);
    table.add_row(vec!["Created".to_string(), record.created_at.to_rfc3339()]);

    if let Some(completed_at) = record.completed_at {
        table.add_row(vec!["Completed".to_string(), completed_at.to_rfc3339()]);
    }
    if let Some(ref error) = record.error {
        table.add_row(vec!["Error".to_string(), error.clone()]);
    }

    table
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(processed_rows: i64, total_rows: Option<i64>) -> IngestionRecord {
        IngestionRecord {
            id: Uuid::new_v4(),
            filename: "leads.csv".to_string(),
            status: IngestionStatus::Failed,
            total_rows,
            processed_rows,
            error: Some("duplicate key".to_string()),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_progress_text() {
        assert_eq!(progress_text(&record(500, Some(1200))), "500 / 1200 (42%)");
        assert_eq!(progress_text(&record(0, Some(0))), "0 / 0");
        assert_eq!(progress_text(&record(10, None)), "10 / ?");
    }

    #[test]
    fn test_render_includes_error() {
        let rendered = render_record(&record(500, Some(1200))).to_string();
        assert!(rendered.contains("leads.csv"));
        assert!(rendered.contains("duplicate key"));
    }
}
