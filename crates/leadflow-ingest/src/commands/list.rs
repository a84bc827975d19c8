//! `leadflow-ingest list` command implementation

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

use super::connect_store;
use super::status::{colored_status, progress_text};
use crate::config::Config;
use crate::store::RecordStore;

/// Print the most recent ingestion records
pub async fn run(limit: i64) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = connect_store(&config).await?;

    let records = store.list_ingestions(limit).await?;
    if records.is_empty() {
        println!("No ingestions found.");
        println!("Run 'leadflow-ingest upload <FILE>' to load leads.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["ID", "File", "Status", "Progress", "Created"]);

    for record in &records {
        table.add_row(vec![
            record.id.to_string(),
            record.filename.clone(),
            colored_status(record.status),
            progress_text(record),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}
