//! Buffered workbook source (`.xlsx` / `.xls`)
//!
//! The first worksheet is parsed completely before the first batch is
//! handed out, which also gives an exact row count.

use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{DateTime, Utc};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use super::{unique_headers, RowSource};
use crate::error::{IngestError, IngestResult};
use crate::normalize::{CellValue, Row};

pub struct WorkbookRowSource {
    rows: std::vec::IntoIter<Row>,
    total: u64,
    chunk_size: usize,
}

impl WorkbookRowSource {
    /// Read the file and parse its first sheet on the blocking pool
    pub async fn load(path: &Path, file_name: &str, chunk_size: usize) -> IngestResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IngestError::read(file_name, e))?;

        let owned_name = file_name.to_string();
        let rows = tokio::task::spawn_blocking(move || parse_first_sheet(bytes, &owned_name))
            .await
            .map_err(|e| IngestError::read(file_name, e))??;

        Ok(Self::from_rows(rows, chunk_size))
    }

    pub fn from_rows(rows: Vec<Row>, chunk_size: usize) -> Self {
        Self {
            total: rows.len() as u64,
            rows: rows.into_iter(),
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl RowSource for WorkbookRowSource {
    async fn next_batch(&mut self) -> IngestResult<Option<Vec<Row>>> {
        let batch: Vec<Row> = self.rows.by_ref().take(self.chunk_size).collect();
        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }

    fn total_rows(&self) -> Option<u64> {
        Some(self.total)
    }
}

/// Parse the first worksheet into rows keyed by the header row.
///
/// Every header is present in every row (missing cells are null) and rows
/// with no cell values at all are skipped.
pub fn parse_first_sheet(bytes: Vec<u8>, file_name: &str) -> IngestResult<Vec<Row>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| IngestError::read(file_name, e))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::read(file_name, e))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers = unique_headers(header_row.iter().map(|cell| cell.to_string().trim().to_string()));

    let rows: Vec<Row> = sheet_rows
        .filter(|cells| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let value = cells.get(i).map(cell_value).unwrap_or(CellValue::Null);
                    (header.as_str(), value)
                })
                .collect()
        })
        .collect();

    debug!(sheet = %sheet_name, rows = rows.len(), "Parsed worksheet");
    Ok(rows)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
    }
}
