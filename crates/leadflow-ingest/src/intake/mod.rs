//! File intake and row estimation
//!
//! Detects the file format from its extension, estimates how many data rows
//! a CSV holds, and opens a [`RowSource`] that hands the writer batches of
//! rows. CSV sources stream; workbook sources parse the first sheet up front.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::{IngestError, IngestResult};
use crate::normalize::Row;

pub mod csv;
pub mod workbook;

pub use self::csv::CsvRowSource;
pub use self::workbook::WorkbookRowSource;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    /// `.xlsx` or legacy `.xls`
    Workbook,
}

impl FileKind {
    /// Classify a file by its (case-insensitive) extension
    pub fn from_file_name(file_name: &str) -> IngestResult<Self> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" | "xls" => Ok(FileKind::Workbook),
            _ => Err(IngestError::UnsupportedFileType {
                file_name: file_name.to_string(),
            }),
        }
    }
}

/// Lazy, finite, non-restartable sequence of row batches
#[async_trait]
pub trait RowSource: Send {
    /// Next batch of at most `chunk_size` rows, or `None` once the source is exhausted
    async fn next_batch(&mut self) -> IngestResult<Option<Vec<Row>>>;

    /// Row count known from parsing, if the source buffers the whole sheet
    fn total_rows(&self) -> Option<u64> {
        None
    }
}

/// Open the row source matching `kind`
pub async fn open_row_source(
    path: &Path,
    kind: FileKind,
    file_name: &str,
    chunk_size: usize,
) -> IngestResult<Box<dyn RowSource>> {
    match kind {
        FileKind::Csv => Ok(Box::new(CsvRowSource::open(path, file_name, chunk_size).await?)),
        FileKind::Workbook => Ok(Box::new(
            WorkbookRowSource::load(path, file_name, chunk_size).await?,
        )),
    }
}

/// Estimate the number of data rows in a CSV file.
///
/// Files above `max_bytes` are not read and yield `None`. Otherwise the
/// count is the number of non-blank lines minus the header, floored at zero.
pub async fn estimate_csv_row_count(
    path: &Path,
    file_name: &str,
    max_bytes: u64,
) -> IngestResult<Option<u64>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| IngestError::read(file_name, e))?;

    if metadata.len() > max_bytes {
        debug!(
            size = metadata.len(),
            max_bytes, "Skipping CSV row estimate for large file"
        );
        return Ok(None);
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| IngestError::read(file_name, e))?;

    Ok(Some(count_data_lines(&String::from_utf8_lossy(&bytes))))
}

/// Non-blank lines (split on `\r\n`, `\n` or `\r`) minus one header line
pub fn count_data_lines(text: &str) -> u64 {
    let lines = text
        .split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
        .count() as u64;
    lines.saturating_sub(1)
}

/// Make header names usable as row keys.
///
/// Blank headers become `__EMPTY`; repeated names get `_1`, `_2`, ...
/// suffixes so no column is silently overwritten.
pub fn unique_headers<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for header in headers {
        let base = match header.as_ref() {
            h if h.trim().is_empty() => "__EMPTY".to_string(),
            h => h.to_string(),
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        out.push(candidate);
    }

    out
}
