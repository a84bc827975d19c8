//! Streaming CSV source
//!
//! Records are pulled from the file only when the writer asks for the next
//! batch, so parsing never runs ahead of the bulk inserts. Bytes that are not
//! valid UTF-8 are replaced with U+FFFD instead of failing the upload.

use async_trait::async_trait;
use csv_async::{AsyncReader, AsyncReaderBuilder, ByteRecord};
use std::path::Path;
use tokio::fs::File;
use tracing::debug;

use super::{unique_headers, RowSource};
use crate::error::{IngestError, IngestResult};
use crate::normalize::{CellValue, Row};

pub struct CsvRowSource {
    reader: AsyncReader<File>,
    headers: Vec<String>,
    file_name: String,
    chunk_size: usize,
    record: ByteRecord,
    exhausted: bool,
}

impl CsvRowSource {
    /// Open the file and read its header line
    pub async fn open(path: &Path, file_name: &str, chunk_size: usize) -> IngestResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| IngestError::read(file_name, e))?;

        let mut reader = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .create_reader(file);

        let headers = unique_headers(
            reader
                .byte_headers()
                .await
                .map_err(|e| IngestError::read(file_name, e))?
                .iter()
                .map(String::from_utf8_lossy),
        );

        Ok(Self {
            reader,
            headers,
            file_name: file_name.to_string(),
            chunk_size: chunk_size.max(1),
            record: ByteRecord::new(),
            exhausted: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn record_to_row(&self) -> Row {
        if self.record.len() > self.headers.len() {
            debug!(
                line = self.record.position().map(|p| p.line()),
                extra = self.record.len() - self.headers.len(),
                "Dropping fields beyond the header"
            );
        }

        self.headers
            .iter()
            .zip(self.record.iter())
            .map(|(header, field)| {
                (header.as_str(), CellValue::from(String::from_utf8_lossy(field).as_ref()))
            })
            .collect()
    }
}

#[async_trait]
impl RowSource for CsvRowSource {
    async fn next_batch(&mut self) -> IngestResult<Option<Vec<Row>>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut batch = Vec::with_capacity(self.chunk_size);
        while batch.len() < self.chunk_size {
            let has_record = self
                .reader
                .read_byte_record(&mut self.record)
                .await
                .map_err(|e| IngestError::read(&self.file_name, e))?;

            if !has_record {
                self.exhausted = true;
                break;
            }
            batch.push(self.record_to_row());
        }

        if batch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(batch))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        csv_bytes(contents.as_bytes())
    }

    fn csv_bytes(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[tokio::test]
    async fn test_batches_respect_chunk_size() {
        let mut contents = String::from("email\n");
        for i in 0..5 {
            contents.push_str(&format!("user{i}@x.com\n"));
        }
        let file = csv_file(&contents);

        let mut source = CsvRowSource::open(file.path(), "leads.csv", 2).await.unwrap();
        let mut sizes = Vec::new();
        while let Some(batch) = source.next_batch().await.unwrap() {
            sizes.push(batch.len());
        }

        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(source.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_short_and_long_records() {
        let file = csv_file("first,last,email\nAda\nAlan,Turing,alan@x.com,extra\n");
        let mut source = CsvRowSource::open(file.path(), "leads.csv", 10).await.unwrap();
        let batch = source.next_batch().await.unwrap().unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].keys().collect::<Vec<_>>(), vec!["first"]);
        assert_eq!(batch[1].len(), 3);
        assert_eq!(batch[1].get("email"), Some(&CellValue::from("alan@x.com")));
    }

    #[tokio::test]
    async fn test_duplicate_headers_are_renamed() {
        let file = csv_file("email,email\na@x.com,b@x.com\n");
        let mut source = CsvRowSource::open(file.path(), "leads.csv", 10).await.unwrap();
        assert_eq!(source.headers(), ["email", "email_1"]);

        let batch = source.next_batch().await.unwrap().unwrap();
        assert_eq!(batch[0].get("email_1"), Some(&CellValue::from("b@x.com")));
    }

    #[tokio::test]
    async fn test_header_only_file_has_no_batches() {
        let file = csv_file("first,last\n");
        let mut source = CsvRowSource::open(file.path(), "leads.csv", 10).await.unwrap();
        assert!(source.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let file = csv_bytes(b"first,\xe9mail\nJos\xe9,jose@x.com\n");
        let mut source = CsvRowSource::open(file.path(), "leads.csv", 10).await.unwrap();
        assert_eq!(source.headers(), ["first", "\u{FFFD}mail"]);

        let batch = source.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].get("first"), Some(&CellValue::from("Jos\u{FFFD}")));
    }
}
