//! Row normalization engine
//!
//! Turns raw spreadsheet rows into [`NormalizedLeadRecord`]s: sanitize,
//! drop empty rows, map columns onto canonical fields, then derive the
//! phone digest.

pub mod cell;
pub mod fields;

pub use cell::{is_row_empty, sanitize_row, CellValue, Row};
pub use fields::{extract_field, normalize_key, CanonicalField, CanonicalFields, KeyLookup};

use leadflow_common::privacy::phone_fingerprint;
use leadflow_common::types::NormalizedLeadRecord;
use uuid::Uuid;

/// Normalize one raw row. Returns `None` for rows that are empty after sanitizing.
pub fn transform_row(raw: &Row, ingestion_id: Uuid, file_name: &str) -> Option<NormalizedLeadRecord> {
    let sanitized = sanitize_row(raw);
    if is_row_empty(&sanitized) {
        return None;
    }

    let fields = CanonicalFields::extract(&sanitized);
    let (phone, hashed_phone) = phone_fingerprint(fields.phone.as_deref());

    Some(NormalizedLeadRecord {
        ingestion_id,
        source_filename: file_name.to_string(),
        first_name: fields.first_name,
        last_name: fields.last_name,
        email: fields.email.map(|email| email.to_lowercase()),
        phone,
        company: fields.company,
        hashed_phone,
        raw_payload: sanitized.to_json_map(),
    })
}

/// Normalize a batch, preserving source order and skipping empty rows
pub fn transform_rows(rows: &[Row], ingestion_id: Uuid, file_name: &str) -> Vec<NormalizedLeadRecord> {
    rows.iter()
        .filter_map(|row| transform_row(row, ingestion_id, file_name))
        .collect()
}
