//! Spreadsheet cells and rows
//!
//! A [`Row`] is an ordered mapping of column name to [`CellValue`]. Column
//! order follows the source header and is preserved into `raw_payload`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// One cell as read from a CSV or workbook
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    String(String),
    Number(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

impl CellValue {
    /// Blank means null or whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Clean a single cell value
    ///
    /// Text loses every byte-order mark and surrounding whitespace and becomes
    /// null when nothing is left. Non-finite numbers become null. Date-times
    /// become ISO-8601 text.
    pub fn sanitize(&self) -> CellValue {
        match self {
            CellValue::String(s) => {
                let cleaned: String = s.chars().filter(|c| *c != BYTE_ORDER_MARK).collect();
                let cleaned = cleaned.trim();
                if cleaned.is_empty() {
                    CellValue::Null
                } else {
                    CellValue::String(cleaned.to_string())
                }
            }
            CellValue::Number(n) if n.is_finite() => CellValue::Number(*n),
            CellValue::Number(_) => CellValue::Null,
            CellValue::DateTime(dt) => CellValue::String(format_iso(dt)),
            CellValue::Bool(b) => CellValue::Bool(*b),
            CellValue::Null => CellValue::Null,
        }
    }

    /// Text form used when a non-string cell feeds a canonical field
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::DateTime(dt) => Some(format_iso(dt)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::String(s) => Value::String(s.clone()),
            CellValue::Number(n) => number_to_json(*n),
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::DateTime(dt) => Value::String(format_iso(dt)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn format_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Shortest round-trip form. Magnitudes outside `[1e-6, 1e21)` switch to
/// exponent notation with an explicit sign (`1e+21`, `5e-7`).
fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", n);
    }

    let exponent = format!("{:e}", n);
    match exponent.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => exponent,
    }
}

fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Ordered mapping of column name to cell value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// JSON object in column order, as stored in `raw_payload`
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.cells
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

/// Trim every key (whitespace and byte-order marks) and sanitize every value
pub fn sanitize_row(row: &Row) -> Row {
    row.iter()
        .map(|(key, value)| (trim_key(key).to_string(), value.sanitize()))
        .collect()
}

fn trim_key(key: &str) -> &str {
    key.trim_matches(|c: char| c.is_whitespace() || c == BYTE_ORDER_MARK)
}

/// A row is empty when every value is null or whitespace-only text
pub fn is_row_empty(row: &Row) -> bool {
    row.iter().all(|(_, value)| value.is_blank())
}
