//! Heuristic mapping of arbitrary column names onto canonical lead fields
//!
//! Column names are compared after lower-casing and dropping every character
//! outside `[a-z0-9]`, so `"Phone Number"`, `"phone_number"` and
//! `"PHONE-NUMBER"` all resolve to `phonenumber`.

use std::collections::HashMap;

use super::cell::Row;

pub const FIRST_NAME_KEYS: &[&str] = &["first_name", "firstname", "first", "givenname"];
pub const LAST_NAME_KEYS: &[&str] = &["last_name", "lastname", "last", "surname", "familyname"];
pub const EMAIL_KEYS: &[&str] = &["email", "email_address", "emailaddress", "primaryemail"];
pub const PHONE_KEYS: &[&str] = &[
    "phone",
    "phone_number",
    "phonenumber",
    "mobile",
    "mobilephone",
    "contactnumber",
    "cell",
];
pub const COMPANY_KEYS: &[&str] = &[
    "company",
    "company_name",
    "organization",
    "organisation",
    "org",
    "brand",
    "employer",
];

/// The five lead attributes recognized in any upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    FirstName,
    LastName,
    Email,
    Phone,
    Company,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::FirstName,
        CanonicalField::LastName,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Company,
    ];

    /// Candidate column names, highest priority first
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            CanonicalField::FirstName => FIRST_NAME_KEYS,
            CanonicalField::LastName => LAST_NAME_KEYS,
            CanonicalField::Email => EMAIL_KEYS,
            CanonicalField::Phone => PHONE_KEYS,
            CanonicalField::Company => COMPANY_KEYS,
        }
    }
}

/// Lower-case and keep only ASCII letters and digits
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Normalized column name → original column name, first occurrence wins
#[derive(Debug, Clone, Default)]
pub struct KeyLookup {
    keys: HashMap<String, String>,
}

impl KeyLookup {
    pub fn build(row: &Row) -> Self {
        let mut keys = HashMap::with_capacity(row.len());
        for key in row.keys() {
            keys.entry(normalize_key(key))
                .or_insert_with(|| key.to_string());
        }
        Self { keys }
    }

    /// Original column name for a candidate, if the row has one
    pub fn resolve(&self, candidate: &str) -> Option<&str> {
        self.keys.get(&normalize_key(candidate)).map(String::as_str)
    }
}

/// Value of the first candidate column present in the row.
///
/// The first matching column decides the result even when its value is null
/// or blank; lower-priority candidates are not consulted.
pub fn extract_field(row: &Row, lookup: &KeyLookup, candidates: &[&str]) -> Option<String> {
    let original_key = candidates
        .iter()
        .find_map(|candidate| lookup.resolve(candidate))?;

    let text = row.get(original_key)?.to_text()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Canonical fields pulled from one sanitized row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl CanonicalFields {
    /// Build the key lookup once and extract every canonical field
    pub fn extract(row: &Row) -> Self {
        let lookup = KeyLookup::build(row);
        let mut fields = CanonicalFields::default();
        for field in CanonicalField::ALL {
            let value = extract_field(row, &lookup, field.candidates());
            match field {
                CanonicalField::FirstName => fields.first_name = value,
                CanonicalField::LastName => fields.last_name = value,
                CanonicalField::Email => fields.email = value,
                CanonicalField::Phone => fields.phone = value,
                CanonicalField::Company => fields.company = value,
            }
        }
        fields
    }
}
