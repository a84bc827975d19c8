//! Phone normalization and one-way digests
//!
//! Leads are matched for dedup and compliance on a SHA-256 digest of the
//! digit-only phone number. The digest is never salted, so the same digits
//! always map to the same value across uploads.

use sha2::{Digest, Sha256};

/// Strip everything but ASCII digits from a phone value.
///
/// Returns `None` for absent or empty input and when no digits remain.
pub fn normalize_phone(value: Option<&str>) -> Option<String> {
    let value = value?;
    if value.is_empty() {
        return None;
    }

    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Compute the lowercase hex SHA-256 digest of a normalized phone number
pub fn hash_phone(normalized_digits: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_digits.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize then hash in one step, yielding `(digits, digest)`
pub fn phone_fingerprint(value: Option<&str>) -> (Option<String>, Option<String>) {
    match normalize_phone(value) {
        Some(digits) => {
            let digest = hash_phone(&digits);
            (Some(digits), Some(digest))
        }
        None => (None, None),
    }
}
