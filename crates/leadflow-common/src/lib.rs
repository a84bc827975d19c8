//! Leadflow Common Library
//!
//! Shared types, utilities, and error handling for the Leadflow workspace.
//!
//! # Overview
//!
//! - **Error Handling**: Custom error types and result types
//! - **Privacy**: Phone normalization and one-way digests for dedup matching
//! - **Logging**: Centralized `tracing` subscriber setup
//! - **Types**: Ingestion and lead records shared by stores and the pipeline
//!
//! # Example
//!
//! ```
//! use leadflow_common::privacy::{hash_phone, normalize_phone};
//!
//! let digits = normalize_phone(Some("(555) 123-4567")).unwrap_or_default();
//! assert_eq!(digits, "5551234567");
//! assert_eq!(hash_phone(&digits).len(), 64);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod privacy;
pub mod types;

// Re-export commonly used types
pub use error::{LeadflowError, Result};
