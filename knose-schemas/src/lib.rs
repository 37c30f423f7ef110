//! Data formats around the knose classification engine
//!
//! ## Overview
//!
//! The engine in `knose-core` never touches I/O. This crate owns the formats
//! on either side of it:
//!
//! - [`catalog`]: heater profile catalogs as JSON files
//! - [`tree`]: the realtime store's nested layout, flattened into readings
//! - [`survey`]: structural summary of a store dump
//! - [`export`]: classified records as CSV, reports as JSON
//!
//! ## Store Layout
//!
//! ```text
//! Device_1
//! └── BME_01
//!     └── Hp_301
//!         ├── 2026-02-02_09-38-35_398398000 { gas_resistance: .., temperature: .. }
//!         └── 2026-02-02_09-38-41_401000000 { .. }
//! ```
//!
//! Every leaf record is addressed by four keys; the record body is opaque to
//! the engine and carried through as typed raw fields.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use knose_core::BatchClassifier;
//! use knose_schemas::{catalog::ProfileCatalog, export::CsvExporter, tree::flatten_tree};
//!
//! let store: serde_json::Value = serde_json::from_str(r#"{
//!     "Device_1": { "BME_01": { "Hp_301": {
//!         "2026-02-02_09-38-35_000000000": { "gas_resistance": 10342.5 },
//!         "2026-02-02_09-38-42_000000000": { "gas_resistance": 9876.0 }
//!     } } }
//! }"#)?;
//!
//! let registry = Arc::new(ProfileCatalog::bundled().into_registry()?);
//! let output = BatchClassifier::new(registry).classify_batch(flatten_tree(&store));
//!
//! let mut csv = Vec::new();
//! CsvExporter::with_record_fields(&output.records).write(&output.records, &mut csv)?;
//! assert!(String::from_utf8(csv)?.contains("2026-02-02_09-38-42_000000000"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod export;
pub mod survey;
pub mod tree;

use knose_core::ClassificationError;

/// Schema-related errors
#[derive(Debug, thiserror_no_std::Error)]
pub enum SchemaError {
    /// JSON could not be parsed or produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV could not be written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pattern could not be compiled
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Catalog content was rejected by the engine
    #[error("Invalid catalog: {0}")]
    Catalog(#[from] ClassificationError),

    /// Store tree does not have the expected shape
    #[error("Unexpected store layout at {path}: {reason}")]
    Layout {
        /// Slash-separated path of the offending node
        path: String,
        /// What was wrong
        reason: &'static str,
    },
}

/// Result type for this crate
pub type SchemaResult<T> = Result<T, SchemaError>;
