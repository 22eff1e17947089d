//! `tabular-ingestion` validates delimited bulk uploads (CSV/TSV with a header row) against a
//! caller-supplied [`types::FieldSchema`] and summarizes the result in a
//! [`types::IngestionReport`].
//!
//! The primary entrypoint is [`ingestion::ingest`], which takes any byte stream (an uploaded
//! request body, a file, a slice) plus a schema. Options such as the delimiter, the date
//! format, a deadline and an observer go through [`ingestion::ingest_with_options`].
//!
//! ## What ingestion does
//!
//! - The header row is read first; cells are trimmed and must be non-blank and unique.
//! - Every following row is mapped to its columns and checked against each schema field:
//!   required fields must be present, values are coerced to the declared
//!   [`types::FieldType`] (`string`, `integer`, `decimal`, `date`).
//! - Rows with any problem are rejected whole and described by [`types::RowError`]s;
//!   the remaining rows become [`types::ValidatedRecord`]s, in input order.
//! - Rows are streamed: the input is never buffered whole.
//!
//! Call-level problems (bad schema, bad header, invalid UTF-8, deadline exceeded) fail the
//! whole call with an [`IngestionError`] and no report.
//!
//! Nothing is persisted, and there are no cross-row or referential checks; those belong to
//! the caller, after it receives the report.
//!
//! ## Quick example
//!
//! ```rust
//! use tabular_ingestion::ingestion::ingest;
//! use tabular_ingestion::types::{FieldSchema, FieldSpec, FieldType, RejectionPolicy};
//!
//! # fn main() -> Result<(), tabular_ingestion::IngestionError> {
//! let schema = FieldSchema::new(vec![
//!     FieldSpec::required("name", FieldType::String),
//!     FieldSpec::required("age", FieldType::Integer),
//!     FieldSpec::optional("balance", FieldType::Decimal),
//! ]);
//!
//! let upload = "name,age,balance\nAlice,30,12.50\nBob,notanumber,\n";
//! let report = ingest(upload.as_bytes(), &schema)?;
//!
//! assert_eq!(report.total_rows(), 2);
//! assert_eq!(report.accepted().len(), 1);
//! assert_eq!(report.rejected_count(), 1);
//! assert_eq!(report.status_code(RejectionPolicy::StrictRows), 422);
//!
//! // The report is plain data; an HTTP layer can serialize it directly.
//! let body = serde_json::to_string(&report).unwrap();
//! assert!(body.contains(r#""errors":[{"row_index":2,"field":"age","message":"invalid integer"}]"#));
//! # Ok(())
//! # }
//! ```
//!
//! ## Mapping errors to responses
//!
//! ```rust
//! use tabular_ingestion::ingestion::ingest;
//! use tabular_ingestion::types::{FieldSchema, FieldSpec, FieldType};
//!
//! let schema = FieldSchema::new(vec![FieldSpec::required("name", FieldType::String)]);
//! let err = ingest("name,name\nA,B\n".as_bytes(), &schema).unwrap_err();
//! assert_eq!(err.status_code(), 400);
//! assert_eq!(err.public_message(), "malformed header: duplicate column name 'name'");
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: entrypoints, options, profiles, observers and batch ingestion
//! - [`types`]: schema, values and report types
//! - [`error`]: the error type shared by every entrypoint

pub mod error;
pub mod ingestion;
pub mod types;

pub use error::{IngestionError, IngestionResult};
