//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest`] or [`ingest_with_options`] (from [`unified`]) which:
//!
//! - stream delimited text from any [`std::io::Read`] into an [`crate::types::IngestionReport`]
//! - validate each row against a [`crate::types::FieldSchema`]
//! - optionally report success/failure/alerts to an [`IngestionObserver`]
//!
//! Also available:
//! - [`csv`]: the streaming reader, [`csv::Header`] and [`csv::RawRecord`]
//! - [`profile`]: JSON upload profiles bundling a schema with options
//! - [`batch`]: several uploads on a worker pool

pub mod batch;
pub mod csv;
pub mod observability;
pub mod profile;
pub mod unified;
mod validate;

pub use batch::{BatchOptions, ingest_batch};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    LogObserver,
};
pub use profile::UploadProfile;
pub use unified::{
    DEFAULT_DELIMITER, DelimitedFormat, IngestionOptions, IngestionRequest, ingest, ingest_from_path,
    ingest_with_options, severity_for_error,
};
pub use validate::DEFAULT_DATE_FORMAT;
