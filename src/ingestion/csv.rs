//! Streaming CSV/TSV ingestion.
//!
//! The reader keeps one reusable record buffer, so memory use does not grow with the
//! size of the upload; only the report itself (accepted rows and row errors) grows.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use log::{debug, trace};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FieldSchema, IngestionReport, RowError};

use super::unified::IngestionOptions;
use super::validate::{COLUMN_COUNT_MISMATCH, validate_row};

/// Trimmed column names of the header row, with a name -> position index.
#[derive(Debug, Clone)]
pub struct Header {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Header {
    /// Build a header from raw cells.
    ///
    /// Fails with [`IngestionError::MalformedHeader`] when there are no cells, every cell is
    /// blank, a single cell is blank, or two cells share a name after trimming.
    pub fn parse<'c>(cells: impl IntoIterator<Item = &'c str>) -> IngestionResult<Self> {
        let names: Vec<String> = cells.into_iter().map(|c| c.trim().to_owned()).collect();

        if names.iter().all(|n| n.is_empty()) {
            return Err(IngestionError::MalformedHeader {
                message: "header row is empty".to_string(),
            });
        }

        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(IngestionError::MalformedHeader {
                    message: format!("blank column name at position {}", idx + 1),
                });
            }
            match positions.entry(name.clone()) {
                Entry::Occupied(_) => {
                    return Err(IngestionError::MalformedHeader {
                        message: format!("duplicate column name '{name}'"),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
            }
        }

        Ok(Self { names, positions })
    }

    /// Column names in input order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a column by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}

/// One data row viewed as an ordered mapping from column name to raw cell text.
///
/// Borrows the header and the reader's record buffer; it only lives while its row is
/// being validated.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    header: &'a Header,
    record: &'a csv::StringRecord,
}

impl<'a> RawRecord<'a> {
    pub fn new(header: &'a Header, record: &'a csv::StringRecord) -> Self {
        Self { header, record }
    }

    /// Raw (untrimmed) value of a column, or `None` if the header has no such column.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.header.position(name).and_then(|idx| self.record.get(idx))
    }

    pub fn len(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// `(column, raw value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.header
            .names
            .iter()
            .map(String::as_str)
            .zip(self.record.iter())
    }
}

/// Ingest a CSV file into an [`IngestionReport`] using the delimiter from `options`.
///
/// Most callers should prefer [`super::ingest_from_path`], which also infers the
/// delimiter from the file extension and notifies the configured observer.
pub fn ingest_csv_from_path(
    path: impl AsRef<Path>,
    schema: &FieldSchema,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport> {
    schema.validate()?;
    let file = std::fs::File::open(path)?;
    ingest_csv_from_reader(file, schema, options)
}

/// Ingest delimited text from any byte stream.
///
/// Rules:
///
/// - The schema is validated before anything is read from `reader`.
/// - The first non-empty line is the header; cells are trimmed, must be non-blank and unique.
/// - Rows whose cell count differs from the header are rejected, not fatal.
/// - Every schema field of a row is checked, then the row is either accepted whole or
///   rejected whole.
/// - Invalid UTF-8 anywhere fails the call; so does passing the deadline in `options`.
///
/// `reader` is only borrowed for the duration of the call when passed as `&mut R`.
pub fn ingest_csv_from_reader<R: Read>(
    reader: R,
    schema: &FieldSchema,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport> {
    schema.validate()?;
    options.validate()?;
    let deadline = options.effective_deadline(Instant::now());

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(reader);

    let header = Header::parse(rdr.headers()?.iter())?;
    debug!(
        "ingest: header has {} columns, schema has {} fields",
        header.len(),
        schema.fields.len()
    );

    let mut report = IngestionReport::default();
    let mut record = csv::StringRecord::new();
    let mut row_index = 0usize;

    loop {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                debug!("ingest: deadline passed after {row_index} rows");
                return Err(IngestionError::Timeout { rows_read: row_index });
            }
        }

        if !rdr.read_record(&mut record)? {
            break;
        }
        row_index += 1;

        if record.len() != header.len() {
            trace!(
                "ingest: row {row_index} has {} cells, expected {}",
                record.len(),
                header.len()
            );
            report.push_rejected([RowError::row(row_index, COLUMN_COUNT_MISMATCH)]);
            continue;
        }

        let raw = RawRecord::new(&header, &record);
        match validate_row(row_index, &raw, schema, &options.date_format) {
            Ok(validated) => report.push_accepted(validated),
            Err(errors) => {
                trace!("ingest: row {row_index} rejected with {} errors", errors.len());
                report.push_rejected(errors);
            }
        }
    }

    debug!(
        "ingest: {} rows read, {} accepted, {} rejected",
        report.total_rows(),
        report.accepted().len(),
        report.rejected_count()
    );
    Ok(report)
}
