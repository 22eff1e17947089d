//! Core data model types for ingestion.
//!
//! Callers describe the expected shape of an upload with a [`FieldSchema`] (a list of typed
//! [`FieldSpec`]s). Ingestion turns every data row either into a [`ValidatedRecord`] or into
//! one or more [`RowError`]s, and summarizes the call in an [`IngestionReport`].

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{IngestionError, IngestionResult};

/// Logical type a field's raw text is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 text, surrounding whitespace trimmed.
    String,
    /// Base-10 64-bit signed integer.
    Integer,
    /// Exact decimal number with `.` as the decimal separator.
    Decimal,
    /// Calendar date in the configured format (ISO-8601 `YYYY-MM-DD` by default).
    Date,
}

impl FieldType {
    /// Short lowercase name, as used in schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named, typed field in a [`FieldSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name, matched against the trimmed header cells.
    pub name: String,
    /// Whether a row without a value for this field is rejected.
    #[serde(default)]
    pub required: bool,
    /// Type the raw value is coerced into.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldSpec {
    /// A field that must be present in every row.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            required: true,
            field_type,
        }
    }

    /// A field that may be absent or blank; absence yields [`Value::Null`].
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            required: false,
            field_type,
        }
    }
}

/// Ordered list of fields describing the expected shape of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Ordered list of fields.
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check that the schema is usable: non-empty, no blank names, no duplicates.
    ///
    /// Names are compared after trimming, the same way header cells are.
    pub fn validate(&self) -> IngestionResult<()> {
        if self.fields.is_empty() {
            return Err(IngestionError::InvalidSchema {
                message: "schema has no fields".to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            let name = field.name.trim();
            if name.is_empty() {
                return Err(IngestionError::InvalidSchema {
                    message: format!("field at position {idx} has a blank name"),
                });
            }
            if !seen.insert(name) {
                return Err(IngestionError::InvalidSchema {
                    message: format!("duplicate field name '{name}'"),
                });
            }
        }
        Ok(())
    }
}

/// A single typed value in a [`ValidatedRecord`].
///
/// Serializes without a type tag, so a record renders as plain JSON values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent optional field.
    Null,
    /// Trimmed text.
    String(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// Exact decimal.
    Decimal(Decimal),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A row that passed every schema check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRecord {
    /// 1-based data row number (the header is not counted).
    pub row_index: usize,
    /// Typed values keyed by field name, in schema order.
    #[serde(serialize_with = "serialize_ordered_map")]
    pub values: Vec<(String, Value)>,
}

impl ValidatedRecord {
    /// Look up a value by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

fn serialize_ordered_map<S: Serializer>(
    values: &[(String, Value)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(values.iter().map(|(k, v)| (k, v)))
}

/// One problem found in one data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based data row number (the header is not counted).
    pub row_index: usize,
    /// The offending field, or `None` for row-level problems such as a column count mismatch.
    pub field: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl RowError {
    pub(crate) fn row(row_index: usize, message: impl Into<String>) -> Self {
        Self {
            row_index,
            field: None,
            message: message.into(),
        }
    }

    pub(crate) fn field(row_index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row_index,
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "row {} field '{}': {}", self.row_index, field, self.message),
            None => write!(f, "row {}: {}", self.row_index, self.message),
        }
    }
}

/// How a caller treats rejected rows when answering an upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
    /// Any completed ingestion is a success, even with rejected rows.
    #[default]
    Lenient,
    /// A report with at least one rejected row is a client error.
    StrictRows,
}

/// Summary of one ingestion call.
///
/// Built while rows stream through the service and handed to the caller by value; the
/// fields are only readable, so `total_rows == accepted().len() + rejected_count()` always
/// holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IngestionReport {
    total_rows: usize,
    accepted: Vec<ValidatedRecord>,
    rejected_count: usize,
    errors: Vec<RowError>,
}

impl IngestionReport {
    /// Number of data rows read (header excluded).
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Accepted rows, in input order.
    pub fn accepted(&self) -> &[ValidatedRecord] {
        &self.accepted
    }

    /// Number of rejected rows.
    pub fn rejected_count(&self) -> usize {
        self.rejected_count
    }

    /// Every row error, in row order and then schema field order.
    pub fn errors(&self) -> &[RowError] {
        &self.errors
    }

    /// `true` when every row was accepted.
    pub fn is_clean(&self) -> bool {
        self.rejected_count == 0
    }

    /// Take ownership of the accepted rows, e.g. to hand them to a persistence layer.
    pub fn into_accepted(self) -> Vec<ValidatedRecord> {
        self.accepted
    }

    /// HTTP status code for a completed ingestion under `policy`.
    pub fn status_code(&self, policy: RejectionPolicy) -> u16 {
        match policy {
            RejectionPolicy::StrictRows if self.rejected_count > 0 => 422,
            _ => 200,
        }
    }

    pub(crate) fn push_accepted(&mut self, record: ValidatedRecord) {
        self.total_rows += 1;
        self.accepted.push(record);
    }

    pub(crate) fn push_rejected(&mut self, errors: impl IntoIterator<Item = RowError>) {
        self.total_rows += 1;
        self.rejected_count += 1;
        self.errors.extend(errors);
    }
}
