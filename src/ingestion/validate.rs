//! Row validation: schema lookup and type coercion for a single [`RawRecord`].

use std::str::FromStr;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use rust_decimal::Decimal;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FieldSchema, FieldSpec, FieldType, RowError, ValidatedRecord, Value};

use super::csv::RawRecord;

pub(crate) const MISSING_REQUIRED: &str = "missing required field";
pub(crate) const COLUMN_COUNT_MISMATCH: &str = "column count mismatch";

/// Default format for [`FieldType::Date`] values (ISO-8601 calendar date).
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Fails with [`IngestionError::Config`] when chrono cannot interpret `format`.
pub(crate) fn check_date_format(format: &str) -> IngestionResult<()> {
    if format.trim().is_empty() {
        return Err(IngestionError::Config {
            message: "date format is empty".to_string(),
        });
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(IngestionError::Config {
            message: format!("unsupported date format '{format}'"),
        });
    }
    Ok(())
}

/// `[+-]digits[.digits]` or `[+-].digits`: no grouping, no exponent.
fn is_plain_decimal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    match unsigned.split_once('.') {
        Some((int, frac)) => all_digits(int) && !frac.is_empty() && all_digits(frac),
        None => !unsigned.is_empty() && all_digits(unsigned),
    }
}

/// Coerce one trimmed, non-empty raw value into `field_type`.
///
/// Dates must be written exactly as `date_format` renders them, so chrono's lenient
/// parsing (unpadded fields, signed years) does not leak through.
///
/// On failure returns the row error message for the field.
pub(crate) fn coerce(raw: &str, field_type: FieldType, date_format: &str) -> Result<Value, &'static str> {
    match field_type {
        FieldType::String => Ok(Value::String(raw.to_owned())),
        FieldType::Integer => raw
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| "invalid integer"),
        FieldType::Decimal if !is_plain_decimal(raw) => Err("invalid decimal"),
        FieldType::Decimal => Decimal::from_str(raw)
            .map(Value::Decimal)
            .map_err(|_| "invalid decimal"),
        FieldType::Date => NaiveDate::parse_from_str(raw, date_format)
            .ok()
            .filter(|date| date.format(date_format).to_string() == raw)
            .map(Value::Date)
            .ok_or("invalid date"),
    }
}

fn validate_field(
    row_index: usize,
    raw: &RawRecord<'_>,
    field: &FieldSpec,
    date_format: &str,
) -> Result<Value, RowError> {
    let name = field.name.trim();
    let value = raw.get(name).map(str::trim).filter(|v| !v.is_empty());

    match value {
        None if field.required => Err(RowError::field(row_index, name, MISSING_REQUIRED)),
        None => Ok(Value::Null),
        Some(v) => coerce(v, field.field_type, date_format)
            .map_err(|message| RowError::field(row_index, name, message)),
    }
}

/// Check every schema field of a row, collecting all errors before deciding.
///
/// Errors are returned in schema field order.
pub(crate) fn validate_row(
    row_index: usize,
    raw: &RawRecord<'_>,
    schema: &FieldSchema,
    date_format: &str,
) -> Result<ValidatedRecord, Vec<RowError>> {
    let mut values = Vec::with_capacity(schema.fields.len());
    let mut errors = Vec::new();

    for field in &schema.fields {
        match validate_field(row_index, raw, field, date_format) {
            Ok(value) => values.push((field.name.trim().to_owned(), value)),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(ValidatedRecord { row_index, values })
    } else {
        Err(errors)
    }
}
