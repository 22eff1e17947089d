//! Unified ingestion entrypoints.
//!
//! Most callers should use [`ingest`] (stream + schema, default options) or
//! [`ingest_with_options`]. [`ingest_from_path`] opens a file and infers the delimiter from its
//! extension.
//!
//! If an [`super::observability::IngestionObserver`] is configured, success/failure/alerts are
//! reported to it once per call.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FieldSchema, IngestionReport};

use super::csv;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::validate::{DEFAULT_DATE_FORMAT, check_date_format};

/// Default cell delimiter.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Delimited text flavours recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimitedFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values.
    Tsv,
}

impl DelimitedFormat {
    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            _ => None,
        }
    }

    /// Infer a format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }

    /// Cell delimiter byte for this format.
    pub fn delimiter(&self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases: comma delimiter, ISO-8601 dates, no deadline, no observer.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Cell delimiter (single ASCII byte).
    pub delimiter: u8,
    /// chrono format string for [`crate::types::FieldType::Date`] fields.
    pub date_format: String,
    /// Absolute point in time after which the call is abandoned.
    pub deadline: Option<Instant>,
    /// Time budget counted from the start of the call.
    ///
    /// When both `deadline` and `timeout` are set, the earlier one wins.
    pub timeout: Option<Duration>,
    /// Label reported to the observer (an upload name, a path, a request id).
    pub source: Option<String>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("delimiter", &(self.delimiter as char))
            .field("date_format", &self.date_format)
            .field("deadline", &self.deadline)
            .field("timeout", &self.timeout)
            .field("source", &self.source)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            deadline: None,
            timeout: None,
            source: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    /// Set a time budget for each call made with these options.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach an observer.
    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Check option consistency (ASCII delimiter other than quote/newline, usable date format).
    pub fn validate(&self) -> IngestionResult<()> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(IngestionError::Config {
                message: format!("unsupported delimiter byte 0x{:02x}", self.delimiter),
            });
        }
        check_date_format(&self.date_format)
    }

    /// Deadline for a call that starts at `started`.
    pub(crate) fn effective_deadline(&self, started: Instant) -> Option<Instant> {
        let from_timeout = self.timeout.and_then(|t| started.checked_add(t));
        match (self.deadline, from_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Ingest a delimited byte stream with default options.
///
/// # Examples
///
/// ```rust
/// use tabular_ingestion::ingestion::ingest;
/// use tabular_ingestion::types::{FieldSchema, FieldSpec, FieldType, Value};
///
/// # fn main() -> Result<(), tabular_ingestion::IngestionError> {
/// let schema = FieldSchema::new(vec![
///     FieldSpec::required("name", FieldType::String),
///     FieldSpec::required("age", FieldType::Integer),
/// ]);
///
/// let report = ingest("name,age\nAlice,30\nBob,notanumber\n".as_bytes(), &schema)?;
/// assert_eq!(report.total_rows(), 2);
/// assert_eq!(report.accepted()[0].get("age"), Some(&Value::Integer(30)));
/// assert_eq!(report.rejected_count(), 1);
/// assert_eq!(report.errors()[0].message, "invalid integer");
/// # Ok(())
/// # }
/// ```
pub fn ingest<R: Read>(stream: R, schema: &FieldSchema) -> IngestionResult<IngestionReport> {
    ingest_with_options(stream, schema, &IngestionOptions::default())
}

/// Ingest a delimited byte stream.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
pub fn ingest_with_options<R: Read>(
    stream: R,
    schema: &FieldSchema,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport> {
    let ctx = IngestionContext {
        source: options.source.clone().unwrap_or_else(|| "<stream>".to_string()),
        delimiter: options.delimiter,
    };
    let result = csv::ingest_csv_from_reader(stream, schema, options);
    notify(options, &ctx, &result);
    result
}

/// Ingest a delimited file.
///
/// When `options.delimiter` is left at [`DEFAULT_DELIMITER`], `.tsv`/`.tab` files are read with a
/// tab delimiter. Any other configured delimiter is used as given. A comma cannot be forced on a
/// `.tsv`/`.tab` path: it is always replaced by a tab, so read such files through
/// [`ingest_with_options`] instead.
///
/// ```no_run
/// use tabular_ingestion::ingestion::{ingest_from_path, IngestionOptions};
/// use tabular_ingestion::types::{FieldSchema, FieldSpec, FieldType};
///
/// # fn main() -> Result<(), tabular_ingestion::IngestionError> {
/// let schema = FieldSchema::new(vec![FieldSpec::required("id", FieldType::Integer)]);
/// let report = ingest_from_path("upload.tsv", &schema, &IngestionOptions::default())?;
/// println!("accepted={}", report.accepted().len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    schema: &FieldSchema,
    options: &IngestionOptions,
) -> IngestionResult<IngestionReport> {
    let path = path.as_ref();

    let mut effective = options.clone();
    if effective.delimiter == DEFAULT_DELIMITER {
        if let Some(fmt) = DelimitedFormat::from_path(path) {
            effective.delimiter = fmt.delimiter();
        }
    }

    let ctx = IngestionContext {
        source: options
            .source
            .clone()
            .unwrap_or_else(|| path.display().to_string()),
        delimiter: effective.delimiter,
    };
    let result = csv::ingest_csv_from_path(path, schema, &effective);
    notify(options, &ctx, &result);
    result
}

fn notify(options: &IngestionOptions, ctx: &IngestionContext, result: &IngestionResult<IngestionReport>) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(report) => obs.on_success(ctx, IngestionStats::from(report)),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

/// Severity an observer is told about for a failed call.
pub fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) | IngestionError::ThreadPool(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::Timeout { .. } => IngestionSeverity::Warning,
        IngestionError::InvalidSchema { .. }
        | IngestionError::MalformedHeader { .. }
        | IngestionError::Decoding { .. }
        | IngestionError::Config { .. } => IngestionSeverity::Error,
    }
}

/// An owned ingestion job: upload bytes, schema and options.
///
/// Useful for queuing uploads or running several of them with
/// [`super::batch::ingest_batch`].
#[derive(Clone)]
pub struct IngestionRequest {
    /// Raw upload body.
    pub body: Vec<u8>,
    /// Schema to validate rows against.
    pub schema: FieldSchema,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("body_len", &self.body.len())
            .field("schema_fields", &self.schema.fields.len())
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    pub fn new(body: impl Into<Vec<u8>>, schema: FieldSchema, options: IngestionOptions) -> Self {
        Self {
            body: body.into(),
            schema,
            options,
        }
    }

    /// Execute the request by calling [`ingest_with_options`].
    pub fn run(&self) -> IngestionResult<IngestionReport> {
        ingest_with_options(self.body.as_slice(), &self.schema, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(DelimitedFormat::from_extension("CSV"), Some(DelimitedFormat::Csv));
        assert_eq!(DelimitedFormat::from_extension("tsv"), Some(DelimitedFormat::Tsv));
        assert_eq!(DelimitedFormat::from_extension("xlsx"), None);
        assert_eq!(DelimitedFormat::from_path(Path::new("a/b/upload.TSV")), Some(DelimitedFormat::Tsv));
        assert_eq!(DelimitedFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn options_reject_unusable_delimiters() {
        for delimiter in [b'"', b'\n', 0xE9] {
            let opts = IngestionOptions {
                delimiter,
                ..Default::default()
            };
            assert!(matches!(opts.validate(), Err(IngestionError::Config { .. })));
        }
        assert!(IngestionOptions::default().validate().is_ok());
    }

    #[test]
    fn effective_deadline_takes_the_earlier_bound() {
        let start = Instant::now();
        let far = start + Duration::from_secs(60);
        let opts = IngestionOptions::default()
            .with_deadline(far)
            .with_timeout(Duration::from_secs(1));
        assert_eq!(opts.effective_deadline(start), Some(start + Duration::from_secs(1)));

        let only_deadline = IngestionOptions::default().with_deadline(far);
        assert_eq!(only_deadline.effective_deadline(start), Some(far));
        assert_eq!(IngestionOptions::default().effective_deadline(start), None);
    }

    #[test]
    fn severity_mapping() {
        let io = IngestionError::Io(std::io::Error::other("disk"));
        assert_eq!(severity_for_error(&io), IngestionSeverity::Critical);
        assert_eq!(
            severity_for_error(&IngestionError::Timeout { rows_read: 3 }),
            IngestionSeverity::Warning
        );
        assert_eq!(
            severity_for_error(&IngestionError::MalformedHeader {
                message: "x".to_string()
            }),
            IngestionSeverity::Error
        );
    }
}
