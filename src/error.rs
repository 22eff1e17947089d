use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// Every variant is a call-level failure: when one is returned, no
/// [`crate::types::IngestionReport`] is produced. Problems confined to a single row are not
/// errors; they are recorded as [`crate::types::RowError`]s inside the report.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The caller supplied an unusable schema (empty, blank or duplicate field names).
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// The header row is missing, empty, or contains blank/duplicate column names.
    #[error("malformed header: {message}")]
    MalformedHeader { message: String },

    /// The input is not valid UTF-8.
    ///
    /// `line` is the 1-based physical line of the input, when known.
    #[error("decoding error{}: {message}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Decoding { line: Option<u64>, message: String },

    /// The caller-supplied deadline passed before all rows were read.
    #[error("ingestion timed out after {rows_read} rows")]
    Timeout { rows_read: usize },

    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error other than invalid UTF-8 (including I/O errors surfaced by the reader).
    #[error("csv error: {0}")]
    Csv(csv::Error),

    /// Options or an upload profile could not be loaded or are inconsistent.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The worker pool for batch ingestion could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<csv::Error> for IngestionError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Utf8 { pos, err: utf8 } => IngestionError::Decoding {
                line: pos.as_ref().map(|p| p.line()),
                message: utf8.to_string(),
            },
            _ => IngestionError::Csv(err),
        }
    }
}

impl IngestionError {
    /// HTTP status code an HTTP layer should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            IngestionError::InvalidSchema { .. } | IngestionError::MalformedHeader { .. } => 400,
            IngestionError::Timeout { .. } => 408,
            IngestionError::Decoding { .. }
            | IngestionError::Io(_)
            | IngestionError::Csv(_)
            | IngestionError::Config { .. }
            | IngestionError::ThreadPool(_) => 500,
        }
    }

    /// A message that is safe to return to a remote client.
    ///
    /// Client errors (4xx) carry their full description. Server-side failures are
    /// reduced to a generic message so internal error text never leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            IngestionError::InvalidSchema { .. }
            | IngestionError::MalformedHeader { .. }
            | IngestionError::Timeout { .. } => self.to_string(),
            IngestionError::Decoding { .. } => "upload is not valid UTF-8 text".to_string(),
            _ => "internal error while processing upload".to_string(),
        }
    }
}
