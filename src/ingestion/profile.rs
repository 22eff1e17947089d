//! Upload profiles: a schema plus ingestion settings, stored as JSON.
//!
//! ```json
//! {
//!   "schema": {
//!     "fields": [
//!       { "name": "email", "required": true, "type": "string" },
//!       { "name": "plan", "type": "string" },
//!       { "name": "signup_date", "required": true, "type": "date" }
//!     ]
//!   },
//!   "delimiter": ";",
//!   "date_format": "%d/%m/%Y",
//!   "timeout_ms": 5000,
//!   "rejection_policy": "strict_rows"
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FieldSchema, RejectionPolicy};

use super::unified::{DEFAULT_DELIMITER, IngestionOptions};
use super::validate::DEFAULT_DATE_FORMAT;

/// Schema and settings for one kind of upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadProfile {
    pub schema: FieldSchema,
    #[serde(default)]
    pub delimiter: Option<char>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub rejection_policy: RejectionPolicy,
}

impl UploadProfile {
    /// Parse and check a profile document.
    pub fn from_json_str(json: &str) -> IngestionResult<Self> {
        let profile: UploadProfile =
            serde_json::from_str(json).map_err(|e| IngestionError::Config {
                message: format!("invalid upload profile: {e}"),
            })?;
        profile.schema.validate()?;
        profile.options()?.validate()?;
        Ok(profile)
    }

    /// Read a profile document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Ingestion options described by this profile. Observer and source are left unset.
    pub fn options(&self) -> IngestionResult<IngestionOptions> {
        let delimiter = match self.delimiter {
            None => DEFAULT_DELIMITER,
            Some(c) if c.is_ascii() => c as u8,
            Some(c) => {
                return Err(IngestionError::Config {
                    message: format!("delimiter '{c}' is not a single ASCII character"),
                });
            }
        };

        Ok(IngestionOptions {
            delimiter,
            date_format: self
                .date_format
                .clone()
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            timeout: self.timeout_ms.map(Duration::from_millis),
            ..Default::default()
        })
    }
}
