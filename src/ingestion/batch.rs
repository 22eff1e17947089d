//! Running several independent uploads at once.
//!
//! Each request is ingested exactly as [`IngestionRequest::run`] would; the calls share
//! nothing but the worker pool.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::error::{IngestionError, IngestionResult};
use crate::types::IngestionReport;

use super::unified::IngestionRequest;

/// Configuration for [`ingest_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Number of worker threads.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

/// Ingest every request on a dedicated worker pool.
///
/// The outer result only fails when the pool cannot be set up. Per-request outcomes are
/// returned in request order; one request failing has no effect on the others.
pub fn ingest_batch(
    requests: &[IngestionRequest],
    options: &BatchOptions,
) -> IngestionResult<Vec<IngestionResult<IngestionReport>>> {
    if options.num_threads == Some(0) {
        return Err(IngestionError::Config {
            message: "num_threads must be > 0 when set".to_string(),
        });
    }

    let n_threads = options
        .num_threads
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .min(requests.len().max(1));

    let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;
    log::debug!("batch: {} requests on {} threads", requests.len(), n_threads);

    Ok(pool.install(|| requests.par_iter().map(IngestionRequest::run).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::IngestionOptions;
    use crate::types::{FieldSchema, FieldSpec, FieldType};

    #[test]
    fn zero_threads_is_a_config_error() {
        let err = ingest_batch(&[], &BatchOptions { num_threads: Some(0) }).unwrap_err();
        assert!(matches!(err, IngestionError::Config { .. }));
    }

    #[test]
    fn empty_batch_yields_no_results() {
        let out = ingest_batch(&[], &BatchOptions::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn results_follow_request_order() {
        let schema = FieldSchema::new(vec![FieldSpec::required("id", FieldType::Integer)]);
        let requests: Vec<IngestionRequest> = (0..16)
            .map(|n| {
                let body = format!("id\n{}", "1\n".repeat(n));
                IngestionRequest::new(body, schema.clone(), IngestionOptions::default())
            })
            .collect();

        let out = ingest_batch(&requests, &BatchOptions { num_threads: Some(4) }).unwrap();
        let totals: Vec<usize> = out.iter().map(|r| r.as_ref().unwrap().total_rows()).collect();
        assert_eq!(totals, (0..16).collect::<Vec<_>>());
    }
}
