//! Error types for st-pipeline

use st_db::DbError;
use st_source::SourceError;
use thiserror::Error;

/// Snapshot run errors. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Truncation failed before any write (P001)
    #[error("[P001] Failed to truncate {table}: {source}")]
    Truncate {
        table: String,
        #[source]
        source: DbError,
    },

    /// Fetch failed after retries, or was not retryable
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Batch write failed as a whole
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
