//! Destination capability trait

use crate::error::DbResult;
use async_trait::async_trait;
use st_core::{CleanBatch, TableSchema};

/// Outcome of writing one cleaned batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// True when every row was accepted
    pub success: bool,
    pub rows_written: usize,
    pub rows_rejected: usize,
    /// Key for retrieving this write's rejected rows via [`Warehouse::load_errors`]
    pub operation_id: String,
}

/// One rejected row from a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Position of the row within its batch
    pub row_index: usize,
    pub message: String,
}

/// Destination for snapshot tables
///
/// Table names are passed fully qualified (`schema.table` or `table`).
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Empty a table. Runs before any write of a snapshot.
    async fn truncate_table(&self, table: &str) -> DbResult<()>;

    /// Insert every row of `batch`, continuing past rows the destination rejects
    async fn write_batch(&self, table: &str, batch: &CleanBatch) -> DbResult<WriteReport>;

    /// Rejected rows recorded for a previous write, at most `limit`
    async fn load_errors(
        &self,
        table: &str,
        operation_id: &str,
        limit: usize,
    ) -> DbResult<Vec<LoadError>>;

    /// Create `table` with the columns of `schema` unless it already exists
    async fn create_table_if_not_exists(&self, table: &str, schema: &TableSchema)
        -> DbResult<()>;

    /// Check if a table exists
    async fn relation_exists(&self, table: &str) -> DbResult<bool>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
