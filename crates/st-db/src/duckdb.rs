//! DuckDB destination backend

use crate::error::{DbError, DbResult};
use crate::traits::{LoadError, Warehouse, WriteReport};
use async_trait::async_trait;
use duckdb::types::{TimeUnit, Value};
use duckdb::{params, params_from_iter, Connection};
use st_core::sql_utils::{quote_ident, quote_qualified};
use st_core::{Cell, CleanBatch, ColumnKind, TableSchema};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Internal table holding rows rejected by `write_batch`
pub const LOAD_ERRORS_TABLE: &str = "_stocktake_load_errors";

/// DuckDB destination backend
///
/// The connection is closed when the backend is dropped.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn relation_exists_sync(conn: &Connection, name: &str) -> DbResult<bool> {
        let (schema, table) = match name.rsplit_once('.') {
            Some((schema, table)) => (schema, table),
            None => ("main", name),
        };
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn ensure_errors_table(conn: &Connection) -> DbResult<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                operation_id VARCHAR NOT NULL,
                table_name VARCHAR NOT NULL,
                row_index BIGINT NOT NULL,
                message VARCHAR NOT NULL,
                recorded_at TIMESTAMP DEFAULT current_timestamp
            )",
            quote_ident(LOAD_ERRORS_TABLE)
        ))?;
        Ok(())
    }

    fn record_errors(
        conn: &Connection,
        table: &str,
        operation_id: &str,
        errors: &[LoadError],
    ) -> DbResult<()> {
        Self::ensure_errors_table(conn)?;
        let mut stmt = conn.prepare(&format!(
            "INSERT INTO {} (operation_id, table_name, row_index, message) VALUES (?, ?, ?, ?)",
            quote_ident(LOAD_ERRORS_TABLE)
        ))?;
        for err in errors {
            stmt.execute(params![
                operation_id,
                table,
                err.row_index as i64,
                err.message
            ])?;
        }
        Ok(())
    }
}

/// SQL column type for a column kind, with `NOT NULL` where cleaning never yields null
fn sql_type(kind: ColumnKind) -> String {
    let base = match kind {
        ColumnKind::Text => "VARCHAR",
        ColumnKind::Timestamp => "TIMESTAMP",
        ColumnKind::Currency | ColumnKind::Number => "DOUBLE",
        ColumnKind::Integer | ColumnKind::NullableInteger => "BIGINT",
        ColumnKind::Flag => "BOOLEAN",
    };
    if kind.is_nullable() {
        base.to_string()
    } else {
        format!("{} NOT NULL", base)
    }
}

fn to_sql_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Int(i) => Value::BigInt(*i),
        Cell::Float(f) => Value::Double(*f),
        Cell::Text(s) => Value::Text(s.clone()),
        Cell::Bool(b) => Value::Boolean(*b),
        Cell::Timestamp(ts) => {
            Value::Timestamp(TimeUnit::Microsecond, ts.and_utc().timestamp_micros())
        }
    }
}

#[async_trait]
impl Warehouse for DuckDbBackend {
    async fn truncate_table(&self, table: &str) -> DbResult<()> {
        let sql = format!("DELETE FROM {}", quote_qualified(table));
        let conn = self.lock()?;
        conn.execute(&sql, [])?;
        log::debug!("Truncated {}", table);
        Ok(())
    }

    async fn write_batch(&self, table: &str, batch: &CleanBatch) -> DbResult<WriteReport> {
        let operation_id = Uuid::new_v4().to_string();
        let schema = batch.schema();
        let columns: Vec<String> = schema.column_names().map(quote_ident).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_qualified(table),
            columns.join(", "),
            placeholders
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows_written = 0;
        let mut rejected = Vec::new();

        for (row_index, row) in batch.rows().iter().enumerate() {
            match stmt.execute(params_from_iter(row.iter().map(to_sql_value))) {
                Ok(n) => rows_written += n,
                Err(e) => {
                    log::debug!("{}: row {} rejected: {}", table, row_index, e);
                    rejected.push(LoadError {
                        row_index,
                        message: e.to_string(),
                    });
                }
            }
        }

        if !rejected.is_empty() {
            log::warn!(
                "{}: {} of {} rows rejected (operation {})",
                table,
                rejected.len(),
                batch.len(),
                operation_id
            );
            if let Err(e) = Self::record_errors(&conn, table, &operation_id, &rejected) {
                log::warn!(
                    "{}: could not record rejected rows (operation {}): {}",
                    table,
                    operation_id,
                    e
                );
            }
        }

        Ok(WriteReport {
            success: rejected.is_empty(),
            rows_written,
            rows_rejected: rejected.len(),
            operation_id,
        })
    }

    async fn load_errors(
        &self,
        table: &str,
        operation_id: &str,
        limit: usize,
    ) -> DbResult<Vec<LoadError>> {
        let conn = self.lock()?;
        if !Self::relation_exists_sync(&conn, LOAD_ERRORS_TABLE)? {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT row_index, message FROM {} \
             WHERE operation_id = ? AND table_name = ? \
             ORDER BY row_index LIMIT {}",
            quote_ident(LOAD_ERRORS_TABLE),
            limit
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![operation_id, table], |row| {
            let row_index: i64 = row.get(0)?;
            let message: String = row.get(1)?;
            Ok(LoadError {
                row_index: usize::try_from(row_index).unwrap_or_default(),
                message,
            })
        })?;

        let mut errors = Vec::new();
        for row in rows {
            errors.push(row?);
        }
        Ok(errors)
    }

    async fn create_table_if_not_exists(
        &self,
        table: &str,
        schema: &TableSchema,
    ) -> DbResult<()> {
        if let Some((schema_name, _)) = table.rsplit_once('.') {
            self.execute_sync(&format!(
                "CREATE SCHEMA IF NOT EXISTS {}",
                quote_ident(schema_name)
            ))?;
        }

        let columns: Vec<String> = schema
            .columns
            .iter()
            .map(|col| format!("{} {}", quote_ident(col.name), sql_type(col.kind)))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_qualified(table),
            columns.join(", ")
        );
        self.execute_sync(&sql)?;
        Ok(())
    }

    async fn relation_exists(&self, table: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        Self::relation_exists_sync(&conn, table)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
