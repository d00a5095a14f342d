//! Snapshot run orchestration

use std::time::{Duration, Instant};

use serde_json::Value;
use st_core::{
    clean_rows, format_elapsed, Config, DedupEngine, FlatRow, Flattener, ProductId,
    TableSchema, PRODUCT_SCHEMA, WAREHOUSE_SCHEMA,
};
use st_db::{Warehouse, WriteReport};
use st_source::{PageSource, Paginator};

use crate::error::{PipelineError, PipelineResult};

/// Maximum rejected rows printed per write when diagnostics are enabled
const LOAD_ERROR_LIMIT: usize = 50;

/// Fully qualified destination tables written by a snapshot run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTables {
    pub product: String,
    pub warehouse: String,
}

impl SnapshotTables {
    pub fn from_config(config: &Config) -> Self {
        Self {
            product: config.qualified_table(&config.tables.product_snapshot),
            warehouse: config.qualified_table(&config.tables.warehouse_snapshot),
        }
    }
}

/// Counts for one processed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// 1-based batch number
    pub index: usize,
    /// Raw records in the batch
    pub records: usize,
    pub products_written: usize,
    pub warehouse_rows_written: usize,
    pub rows_rejected: usize,
}

/// Totals for a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub records: usize,
    pub products_written: usize,
    pub warehouse_rows_written: usize,
    pub rows_rejected: usize,
    /// Product ids admitted by dedup, whether or not the write accepted them
    pub distinct_products: usize,
    /// Warehouse observations admitted by dedup
    pub distinct_warehouse_keys: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Wall time as `HH:MM:SS`
    pub fn elapsed_hms(&self) -> String {
        format_elapsed(self.elapsed)
    }

    fn absorb(&mut self, batch: &BatchReport) {
        self.batches += 1;
        self.records += batch.records;
        self.products_written += batch.products_written;
        self.warehouse_rows_written += batch.warehouse_rows_written;
        self.rows_rejected += batch.rows_rejected;
    }
}

/// Rows admitted from one batch
#[derive(Debug, Default)]
struct AdmittedRows {
    products: Vec<FlatRow>,
    warehouses: Vec<FlatRow>,
}

/// Runs full-refresh snapshots against a destination
pub struct SnapshotRunner<'a, W: Warehouse + ?Sized> {
    warehouse: &'a W,
    tables: SnapshotTables,
    flattener: Flattener,
    page_limit: u32,
    batch_keys: Vec<String>,
    verbose_load_errors: bool,
}

impl<'a, W: Warehouse + ?Sized> SnapshotRunner<'a, W> {
    pub fn new(warehouse: &'a W, config: &Config) -> Self {
        Self {
            warehouse,
            tables: SnapshotTables::from_config(config),
            flattener: Flattener::from_config(config),
            page_limit: config.source.page_limit,
            batch_keys: config.probes.batch_keys.clone(),
            verbose_load_errors: config.verbose_load_errors,
        }
    }

    pub fn tables(&self) -> &SnapshotTables {
        &self.tables
    }

    /// Run one snapshot, reading from `source`
    pub async fn run<S: PageSource>(&self, source: S) -> PipelineResult<RunSummary> {
        self.run_with_progress(source, |_| {}).await
    }

    /// Run one snapshot, calling `on_batch` after each batch is written
    pub async fn run_with_progress<S, F>(
        &self,
        source: S,
        mut on_batch: F,
    ) -> PipelineResult<RunSummary>
    where
        S: PageSource,
        F: FnMut(&BatchReport),
    {
        let started = Instant::now();
        self.truncate_snapshots().await?;

        let mut paginator = Paginator::new(source, self.page_limit, self.batch_keys.clone());
        let mut dedup = DedupEngine::new();
        let mut summary = RunSummary::default();

        while let Some(batch) = paginator.next_batch().await? {
            let mut report = BatchReport {
                index: summary.batches + 1,
                records: batch.len(),
                ..BatchReport::default()
            };
            let admitted = self.admit(&mut dedup, batch);

            if !admitted.products.is_empty() {
                let write = self
                    .write(&self.tables.product, &PRODUCT_SCHEMA, &admitted.products)
                    .await?;
                report.products_written = write.rows_written;
                report.rows_rejected += write.rows_rejected;
            }
            if !admitted.warehouses.is_empty() {
                let write = self
                    .write(&self.tables.warehouse, &WAREHOUSE_SCHEMA, &admitted.warehouses)
                    .await?;
                report.warehouse_rows_written = write.rows_written;
                report.rows_rejected += write.rows_rejected;
            }

            log::debug!(
                "Batch {}: {} records, {} products, {} warehouse rows",
                report.index,
                report.records,
                report.products_written,
                report.warehouse_rows_written
            );
            summary.absorb(&report);
            on_batch(&report);
        }

        summary.elapsed = started.elapsed();
        summary.distinct_products = dedup.products_seen();
        summary.distinct_warehouse_keys = dedup.warehouse_keys_seen();
        log::info!(
            "Snapshot complete: {} batches, {} products, {} warehouse rows in {}",
            summary.batches,
            summary.products_written,
            summary.warehouse_rows_written,
            summary.elapsed_hms()
        );
        log::debug!(
            "Distinct identities seen: {} products, {} warehouse observations",
            summary.distinct_products,
            summary.distinct_warehouse_keys
        );
        Ok(summary)
    }

    async fn truncate_snapshots(&self) -> PipelineResult<()> {
        for table in [&self.tables.product, &self.tables.warehouse] {
            self.warehouse
                .truncate_table(table)
                .await
                .map_err(|source| PipelineError::Truncate {
                    table: table.clone(),
                    source,
                })?;
        }
        log::info!(
            "Truncated {} and {}",
            self.tables.product,
            self.tables.warehouse
        );
        Ok(())
    }

    /// Flatten a batch and keep only rows not seen earlier in the run
    fn admit(&self, dedup: &mut DedupEngine, batch: Vec<Value>) -> AdmittedRows {
        let mut rows = AdmittedRows::default();
        for record in batch {
            let Value::Object(product) = record else {
                log::debug!("Skipping non-object record");
                continue;
            };
            let Some(id) = ProductId::of(&product) else {
                log::debug!("Skipping record without id");
                continue;
            };

            if !dedup.has_product(&id) {
                if let Some(row) = self.flattener.product_row(&product) {
                    dedup.admit_product(&id);
                    rows.products.push(row);
                }
            }
            for row in self.flattener.warehouse_rows(&product) {
                if dedup.admit_warehouse(&row) {
                    rows.warehouses.push(row);
                }
            }
        }
        rows
    }

    async fn write(
        &self,
        table: &str,
        schema: &'static TableSchema,
        rows: &[FlatRow],
    ) -> PipelineResult<WriteReport> {
        let batch = clean_rows(schema, rows);
        let report = self.warehouse.write_batch(table, &batch).await?;
        if self.verbose_load_errors {
            self.report_load_errors(table, &report).await;
        }
        Ok(report)
    }

    /// Best-effort: a failing diagnostic query is ignored
    async fn report_load_errors(&self, table: &str, report: &WriteReport) {
        match self
            .warehouse
            .load_errors(table, &report.operation_id, LOAD_ERROR_LIMIT)
            .await
        {
            Ok(errors) if !errors.is_empty() => {
                log::warn!(
                    "Load errors for {} (operation {}):",
                    table,
                    report.operation_id
                );
                for err in errors {
                    log::warn!("  row {}: {}", err.row_index, err.message);
                }
            }
            Ok(_) => {}
            Err(e) => log::debug!("Could not read load errors for {}: {}", table, e),
        }
    }
}
