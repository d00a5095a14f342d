//! End-to-end snapshot runs against a scripted listing

use async_trait::async_trait;
use serde_json::{json, Value};
use st_core::{CleanBatch, Config, TableSchema, PRODUCT_SCHEMA, WAREHOUSE_SCHEMA};
use st_db::{DbError, DbResult, DuckDbBackend, LoadError, Warehouse, WriteReport};
use st_pipeline::{BatchReport, PipelineError, SnapshotRunner, SnapshotTables};
use st_source::{PageSelector, PageSource, SourceError, SourceResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Serves `records` by offset or page; fails every call from `fail_from` on
struct Listing {
    records: Vec<Value>,
    fail_from: Option<usize>,
    calls: Arc<AtomicUsize>,
}

impl Listing {
    fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            fail_from: None,
            calls: Arc::default(),
        }
    }

    fn failing_from(mut self, call: usize) -> Self {
        self.fail_from = Some(call);
        self
    }
}

#[async_trait]
impl PageSource for Listing {
    async fn fetch(&mut self, selector: PageSelector, limit: u32) -> SourceResult<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_from.is_some_and(|n| call >= n) {
            return Err(SourceError::Status {
                status: 404,
                url: "listing".into(),
                body: String::new(),
            });
        }
        let limit = limit as usize;
        let start = match selector {
            PageSelector::Offset(offset) => offset as usize,
            PageSelector::Page(page) => (page as usize - 1) * limit,
        };
        let end = (start + limit).min(self.records.len());
        let page: Vec<Value> = self.records[start.min(end)..end].to_vec();
        Ok(json!({ "products": page }))
    }
}

fn records() -> Vec<Value> {
    vec![
        json!({
            "id": 2,
            "sku": "B",
            "warehouses": [{"id": 10, "updated": "2024-01-01"}, "junk"]
        }),
        json!({
            "id": 1,
            "sku": "A",
            "tags": ["a|b", "c"],
            "total_on_hand": "abc",
            "warehouses": [
                {"id": 10, "updated": "2024-01-01", "on_hand": 5},
                {"id": 11, "updated": "2024-01-01"}
            ]
        }),
        json!({
            "id": "1",
            "sku": "A-again",
            "warehouses": [
                {"id": 10, "updated": "2024-01-01", "on_hand": 7},
                {"id": 10, "updated": "2024-01-02", "on_hand": 6}
            ]
        }),
        json!({"sku": "no id", "warehouses": [{"id": 99}]}),
        json!("not a record"),
    ]
}

fn config() -> Config {
    let mut config = Config::default();
    config.source.page_limit = 2;
    config.database.path = ":memory:".to_string();
    config
}

async fn provisioned(config: &Config) -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    let tables = SnapshotTables::from_config(config);
    db.create_table_if_not_exists(&tables.product, &PRODUCT_SCHEMA)
        .await
        .unwrap();
    db.create_table_if_not_exists(&tables.warehouse, &WAREHOUSE_SCHEMA)
        .await
        .unwrap();
    db
}

#[tokio::test]
async fn test_full_snapshot_run() {
    let config = config();
    let db = provisioned(&config).await;
    let runner = SnapshotRunner::new(&db, &config);
    let tables = runner.tables().clone();

    let mut reports: Vec<BatchReport> = Vec::new();
    let summary = runner
        .run_with_progress(Listing::new(records()), |r| reports.push(r.clone()))
        .await
        .unwrap();

    assert_eq!(summary.batches, 3);
    assert_eq!(summary.records, 5);
    assert_eq!(summary.products_written, 2);
    // (2,10,a) (1,10,a) (1,11,a) (1,10,b); the repeated (1,10,a) is dropped
    assert_eq!(summary.warehouse_rows_written, 4);
    assert_eq!(summary.rows_rejected, 0);
    assert_eq!(summary.distinct_products, 2);
    assert_eq!(summary.distinct_warehouse_keys, 4);
    assert_eq!(summary.elapsed_hms().len(), 8);

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].products_written, 2);
    assert_eq!(reports[1].products_written, 0);
    assert_eq!(reports[1].warehouse_rows_written, 1);
    assert_eq!(reports[2].records, 1);

    let product_count = db
        .query_count(&format!("SELECT * FROM \"{}\"", tables.product))
        .await
        .unwrap();
    assert_eq!(product_count, 2);

    // First sighting wins and unparsable totals load as zero
    let first_seen = db
        .query_count(&format!(
            "SELECT * FROM \"{}\" WHERE PRODUCT_ID = 1 AND SKU = 'A' \
             AND TAGS = 'a/b|c' AND TOTAL_ON_HAND = 0",
            tables.product
        ))
        .await
        .unwrap();
    assert_eq!(first_seen, 1);

    let restamped = db
        .query_count(&format!(
            "SELECT * FROM \"{}\" WHERE PRODUCT_ID = 1 AND WH_ID = 10 \
             AND WH_UPDATED = TIMESTAMP '2024-01-02 00:00:00' AND ON_HAND = 6",
            tables.warehouse
        ))
        .await
        .unwrap();
    assert_eq!(restamped, 1);
}

#[tokio::test]
async fn test_run_replaces_previous_snapshot() {
    let config = config();
    let db = provisioned(&config).await;
    let runner = SnapshotRunner::new(&db, &config);

    runner.run(Listing::new(records())).await.unwrap();
    let summary = runner.run(Listing::new(records())).await.unwrap();
    assert_eq!(summary.products_written, 2);

    let count = db
        .query_count(&format!("SELECT * FROM \"{}\"", runner.tables().warehouse))
        .await
        .unwrap();
    assert_eq!(count, 4);
}

#[tokio::test]
async fn test_truncate_failure_aborts_before_fetching() {
    let config = config();
    let db = DuckDbBackend::in_memory().unwrap();
    let listing = Listing::new(records());
    let calls = listing.calls.clone();

    let err = SnapshotRunner::new(&db, &config)
        .run(listing)
        .await
        .unwrap_err();
    match err {
        PipelineError::Truncate { table, .. } => {
            assert_eq!(table, "INVENTORY_PRODUCT_LEVEL_SNAP")
        }
        other => panic!("expected Truncate, got {other}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_failure_leaves_partial_snapshot() {
    let config = config();
    let db = provisioned(&config).await;
    let runner = SnapshotRunner::new(&db, &config);

    let err = runner
        .run(Listing::new(records()).failing_from(2))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Source(SourceError::Status { .. })));

    let count = db
        .query_count(&format!("SELECT * FROM \"{}\"", runner.tables().product))
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_archived_filter_drops_products_and_warehouses() {
    let mut config = config();
    config.filter_archived = true;
    let db = provisioned(&config).await;

    let listing = Listing::new(vec![
        json!({"id": 1, "archived": true, "warehouses": [{"id": 1}]}),
        json!({"id": 2, "warehouses": [{"id": 1}]}),
    ]);
    let summary = SnapshotRunner::new(&db, &config).run(listing).await.unwrap();
    assert_eq!(summary.products_written, 1);
    assert_eq!(summary.warehouse_rows_written, 1);
}

#[tokio::test]
async fn test_schema_qualified_tables() {
    let mut config = config();
    config.database.schema = Some("raw".to_string());
    let db = provisioned(&config).await;

    let summary = SnapshotRunner::new(&db, &config)
        .run(Listing::new(records()))
        .await
        .unwrap();
    assert_eq!(summary.products_written, 2);
    assert!(db
        .relation_exists("raw.INVENTORY_WAREHOUSE_LEVEL_SNAP")
        .await
        .unwrap());
}

/// Rejects every row and fails its diagnostic query
#[derive(Default)]
struct RejectingWarehouse {
    truncated: Mutex<Vec<String>>,
    diagnostics_requested: AtomicUsize,
}

#[async_trait]
impl Warehouse for RejectingWarehouse {
    async fn truncate_table(&self, table: &str) -> DbResult<()> {
        self.truncated.lock().unwrap().push(table.to_string());
        Ok(())
    }

    async fn write_batch(&self, _table: &str, batch: &CleanBatch) -> DbResult<WriteReport> {
        Ok(WriteReport {
            success: false,
            rows_written: 0,
            rows_rejected: batch.len(),
            operation_id: "op".to_string(),
        })
    }

    async fn load_errors(
        &self,
        _table: &str,
        _operation_id: &str,
        _limit: usize,
    ) -> DbResult<Vec<LoadError>> {
        self.diagnostics_requested.fetch_add(1, Ordering::SeqCst);
        Err(DbError::ExecutionError("diagnostics unavailable".into()))
    }

    async fn create_table_if_not_exists(
        &self,
        _table: &str,
        _schema: &TableSchema,
    ) -> DbResult<()> {
        Ok(())
    }

    async fn relation_exists(&self, _table: &str) -> DbResult<bool> {
        Ok(true)
    }

    async fn query_count(&self, _sql: &str) -> DbResult<usize> {
        Ok(0)
    }

    fn db_type(&self) -> &'static str {
        "rejecting"
    }
}

#[tokio::test]
async fn test_rejected_rows_and_failed_diagnostics_do_not_abort() {
    let mut config = config();
    config.verbose_load_errors = true;
    let warehouse = RejectingWarehouse::default();

    let summary = SnapshotRunner::new(&warehouse, &config)
        .run(Listing::new(records()))
        .await
        .unwrap();

    assert_eq!(summary.batches, 3);
    assert_eq!(summary.products_written, 0);
    assert_eq!(summary.rows_rejected, 6);
    // Dedup admits rows before the destination rejects them
    assert_eq!(summary.distinct_products, 2);
    // products + warehouses for batch 1, warehouses only for batch 2
    assert_eq!(warehouse.diagnostics_requested.load(Ordering::SeqCst), 3);
    assert_eq!(
        *warehouse.truncated.lock().unwrap(),
        vec![
            "INVENTORY_PRODUCT_LEVEL_SNAP".to_string(),
            "INVENTORY_WAREHOUSE_LEVEL_SNAP".to_string()
        ]
    );
}

#[tokio::test]
async fn test_diagnostics_skipped_unless_enabled() {
    let config = config();
    let warehouse = RejectingWarehouse::default();

    SnapshotRunner::new(&warehouse, &config)
        .run(Listing::new(records()))
        .await
        .unwrap();
    assert_eq!(warehouse.diagnostics_requested.load(Ordering::SeqCst), 0);
}
