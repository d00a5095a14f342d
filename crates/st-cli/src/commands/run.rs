//! Run command implementation

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use st_core::Credentials;
use st_db::DuckDbBackend;
use st_pipeline::{BatchReport, SnapshotRunner};
use st_source::HttpFetcher;
use std::time::Duration;

use crate::cli::{GlobalArgs, RunArgs};
use crate::context::load_config;

/// Execute the run command
pub(crate) async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = load_config(global)?;
    if args.verbose_load_errors {
        config.verbose_load_errors = true;
    }

    let credentials = Credentials::from_env().context("Source API credentials are not set")?;
    let fetcher = HttpFetcher::from_config(&config, credentials)
        .context("Failed to build source API client")?;
    let db = DuckDbBackend::new(&config.database.path)
        .with_context(|| format!("Failed to open database '{}'", config.database.path))?;

    let runner = SnapshotRunner::new(&db, &config);
    println!(
        "Snapshot {} -> {}, {}\n",
        fetcher.endpoint(),
        runner.tables().product,
        runner.tables().warehouse
    );

    let progress = (!args.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let mut products = 0usize;
    let mut warehouse_rows = 0usize;
    let result = runner
        .run_with_progress(fetcher, |report: &BatchReport| {
            products += report.products_written;
            warehouse_rows += report.warehouse_rows_written;
            if let Some(pb) = &progress {
                pb.set_message(format!(
                    "batch {} | {} products | {} warehouse rows",
                    report.index, products, warehouse_rows
                ));
            }
        })
        .await;

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let summary = result.context("Snapshot run failed; snapshot tables may be partially loaded")?;

    println!(
        "Loaded {} products and {} warehouse rows from {} records in {} batches",
        summary.products_written,
        summary.warehouse_rows_written,
        summary.records,
        summary.batches
    );
    if summary.rows_rejected > 0 {
        println!("  {} rows rejected by the database", summary.rows_rejected);
    }
    println!("Completed in {}", summary.elapsed_hms());

    Ok(())
}
