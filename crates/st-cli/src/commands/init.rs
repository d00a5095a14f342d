//! Init command implementation - provisions the destination tables

use anyhow::{Context, Result};
use st_core::config::CONFIG_FILE_NAME;
use st_core::{Config, TableSchema, PRODUCT_SCHEMA, WAREHOUSE_SCHEMA};
use st_db::{DuckDbBackend, Warehouse};
use std::fs;
use std::path::Path;

use crate::cli::{GlobalArgs, InitArgs};
use crate::context::load_config;

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    if args.write_config {
        write_default_config(Path::new(&global.project_dir))?;
    }

    let config = load_config(global)?;
    let db = DuckDbBackend::new(&config.database.path)
        .with_context(|| format!("Failed to open database '{}'", config.database.path))?;

    println!("Provisioning tables in {}\n", config.database.path);

    let tables: [(&_, &'static TableSchema); 4] = [
        (&config.tables.product_snapshot, &PRODUCT_SCHEMA),
        (&config.tables.warehouse_snapshot, &WAREHOUSE_SCHEMA),
        (&config.tables.product_history, &PRODUCT_SCHEMA),
        (&config.tables.warehouse_history, &WAREHOUSE_SCHEMA),
    ];
    for (name, schema) in tables {
        let table = config.qualified_table(name);
        let existed = db.relation_exists(&table).await?;
        db.create_table_if_not_exists(&table, schema)
            .await
            .with_context(|| format!("Failed to create table {}", table))?;
        if existed {
            println!("  - {} (exists)", table);
        } else {
            println!("  ✓ {} (created)", table);
        }
    }

    Ok(())
}

/// Write a default config file unless the project already has one
fn write_default_config(project_dir: &Path) -> Result<()> {
    let path = project_dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        println!("{} already exists, leaving it untouched", path.display());
        return Ok(());
    }

    fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create directory: {}", project_dir.display()))?;
    let content =
        serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")?;
    fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
