//! Validate command implementation

use anyhow::{Context, Result};
use st_core::Credentials;

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::context::load_config;

/// Execute the validate command
pub(crate) async fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;

    println!("Endpoint:        {}", config.product_endpoint());
    println!("Page limit:      {}", config.source.page_limit);
    println!(
        "Retries:         {} (backoff base {})",
        config.source.max_retries, config.source.backoff_base
    );
    println!("Database:        {}", config.database.path);
    println!(
        "Snapshot tables: {}, {}",
        config.qualified_table(&config.tables.product_snapshot),
        config.qualified_table(&config.tables.warehouse_snapshot)
    );
    println!("Filter archived: {}", config.filter_archived);

    if args.skip_credentials {
        println!("Credentials:     skipped");
    } else {
        let credentials =
            Credentials::from_env().context("Source API credentials are not set")?;
        println!("Credentials:     client {}", credentials.client_id);
    }

    println!("\nConfiguration is valid");
    Ok(())
}
