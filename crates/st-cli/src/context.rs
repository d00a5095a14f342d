//! Configuration resolution for CLI commands

use anyhow::{Context, Result};
use st_core::Config;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Load the configuration and apply command-line and environment overrides.
///
/// A relative database path resolves against the project directory.
pub(crate) fn load_config(args: &GlobalArgs) -> Result<Config> {
    let project_path = Path::new(&args.project_dir);

    let mut config = if let Some(config_path) = &args.config {
        Config::load(Path::new(config_path)).context("Failed to load configuration file")?
    } else {
        Config::load_from_dir(project_path).context("Failed to load project configuration")?
    };

    if let Some(limit) = args.page_limit {
        config.source.page_limit = limit;
    }
    if let Some(retries) = args.max_retries {
        config.source.max_retries = retries;
    }
    if let Some(base) = args.backoff_base {
        config.source.backoff_base = base;
    }
    if let Some(db) = &args.database {
        config.database.path = db.clone();
    }

    if config.database.path != ":memory:" && Path::new(&config.database.path).is_relative() {
        config.database.path = project_path
            .join(&config.database.path)
            .display()
            .to_string();
    }

    config
        .validate()
        .context("Invalid configuration after applying overrides")?;
    Ok(config)
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
