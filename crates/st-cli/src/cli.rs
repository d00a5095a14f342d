//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Stocktake - full-refresh inventory snapshots from a paginated product API
#[derive(Parser, Debug)]
#[command(name = "stocktake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Records requested per page
    #[arg(long, global = true, env = "PAGE_LIMIT")]
    pub page_limit: Option<u32>,

    /// Retries after the first attempt before a fetch fails
    #[arg(long, global = true, env = "MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Base of the exponential backoff between retries, in seconds
    #[arg(long, global = true, env = "BACKOFF_BASE")]
    pub backoff_base: Option<f64>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full snapshot: truncate, then load every page
    Run(RunArgs),

    /// Create the destination tables if they do not exist
    Init(InitArgs),

    /// Check configuration and credentials without touching the source or database
    Validate(ValidateArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Print per-row load errors after each write
    #[arg(long)]
    pub verbose_load_errors: bool,

    /// Suppress the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Also write a default stocktake.yml if the project has none
    #[arg(long)]
    pub write_config: bool,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Do not require API credentials in the environment
    #[arg(long)]
    pub skip_credentials: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
