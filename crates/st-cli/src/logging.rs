//! Log output for the CLI.
//!
//! Library crates log through the `log` facade; the subscriber installed here
//! captures those records and writes them to stderr.

use tracing_subscriber::EnvFilter;

/// Crates whose records `--verbose` raises to debug
const OWN_CRATES: [&str; 5] = ["stocktake", "st_core", "st_source", "st_db", "st_pipeline"];

/// Install the global subscriber. `RUST_LOG` wins unless `--verbose` is set.
pub(crate) fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(verbose_directives())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn verbose_directives() -> String {
    let mut directives = vec!["info".to_string()];
    directives.extend(OWN_CRATES.iter().map(|c| format!("{}=debug", c)));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_directives_parse() {
        let directives = verbose_directives();
        assert!(directives.starts_with("info,"));
        assert!(directives.contains("st_source=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
