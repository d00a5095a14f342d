//! Configuration types and parsing for stocktake.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::keys;
use crate::table_name::TableName;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the source API client id
pub const CLIENT_ID_ENV: &str = "STOCKTAKE_CLIENT_ID";

/// Environment variable holding the source API client secret
pub const CLIENT_SECRET_ENV: &str = "STOCKTAKE_CLIENT_SECRET";

/// Default configuration file name looked up in the project directory
pub const CONFIG_FILE_NAME: &str = "stocktake.yml";

/// Main configuration from stocktake.yml
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// usable configuration. Credentials are deliberately absent: see
/// [`Credentials::from_env`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Source API settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Destination database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Destination table names
    #[serde(default)]
    pub tables: TablesConfig,

    /// Drop products flagged as archived or deleted
    #[serde(default)]
    pub filter_archived: bool,

    /// Query and print per-row load errors after each write
    #[serde(default)]
    pub verbose_load_errors: bool,

    /// Ordered candidate keys probed when reading heterogeneous payloads
    #[serde(default)]
    pub probes: ProbeConfig,
}

/// Source API connection and paging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Base URL; the product listing lives at `{base_url}/product/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records requested per page
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Retries after the first attempt before a fetch fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Each retry waits `backoff_base ^ attempt` seconds
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Destination database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Schema qualifying every destination table
    #[serde(default)]
    pub schema: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            schema: None,
        }
    }
}

/// Destination tables. Only the two snapshot tables are written; the history
/// tables exist so they can be provisioned alongside them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TablesConfig {
    #[serde(default = "default_product_snapshot")]
    pub product_snapshot: TableName,

    #[serde(default = "default_warehouse_snapshot")]
    pub warehouse_snapshot: TableName,

    #[serde(default = "default_product_history")]
    pub product_history: TableName,

    #[serde(default = "default_warehouse_history")]
    pub warehouse_history: TableName,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            product_snapshot: default_product_snapshot(),
            warehouse_snapshot: default_warehouse_snapshot(),
            product_history: default_product_history(),
            warehouse_history: default_warehouse_history(),
        }
    }
}

/// Ordered candidate field names, tried first to last.
///
/// The source API is inconsistent about naming nested attributes, so each
/// lookup walks its list and takes the first truthy value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Label of a tag entry
    #[serde(default = "default_tag_label")]
    pub tag_label: Vec<String>,

    /// Vendor of a cart entry
    #[serde(default = "default_cart_vendor")]
    pub cart_vendor: Vec<String>,

    /// Store name of a cart entry
    #[serde(default = "default_cart_name")]
    pub cart_name: Vec<String>,

    /// Product flags marking a record archived or deleted
    #[serde(default = "default_archived_flags")]
    pub archived_flags: Vec<String>,

    /// Payload keys that may hold a page's record list
    #[serde(default = "default_batch_keys")]
    pub batch_keys: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tag_label: default_tag_label(),
            cart_vendor: default_cart_vendor(),
            cart_name: default_cart_name(),
            archived_flags: default_archived_flags(),
            batch_keys: default_batch_keys(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.ordoro.com".to_string()
}

fn default_page_limit() -> u32 {
    100
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_base() -> f64 {
    1.4
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_db_path() -> String {
    "stocktake.duckdb".to_string()
}

fn default_product_snapshot() -> TableName {
    TableName::new("INVENTORY_PRODUCT_LEVEL_SNAP")
}

fn default_warehouse_snapshot() -> TableName {
    TableName::new("INVENTORY_WAREHOUSE_LEVEL_SNAP")
}

fn default_product_history() -> TableName {
    TableName::new("INVENTORY_PRODUCT_LEVEL_HIST")
}

fn default_warehouse_history() -> TableName {
    TableName::new("INVENTORY_WAREHOUSE_LEVEL_HIST")
}

fn default_tag_label() -> Vec<String> {
    keys(&["name", "label", "tag", "value", "title"])
}

fn default_cart_vendor() -> Vec<String> {
    keys(&["vendor", "channel", "platform", "site"])
}

fn default_cart_name() -> Vec<String> {
    keys(&["name", "store", "account"])
}

fn default_archived_flags() -> Vec<String> {
    keys(&["archived", "is_archived", "deleted", "is_deleted"])
}

fn default_batch_keys() -> Vec<String> {
    keys(&["product", "products", "results", "data", "items"])
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        // An empty document deserializes to unit, not to an empty mapping
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `stocktake.yml` from a project directory, falling back to defaults
    /// when the directory has none.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            log::info!(
                "No {} in {}, using default configuration",
                CONFIG_FILE_NAME,
                dir.display()
            );
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        let base = &self.source.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::ConfigInvalid {
                message: format!("source.base_url must be an http(s) URL, got '{}'", base),
            });
        }

        if self.source.page_limit == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "source.page_limit must be at least 1".to_string(),
            });
        }

        if !(self.source.backoff_base.is_finite() && self.source.backoff_base > 0.0) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "source.backoff_base must be a positive number, got {}",
                    self.source.backoff_base
                ),
            });
        }

        let probes = [
            ("tag_label", &self.probes.tag_label),
            ("cart_vendor", &self.probes.cart_vendor),
            ("cart_name", &self.probes.cart_name),
            ("archived_flags", &self.probes.archived_flags),
            ("batch_keys", &self.probes.batch_keys),
        ];
        for (name, list) in probes {
            if list.is_empty() || list.iter().any(|k| k.is_empty()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("probes.{} must list at least one non-empty key", name),
                });
            }
        }

        Ok(())
    }

    /// Fully qualified name of a destination table, applying `database.schema`
    pub fn qualified_table(&self, table: &TableName) -> String {
        table.qualified(self.database.schema.as_deref())
    }

    /// URL of the paginated product listing
    pub fn product_endpoint(&self) -> String {
        format!("{}/product/", self.source.base_url.trim_end_matches('/'))
    }
}

/// Source API credential pair.
///
/// Read from the environment only, never from the config file.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    client_secret: SecretString,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    /// Read the credential pair from `STOCKTAKE_CLIENT_ID` / `STOCKTAKE_CLIENT_SECRET`.
    ///
    /// An unset or empty variable is a configuration error.
    pub fn from_env() -> CoreResult<Self> {
        let client_id = required_env(CLIENT_ID_ENV)?;
        let client_secret = required_env(CLIENT_SECRET_ENV)?;
        Ok(Self::new(client_id, client_secret))
    }

    /// The secret half of the pair
    pub fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }
}

fn required_env(var: &str) -> CoreResult<String> {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(CoreError::MissingCredential {
            var: var.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
