//! st-core - Core library for stocktake
//!
//! This crate provides configuration parsing, the fixed destination schemas,
//! and the pure transformation stages of a snapshot run: flattening raw
//! product payloads, run-scoped deduplication, and type coercion into
//! cleaned batches.

pub mod clean;
pub mod config;
pub mod dedup;
pub mod elapsed;
pub mod error;
pub mod record;
pub mod schema;
pub(crate) mod serde_helpers;
pub mod sql_utils;
pub mod table_name;
pub mod text;

pub use clean::{clean_rows, Cell, CleanBatch};
pub use config::{Config, Credentials, ProbeConfig};
pub use dedup::{DedupEngine, WarehouseKey};
pub use elapsed::format_elapsed;
pub use error::{CoreError, CoreResult};
pub use record::{FlatRow, Flattener, ProductId, RawProduct};
pub use schema::{ColumnDef, ColumnKind, TableKind, TableSchema, PRODUCT_SCHEMA, WAREHOUSE_SCHEMA};
pub use table_name::TableName;
