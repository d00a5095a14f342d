//! st-db - Destination layer for stocktake
//!
//! This crate provides the `Warehouse` trait (truncate, batch write with
//! per-row rejection, load diagnostics, table provisioning) and its DuckDB
//! implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::{DuckDbBackend, LOAD_ERRORS_TABLE};
pub use error::{DbError, DbResult};
pub use traits::{LoadError, Warehouse, WriteReport};
