//! st-pipeline - Snapshot orchestration for stocktake
//!
//! A run truncates both snapshot tables, then drains the product listing one
//! batch at a time: flatten, deduplicate against run-scoped identity sets,
//! clean, and write. Nothing but the identity sets and running totals carries
//! over between batches.

pub mod error;
pub mod runner;

pub use error::{PipelineError, PipelineResult};
pub use runner::{BatchReport, RunSummary, SnapshotRunner, SnapshotTables};
