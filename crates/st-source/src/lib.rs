//! st-source - Source API access for stocktake
//!
//! This crate provides the retrying HTTP fetcher for the product listing and
//! the dual-mode (offset, then page number) pagination cursor that drains it
//! one batch at a time.

pub mod error;
pub mod extract;
pub mod fetcher;
pub mod pagination;

pub use error::{SourceError, SourceResult};
pub use extract::extract_batch;
pub use fetcher::{HttpFetcher, PageSelector, PageSource, RetryPolicy};
pub use pagination::{Cursor, CursorMode, Paginator, Step};
