//! Dual-mode pagination cursor.
//!
//! The listing is walked by record offset until the source stops advancing
//! (the same leading record comes back twice), then by explicit page number.
//!
//! ```text
//!   Offset ──(stall)──> Page
//!     │                   │
//!     └──(empty | short)──┴──> Done
//! ```

use serde_json::Value;

use crate::error::SourceResult;
use crate::extract::{extract_batch, first_id};
use crate::fetcher::{PageSelector, PageSource};

/// Cursor state
#[derive(Debug, Clone, PartialEq)]
pub enum CursorMode {
    Offset {
        /// Offset of the next request
        offset: u64,
        /// Offset of the last yielded batch
        last_offset: u64,
        /// Leading record id of the last yielded batch
        last_first_id: Option<Value>,
    },
    Page {
        page: u64,
    },
    Done,
}

/// What to do with a batch just fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Hand the batch to the caller
    Yield,
    /// Discard the batch and fetch again under the new mode
    Refetch,
    /// Discard the batch; there is no more data
    End,
}

/// Pure pagination state machine, independent of any I/O
#[derive(Debug, Clone)]
pub struct Cursor {
    mode: CursorMode,
    limit: u32,
}

impl Cursor {
    pub fn new(limit: u32) -> Self {
        Self {
            mode: CursorMode::Offset {
                offset: 0,
                last_offset: 0,
                last_first_id: None,
            },
            limit,
        }
    }

    pub fn mode(&self) -> &CursorMode {
        &self.mode
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The next request to make, or `None` once finished
    pub fn selector(&self) -> Option<PageSelector> {
        match self.mode {
            CursorMode::Offset { offset, .. } => Some(PageSelector::Offset(offset)),
            CursorMode::Page { page } => Some(PageSelector::Page(page)),
            CursorMode::Done => None,
        }
    }

    /// Advance on a fetched batch of `len` records led by `first_id`
    pub fn observe(&mut self, len: usize, first_id: Option<&Value>) -> Step {
        if len == 0 {
            self.mode = CursorMode::Done;
            return Step::End;
        }
        let limit = u64::from(self.limit);
        let short = (len as u64) < limit;

        match &self.mode {
            CursorMode::Offset {
                offset,
                last_offset,
                last_first_id,
            } => {
                let stalled = matches!((first_id, last_first_id), (Some(a), Some(b)) if a == b);
                if stalled {
                    let page = last_offset / limit + 2;
                    log::info!(
                        "Offset pagination stalled at offset {}, switching to page {}",
                        offset,
                        page
                    );
                    self.mode = CursorMode::Page { page };
                    return Step::Refetch;
                }
                self.mode = if short {
                    CursorMode::Done
                } else {
                    CursorMode::Offset {
                        offset: offset + len as u64,
                        last_offset: *offset,
                        last_first_id: first_id.cloned(),
                    }
                };
            }
            CursorMode::Page { page } => {
                self.mode = if short {
                    CursorMode::Done
                } else {
                    CursorMode::Page { page: page + 1 }
                };
            }
            CursorMode::Done => return Step::End,
        }

        if short {
            log::info!("Final batch reached ({} records)", len);
        }
        Step::Yield
    }
}

/// Lazily drains a [`PageSource`], one batch per call.
///
/// A paginator cannot be rewound; a new run starts a new paginator.
pub struct Paginator<S> {
    source: S,
    cursor: Cursor,
    batch_keys: Vec<String>,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S, limit: u32, batch_keys: Vec<String>) -> Self {
        Self {
            source,
            cursor: Cursor::new(limit),
            batch_keys,
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the next batch; `Ok(None)` when the listing is exhausted
    pub async fn next_batch(&mut self) -> SourceResult<Option<Vec<Value>>> {
        loop {
            let Some(selector) = self.cursor.selector() else {
                return Ok(None);
            };
            let payload = self.source.fetch(selector, self.cursor.limit()).await?;
            let batch = extract_batch(payload, &self.batch_keys);

            match self.cursor.observe(batch.len(), first_id(&batch)) {
                Step::Yield => return Ok(Some(batch)),
                Step::Refetch => continue,
                Step::End => {
                    log::info!("No more data, pagination ended");
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
