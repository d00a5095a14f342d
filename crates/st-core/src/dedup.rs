//! Run-scoped deduplication.
//!
//! A product is admitted once per id. A warehouse row is admitted once per
//! (product id, warehouse id, warehouse updated stamp), so a warehouse whose
//! stamp changes between pages is a new observation.

use std::collections::HashSet;

use crate::record::{FlatRow, ProductId};
use crate::text::value_text;

/// Composite identity of a warehouse observation.
///
/// Each component is the text form of the raw value; null renders empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WarehouseKey {
    pub product_id: String,
    pub warehouse_id: String,
    pub updated: String,
}

impl WarehouseKey {
    pub fn from_row(row: &FlatRow) -> Self {
        let text = |column: &str| row.get(column).map(value_text).unwrap_or_default();
        Self {
            product_id: text("PRODUCT_ID"),
            warehouse_id: text("WH_ID"),
            updated: text("WH_UPDATED"),
        }
    }
}

/// Identity sets for one run. Create one per run and drop it at the end.
#[derive(Debug, Default)]
pub struct DedupEngine {
    seen_pid: HashSet<ProductId>,
    seen_wh: HashSet<WarehouseKey>,
}

impl DedupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a product id, recording it. Returns false if it was already seen.
    pub fn admit_product(&mut self, id: &ProductId) -> bool {
        if self.seen_pid.contains(id) {
            return false;
        }
        self.seen_pid.insert(id.clone())
    }

    /// Admit a warehouse row by its composite key. Returns false on a repeat.
    pub fn admit_warehouse(&mut self, row: &FlatRow) -> bool {
        self.seen_wh.insert(WarehouseKey::from_row(row))
    }

    pub fn has_product(&self, id: &ProductId) -> bool {
        self.seen_pid.contains(id)
    }

    pub fn products_seen(&self) -> usize {
        self.seen_pid.len()
    }

    pub fn warehouse_keys_seen(&self) -> usize {
        self.seen_wh.len()
    }
}

#[cfg(test)]
#[path = "dedup_test.rs"]
mod tests;
