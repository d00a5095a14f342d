//! Flattening raw product payloads into product and warehouse rows.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::config::{Config, ProbeConfig};
use crate::text::{join_carts, join_tags, probe, value_text, Nested};

/// One undecoded product record as returned by the source API
pub type RawProduct = Map<String, Value>;

/// Scalar product attributes: (destination column, raw field)
const PRODUCT_FIELDS: [(&str, &str); 19] = [
    ("PRODUCT_ID", "id"),
    ("SKU", "sku"),
    ("NAME", "name"),
    ("PRICE", "price"),
    ("COST", "cost"),
    ("UPC", "upc"),
    ("ASIN", "asin"),
    ("COUNTRY", "country_of_origin"),
    ("UPDATED", "updated"),
    ("TOTAL_ON_HAND", "total_on_hand"),
    ("TOTAL_AVAILABLE", "total_available"),
    ("TOTAL_COMMITTED", "total_committed"),
    ("TOTAL_ALLOCATED", "total_allocated"),
    ("TOTAL_UNALLOCATED", "total_unallocated"),
    ("TOTAL_MFG_ORDERED", "total_mfg_ordered"),
    ("TO_BE_SHIPPED", "to_be_shipped"),
    ("HEIGHT", "height"),
    ("WEIGHT", "weight"),
    ("WIDTH", "width"),
];

/// Warehouse entry attributes: (destination column, raw field)
const WAREHOUSE_FIELDS: [(&str, &str); 18] = [
    ("WH_ID", "id"),
    ("WH_NAME", "warehouse_name"),
    ("WH_UPDATED", "updated"),
    ("WH_CREATED", "warehouse_created_date"),
    ("WH_LAST_CHANGE", "warehouse_updated_date"),
    ("LOW_STOCK_THTD", "low_stock_threshold"),
    ("OOS_THTD", "out_of_stock_threshold"),
    ("POH", "physical_on_hand"),
    ("AOH", "available"),
    ("CMT", "committed"),
    ("OMO", "mfg_ordered"),
    ("OPO", "po_committed"),
    ("ON_HAND", "on_hand"),
    ("ALLOCATED", "allocated"),
    ("UNALLOCATED", "unallocated"),
    ("WH_SHIP_CFG", "is_configured_for_shipping"),
    ("WH_IS_DEFAULT", "is_default_location"),
    ("LOCATION", "location_in_warehouse"),
];

/// Canonical identity of a product within a run.
///
/// Ids are compared by their text form, so `1` and `"1"` are the same product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(String);

impl ProductId {
    /// Read the identity from a raw `id` value; null has no identity.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Some(Self(value_text(other))),
        }
    }

    /// Identity of a raw product, if it carries one
    pub fn of(product: &RawProduct) -> Option<Self> {
        product.get("id").and_then(Self::from_value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A flattened row: destination column name to the raw value mapped onto it.
///
/// Column order is not meaningful here; the cleaning stage reindexes rows
/// against a fixed schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    fields: BTreeMap<&'static str, Value>,
}

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: Value) {
        self.fields.insert(column, value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Column names present in this row, sorted
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Maps raw products to product and warehouse rows
#[derive(Debug, Clone)]
pub struct Flattener {
    probes: ProbeConfig,
    filter_archived: bool,
}

impl Flattener {
    pub fn new(probes: ProbeConfig, filter_archived: bool) -> Self {
        Self {
            probes,
            filter_archived,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.probes.clone(), config.filter_archived)
    }

    /// Whether any archived/deleted flag on the product is truthy
    pub fn is_archived(&self, product: &RawProduct) -> bool {
        probe(product, &self.probes.archived_flags).is_some()
    }

    /// The product-level row, or `None` when the archived filter drops it
    pub fn product_row(&self, product: &RawProduct) -> Option<FlatRow> {
        if self.filter_archived && self.is_archived(product) {
            return None;
        }

        let mut row = FlatRow::new();
        for (column, field) in PRODUCT_FIELDS {
            row.set(column, field_value(product, field));
        }
        row.set(
            "TAGS",
            Value::String(join_tags(
                Nested::from_value(product.get("tags")),
                &self.probes.tag_label,
            )),
        );
        row.set(
            "CARTS",
            Value::String(join_carts(
                Nested::from_value(product.get("carts")),
                &self.probes.cart_vendor,
                &self.probes.cart_name,
            )),
        );
        Some(row)
    }

    /// One row per warehouse entry, each carrying the product-level columns.
    ///
    /// Entries that are not mappings are skipped.
    pub fn warehouse_rows(&self, product: &RawProduct) -> Vec<FlatRow> {
        let Some(base) = self.product_row(product) else {
            return Vec::new();
        };
        let entries = match product.get("warehouses") {
            Some(Value::Array(entries)) => entries.as_slice(),
            _ => &[],
        };

        entries
            .iter()
            .filter_map(Value::as_object)
            .map(|warehouse| {
                let mut row = base.clone();
                for (column, field) in WAREHOUSE_FIELDS {
                    row.set(column, field_value(warehouse, field));
                }
                row
            })
            .collect()
    }
}

fn field_value(map: &Map<String, Value>, field: &str) -> Value {
    map.get(field).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
