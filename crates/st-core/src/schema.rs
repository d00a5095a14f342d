//! Fixed destination schemas.
//!
//! Both snapshot tables have an explicit, ordered column list. Every cleaned
//! batch conforms to one of these exactly; nothing is inferred from payloads.

use std::fmt;

/// Semantic type of a destination column, which drives coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text, passed through
    Text,
    /// Timezone-naive UTC timestamp, null when unparsable
    Timestamp,
    /// Float rounded to 2 decimal places, null when unparsable
    Currency,
    /// Whole number, zero when unparsable; never null
    Integer,
    /// Whole number, null when unparsable
    NullableInteger,
    /// Float, null when unparsable
    Number,
    /// Tri-state boolean
    Flag,
}

impl ColumnKind {
    /// Whether cleaned values of this kind may be null
    pub fn is_nullable(self) -> bool {
        !matches!(self, ColumnKind::Integer)
    }
}

/// One named, typed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef { name, kind }
}

/// Which of the two row shapes a schema describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Product,
    Warehouse,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Product => write!(f, "product"),
            TableKind::Warehouse => write!(f, "warehouse"),
        }
    }
}

/// An ordered destination column list
#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub kind: TableKind,
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    /// Column names in target order
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Position of a column by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

use ColumnKind::{Currency, Flag, Integer, NullableInteger, Number, Text, Timestamp};

/// Product-level columns after the identity column, shared by both tables.
const PRODUCT_ATTRIBUTES: [ColumnDef; 20] = [
    col("SKU", Text),
    col("NAME", Text),
    col("PRICE", Currency),
    col("COST", Currency),
    col("UPC", Text),
    col("ASIN", Text),
    col("COUNTRY", Text),
    col("UPDATED", Timestamp),
    col("TOTAL_ON_HAND", Integer),
    col("TOTAL_AVAILABLE", Integer),
    col("TOTAL_COMMITTED", Integer),
    col("TOTAL_ALLOCATED", Integer),
    col("TOTAL_UNALLOCATED", Integer),
    col("TOTAL_MFG_ORDERED", Integer),
    col("TO_BE_SHIPPED", Integer),
    col("HEIGHT", Number),
    col("WEIGHT", Number),
    col("WIDTH", Number),
    col("TAGS", Text),
    col("CARTS", Text),
];

const fn product_columns() -> [ColumnDef; 21] {
    let mut out = [col("PRODUCT_ID", NullableInteger); 21];
    let mut i = 0;
    while i < PRODUCT_ATTRIBUTES.len() {
        out[i + 1] = PRODUCT_ATTRIBUTES[i];
        i += 1;
    }
    out
}

const WAREHOUSE_ATTRIBUTES: [ColumnDef; 18] = [
    col("WH_ID", Integer),
    col("WH_NAME", Text),
    col("WH_UPDATED", Timestamp),
    col("WH_CREATED", Timestamp),
    col("WH_LAST_CHANGE", Timestamp),
    col("LOW_STOCK_THTD", Integer),
    col("OOS_THTD", Integer),
    col("POH", Integer),
    col("AOH", Integer),
    col("CMT", Integer),
    col("OMO", Integer),
    col("OPO", Integer),
    col("ON_HAND", Integer),
    col("ALLOCATED", Integer),
    col("UNALLOCATED", Integer),
    col("WH_SHIP_CFG", Flag),
    col("WH_IS_DEFAULT", Flag),
    col("LOCATION", Text),
];

const fn warehouse_columns() -> [ColumnDef; 39] {
    // In warehouse rows the product id is a non-null join key
    let mut out = [col("PRODUCT_ID", Integer); 39];
    let mut i = 0;
    while i < PRODUCT_ATTRIBUTES.len() {
        out[i + 1] = PRODUCT_ATTRIBUTES[i];
        i += 1;
    }
    let mut j = 0;
    while j < WAREHOUSE_ATTRIBUTES.len() {
        out[j + 1 + PRODUCT_ATTRIBUTES.len()] = WAREHOUSE_ATTRIBUTES[j];
        j += 1;
    }
    out
}

static PRODUCT_COLUMNS: [ColumnDef; 21] = product_columns();
static WAREHOUSE_COLUMNS: [ColumnDef; 39] = warehouse_columns();

/// Product snapshot schema: one row per distinct product id
pub static PRODUCT_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Product,
    columns: &PRODUCT_COLUMNS,
};

/// Warehouse snapshot schema: one row per (product, warehouse, updated stamp)
pub static WAREHOUSE_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Warehouse,
    columns: &WAREHOUSE_COLUMNS,
};

impl TableKind {
    /// The fixed schema for this row shape
    pub fn schema(self) -> &'static TableSchema {
        match self {
            TableKind::Product => &PRODUCT_SCHEMA,
            TableKind::Warehouse => &WAREHOUSE_SCHEMA,
        }
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
