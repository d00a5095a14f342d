//! Type coercion of flattened rows into schema-conformant batches.
//!
//! Coercion never fails: an unparsable value becomes null, or zero for the
//! never-null integer columns.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::record::FlatRow;
use crate::schema::{ColumnKind, TableSchema};

/// One cleaned, typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Timezone-naive, in UTC
    Timestamp(NaiveDateTime),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Rows aligned to a fixed schema, one cell per column in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct CleanBatch {
    schema: &'static TableSchema,
    rows: Vec<Vec<Cell>>,
}

impl CleanBatch {
    /// A zero-row batch that still carries every target column
    pub fn empty(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.schema.position(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

/// Coerce a batch of flattened rows to `schema`.
///
/// Columns missing from a row are treated as null, extra columns are dropped.
pub fn clean_rows(schema: &'static TableSchema, rows: &[FlatRow]) -> CleanBatch {
    let rows = rows
        .iter()
        .map(|row| {
            schema
                .columns
                .iter()
                .map(|col| coerce(col.kind, row.get(col.name)))
                .collect()
        })
        .collect();
    CleanBatch { schema, rows }
}

/// Coerce one raw value to a column kind
pub fn coerce(kind: ColumnKind, value: Option<&Value>) -> Cell {
    let value = value.unwrap_or(&Value::Null);
    match kind {
        ColumnKind::Text => match value {
            Value::Null => Cell::Null,
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        },
        ColumnKind::Timestamp => parse_timestamp(value).map_or(Cell::Null, Cell::Timestamp),
        ColumnKind::Currency => parse_number(value)
            .map(|n| Cell::Float((n * 100.0).round_ties_even() / 100.0))
            .unwrap_or(Cell::Null),
        ColumnKind::Integer => Cell::Int(parse_integer(value).unwrap_or(0)),
        ColumnKind::NullableInteger => parse_integer(value).map_or(Cell::Null, Cell::Int),
        ColumnKind::Number => parse_number(value).map_or(Cell::Null, Cell::Float),
        ColumnKind::Flag => parse_flag(value).map_or(Cell::Null, Cell::Bool),
    }
}

/// Lenient numeric parse: numbers, numeric strings, and booleans as 0/1.
pub fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Whole number, rounding half to even. Exact integers skip the float path.
fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_i64() => n.as_i64(),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => Some(i),
            Err(_) => parse_number(value).map(|n| n.round_ties_even() as i64),
        },
        _ => parse_number(value).map(|n| n.round_ties_even() as i64),
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Parse a timestamp string. Zone-aware values are shifted to UTC and the
/// offset dropped; numbers are not treated as epochs.
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let Value::String(s) = value else {
        return None;
    };
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Tri-state flag: `None` when the value is null or unrecognised
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(false),
            Some(f) if f == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(true),
            "false" | "f" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
#[path = "clean_test.rs"]
mod tests;
