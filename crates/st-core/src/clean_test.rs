use super::*;
use crate::config::ProbeConfig;
use crate::record::Flattener;
use crate::schema::{PRODUCT_SCHEMA, WAREHOUSE_SCHEMA};
use chrono::NaiveDate;
use serde_json::json;

fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

#[test]
fn test_quantity_unparsable_is_zero_not_null() {
    assert_eq!(coerce(ColumnKind::Integer, Some(&json!("abc"))), Cell::Int(0));
    assert_eq!(coerce(ColumnKind::Integer, Some(&Value::Null)), Cell::Int(0));
    assert_eq!(coerce(ColumnKind::Integer, None), Cell::Int(0));
}

#[test]
fn test_quantity_rounds_half_to_even() {
    assert_eq!(coerce(ColumnKind::Integer, Some(&json!(2.5))), Cell::Int(2));
    assert_eq!(coerce(ColumnKind::Integer, Some(&json!(3.5))), Cell::Int(4));
    assert_eq!(coerce(ColumnKind::Integer, Some(&json!("7.6"))), Cell::Int(8));
    assert_eq!(coerce(ColumnKind::Integer, Some(&json!(" 12 "))), Cell::Int(12));
    assert_eq!(coerce(ColumnKind::Integer, Some(&json!(-4))), Cell::Int(-4));
}

#[test]
fn test_large_ids_keep_precision() {
    let id = 9_007_199_254_740_993_i64;
    assert_eq!(coerce(ColumnKind::Integer, Some(&json!(id))), Cell::Int(id));
    assert_eq!(
        coerce(ColumnKind::NullableInteger, Some(&json!(id.to_string()))),
        Cell::Int(id)
    );
}

#[test]
fn test_nullable_integer() {
    assert_eq!(coerce(ColumnKind::NullableInteger, Some(&json!("x"))), Cell::Null);
    assert_eq!(coerce(ColumnKind::NullableInteger, Some(&json!(5))), Cell::Int(5));
}

#[test]
fn test_currency_two_decimals() {
    assert_eq!(coerce(ColumnKind::Currency, Some(&json!("9.999"))), Cell::Float(10.0));
    assert_eq!(coerce(ColumnKind::Currency, Some(&json!(1.234))), Cell::Float(1.23));
    assert_eq!(coerce(ColumnKind::Currency, Some(&json!("free"))), Cell::Null);
    assert_eq!(coerce(ColumnKind::Currency, None), Cell::Null);
}

#[test]
fn test_number_nullable() {
    assert_eq!(coerce(ColumnKind::Number, Some(&json!("2.75"))), Cell::Float(2.75));
    assert_eq!(coerce(ColumnKind::Number, Some(&json!(""))), Cell::Null);
    assert_eq!(coerce(ColumnKind::Number, Some(&json!("NaN"))), Cell::Null);
}

#[test]
fn test_timestamp_zone_aware_shifted_to_utc() {
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-03-01T10:00:00-05:00"))),
        Cell::Timestamp(ts(2024, 3, 1, 15, 0, 0))
    );
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-03-01T10:00:00Z"))),
        Cell::Timestamp(ts(2024, 3, 1, 10, 0, 0))
    );
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-03-01 23:30:00+02:00"))),
        Cell::Timestamp(ts(2024, 3, 1, 21, 30, 0))
    );
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-01-01T10:00:00+0000"))),
        Cell::Timestamp(ts(2024, 1, 1, 10, 0, 0))
    );
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-01-01T10:00:00.5-0130"))),
        Cell::Timestamp(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_milli_opt(11, 30, 0, 500)
                .unwrap()
        )
    );
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-01-01T10:00+02:00"))),
        Cell::Timestamp(ts(2024, 1, 1, 8, 0, 0))
    );
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-01-01 10:00-03:00"))),
        Cell::Timestamp(ts(2024, 1, 1, 13, 0, 0))
    );
}

#[test]
fn test_timestamp_naive_and_date_only() {
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-03-01 08:15:30"))),
        Cell::Timestamp(ts(2024, 3, 1, 8, 15, 30))
    );
    assert_eq!(
        coerce(ColumnKind::Timestamp, Some(&json!("2024-01-01"))),
        Cell::Timestamp(ts(2024, 1, 1, 0, 0, 0))
    );
}

#[test]
fn test_timestamp_unparsable_is_null() {
    assert_eq!(coerce(ColumnKind::Timestamp, Some(&json!("yesterday"))), Cell::Null);
    assert_eq!(coerce(ColumnKind::Timestamp, Some(&json!(1_700_000_000))), Cell::Null);
    assert_eq!(coerce(ColumnKind::Timestamp, None), Cell::Null);
}

#[test]
fn test_flag_tri_state() {
    assert_eq!(coerce(ColumnKind::Flag, Some(&json!(true))), Cell::Bool(true));
    assert_eq!(coerce(ColumnKind::Flag, Some(&json!(0))), Cell::Bool(false));
    assert_eq!(coerce(ColumnKind::Flag, Some(&json!("Yes"))), Cell::Bool(true));
    assert_eq!(coerce(ColumnKind::Flag, Some(&json!("maybe"))), Cell::Null);
    assert_eq!(coerce(ColumnKind::Flag, Some(&json!(2))), Cell::Null);
    assert_eq!(coerce(ColumnKind::Flag, None), Cell::Null);
}

#[test]
fn test_text_passthrough() {
    assert_eq!(coerce(ColumnKind::Text, Some(&json!("abc"))), Cell::Text("abc".into()));
    assert_eq!(coerce(ColumnKind::Text, Some(&json!(12345))), Cell::Text("12345".into()));
    assert_eq!(coerce(ColumnKind::Text, Some(&Value::Null)), Cell::Null);
}

#[test]
fn test_empty_batch_keeps_all_columns() {
    let batch = clean_rows(&WAREHOUSE_SCHEMA, &[]);
    assert!(batch.is_empty());
    assert_eq!(batch.schema().len(), 39);
    assert_eq!(batch.column("LOCATION"), Some(Vec::new()));
    assert_eq!(batch, CleanBatch::empty(&WAREHOUSE_SCHEMA));
}

#[test]
fn test_rows_follow_schema_order_with_missing_columns() {
    let mut row = FlatRow::new();
    row.set("CARTS", json!("c"));
    row.set("PRODUCT_ID", json!("17"));
    row.set("EXTRA", json!("dropped"));

    let batch = clean_rows(&PRODUCT_SCHEMA, &[row]);
    assert_eq!(batch.len(), 1);
    let cells = &batch.rows()[0];
    assert_eq!(cells.len(), PRODUCT_SCHEMA.len());
    assert_eq!(cells[0], Cell::Int(17));
    assert_eq!(cells[20], Cell::Text("c".into()));
    assert_eq!(cells[1], Cell::Null);
    // TOTAL_ON_HAND
    assert_eq!(cells[9], Cell::Int(0));
}

#[test]
fn test_quantity_columns_never_null_in_warehouse_batch() {
    let product = json!({
        "id": 1,
        "total_on_hand": "n/a",
        "warehouses": [{"id": "2", "physical_on_hand": null, "available": "x"}]
    });
    let flattener = Flattener::new(ProbeConfig::default(), false);
    let rows = flattener.warehouse_rows(product.as_object().unwrap());
    let batch = clean_rows(&WAREHOUSE_SCHEMA, &rows);

    for col in WAREHOUSE_SCHEMA.columns {
        if col.kind == ColumnKind::Integer {
            let cells = batch.column(col.name).unwrap();
            assert!(cells.iter().all(|c| !c.is_null()), "{} has nulls", col.name);
        }
    }
    assert_eq!(batch.column("WH_ID").unwrap(), vec![&Cell::Int(2)]);
    assert_eq!(batch.column("POH").unwrap(), vec![&Cell::Int(0)]);
}
