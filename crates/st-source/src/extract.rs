//! Locating the record list inside a decoded page payload.

use serde_json::Value;

/// Pull the batch of records out of a page payload.
///
/// A list payload is the batch. A mapping yields the first list found under
/// `batch_keys`; a non-empty mapping with no such key is a batch of one.
/// Anything else is an empty batch.
pub fn extract_batch(payload: Value, batch_keys: &[String]) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let key = batch_keys
                .iter()
                .find(|k| matches!(map.get(k.as_str()), Some(Value::Array(_))));
            if let Some(Value::Array(items)) = key.and_then(|k| map.remove(k.as_str())) {
                return items;
            }
            if map.is_empty() {
                Vec::new()
            } else {
                vec![Value::Object(map)]
            }
        }
        _ => Vec::new(),
    }
}

/// The non-null `id` of the first record, used for stall detection
pub fn first_id(batch: &[Value]) -> Option<&Value> {
    batch
        .first()
        .and_then(Value::as_object)
        .and_then(|record| record.get("id"))
        .filter(|id| !id.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys() -> Vec<String> {
        ["product", "products", "results", "data", "items"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_list_payload_is_the_batch() {
        let batch = extract_batch(json!([{"id": 1}, {"id": 2}]), &keys());
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_keys_probed_in_order() {
        let payload = json!({
            "data": [{"id": "d"}],
            "products": [{"id": "p"}],
            "meta": {"count": 1}
        });
        assert_eq!(extract_batch(payload, &keys()), vec![json!({"id": "p"})]);
    }

    #[test]
    fn test_non_list_key_is_skipped() {
        let payload = json!({"product": {"id": 1}, "items": [{"id": 2}]});
        assert_eq!(extract_batch(payload, &keys()), vec![json!({"id": 2})]);
    }

    #[test]
    fn test_unkeyed_mapping_is_single_record() {
        let payload = json!({"id": 9, "sku": "x"});
        assert_eq!(extract_batch(payload.clone(), &keys()), vec![payload]);
    }

    #[test]
    fn test_empty_shapes_are_empty_batches() {
        assert!(extract_batch(json!({}), &keys()).is_empty());
        assert!(extract_batch(json!([]), &keys()).is_empty());
        assert!(extract_batch(json!({"product": []}), &keys()).is_empty());
        assert!(extract_batch(json!(null), &keys()).is_empty());
        assert!(extract_batch(json!("text"), &keys()).is_empty());
    }

    #[test]
    fn test_first_id() {
        assert_eq!(first_id(&[json!({"id": 3}), json!({"id": 4})]), Some(&json!(3)));
        assert_eq!(first_id(&[json!({"id": null})]), None);
        assert_eq!(first_id(&[json!("not a record")]), None);
        assert_eq!(first_id(&[]), None);
    }
}
