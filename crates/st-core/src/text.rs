//! Text sanitization and flattening of nested tag/cart collections.
//!
//! `|` separates elements and `:` separates vendor from store inside a cart
//! label, so literal occurrences in source text are replaced before joining.

use serde_json::{Map, Value};

/// Element separator for flattened collections
pub const ELEMENT_SEPARATOR: char = '|';

/// Separator between vendor and name inside a cart label
pub const CART_SEPARATOR: char = ':';

/// Stand-in for a literal `|` inside a value
const PIPE_REPLACEMENT: &str = "/";

/// Stand-in for a literal `:` inside a value (full-width colon)
const COLON_REPLACEMENT: &str = "\u{FF1A}";

/// Render a JSON value as plain text; null renders empty and strings are unquoted.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a value as text with separator characters neutralised.
pub fn safe_str(value: &Value) -> String {
    sanitize(&value_text(value))
}

/// Replace separator characters in already-rendered text.
pub fn sanitize(text: &str) -> String {
    text.replace(ELEMENT_SEPARATOR, PIPE_REPLACEMENT)
        .replace(CART_SEPARATOR, COLON_REPLACEMENT)
}

/// Loose truthiness: null, false, zero and empty string/array/object are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Return the first truthy value among `keys`, tried in order.
pub fn probe<'a>(map: &'a Map<String, Value>, keys: &[String]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(k))
        .find(|v| is_truthy(v))
}

/// Like [`probe`], but when no key holds a truthy value this yields whatever
/// the last key holds, which may be a falsy value or nothing at all.
pub fn probe_or_last<'a>(map: &'a Map<String, Value>, keys: &[String]) -> Option<&'a Value> {
    probe(map, keys).or_else(|| keys.last().and_then(|k| map.get(k)))
}

/// Shape of a nested collection field, resolved once per record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Nested<'a> {
    /// A list of entries of any shape
    List(&'a [Value]),
    /// A single mapping entry
    Single(&'a Map<String, Value>),
    /// A plain string
    Scalar(&'a str),
    /// Missing, null, or a shape that contributes nothing
    Absent,
}

impl<'a> Nested<'a> {
    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Nested::List(items),
            Some(Value::Object(map)) => Nested::Single(map),
            Some(Value::String(s)) => Nested::Scalar(s),
            _ => Nested::Absent,
        }
    }
}

/// Flatten a `tags` field into a pipe-joined label string.
///
/// List entries that are mappings contribute their probed label when it is a
/// string (empty included), otherwise their whole serialized form.
pub fn join_tags(tags: Nested<'_>, label_keys: &[String]) -> String {
    let mut out = Vec::new();
    match tags {
        Nested::List(items) => {
            for item in items {
                match item {
                    Value::Object(map) => match probe_or_last(map, label_keys) {
                        Some(Value::String(label)) => out.push(sanitize(label)),
                        _ => out.push(safe_str(item)),
                    },
                    other => out.push(safe_str(other)),
                }
            }
        }
        Nested::Single(map) => {
            if let Some(label) = probe(map, label_keys) {
                out.push(safe_str(label));
            }
        }
        Nested::Scalar(s) => out.push(sanitize(s)),
        Nested::Absent => {}
    }
    out.join("|")
}

/// Flatten a `carts` field into pipe-joined `vendor:name` labels.
pub fn join_carts(carts: Nested<'_>, vendor_keys: &[String], name_keys: &[String]) -> String {
    let mut out = Vec::new();
    match carts {
        Nested::List(items) => {
            for item in items {
                match item {
                    Value::Object(map) => out.push(cart_label(map, vendor_keys, name_keys)),
                    other => out.push(safe_str(other)),
                }
            }
        }
        Nested::Single(map) => out.push(cart_label(map, vendor_keys, name_keys)),
        Nested::Scalar(s) => out.push(sanitize(s)),
        Nested::Absent => {}
    }
    out.join("|")
}

/// `vendor:name`, with the separator trimmed when either side is empty.
fn cart_label(map: &Map<String, Value>, vendor_keys: &[String], name_keys: &[String]) -> String {
    let vendor = probe(map, vendor_keys).map(safe_str).unwrap_or_default();
    let name = probe(map, name_keys).map(safe_str).unwrap_or_default();
    format!("{}{}{}", vendor, CART_SEPARATOR, name)
        .trim_matches(CART_SEPARATOR)
        .to_string()
}

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;
