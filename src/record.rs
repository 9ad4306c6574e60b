//! Canonical record representation and lookup helpers.
//!
//! A record is the format-neutral form of one source row/item: an ordered
//! mapping of field name to scalar, nested record or list. Readers produce
//! records, the evaluator consumes them read-only, writers never see the
//! source again.

use serde_json::{Map, Value};

/// One canonical record. Field order follows the source.
pub type Record = Map<String, Value>;

/// Look up a value by dot-notation path, e.g. `"user.address.street"`.
///
/// Traverses nested objects only; any missing segment yields `None`.
pub fn get_nested<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut keys = path.split('.');
    let first = keys.next()?;
    let mut current = record.get(first)?;

    for key in keys {
        current = current.as_object()?.get(key)?;
    }

    Some(current)
}

/// Look up a value by position in the record's field order.
pub fn get_index(record: &Record, index: usize) -> Option<&Value> {
    record.values().nth(index)
}

/// Check if a value is "empty" (null, blank string, empty list/map).
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Render a value as plain text for cells, element content and placeholders.
///
/// Strings pass through unquoted; everything else uses its JSON rendering.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        let value = json!({
            "id": "42",
            "user": {
                "name": "Ana",
                "address": { "city": "Lisboa" }
            },
            "tags": ["a", "b"]
        });
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_get_nested() {
        let record = sample();
        assert_eq!(get_nested(&record, "id"), Some(&json!("42")));
        assert_eq!(get_nested(&record, "user.name"), Some(&json!("Ana")));
        assert_eq!(
            get_nested(&record, "user.address.city"),
            Some(&json!("Lisboa"))
        );
        assert_eq!(get_nested(&record, "user.missing"), None);
        assert_eq!(get_nested(&record, "id.deeper"), None);
    }

    #[test]
    fn test_get_index_follows_field_order() {
        let record = sample();
        assert_eq!(get_index(&record, 0), Some(&json!("42")));
        assert_eq!(get_index(&record, 2), Some(&json!(["a", "b"])));
        assert_eq!(get_index(&record, 9), None);
    }

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("  ")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!("x")));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("abc")), "abc");
        assert_eq!(value_to_string(&json!(10.5)), "10.5");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
    }
}
