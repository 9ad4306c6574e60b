//! JSON source reader.

use std::fs;
use std::path::Path;

use log::warn;
use serde_json::Value;

use super::ReadOptions;
use crate::error::{ReadError, ReadResult};
use crate::record::Record;

/// Read a JSON file into records.
///
/// A top-level array is the item collection. A single object is wrapped as
/// a one-element sequence unless one of its keys holds an array; then that
/// array is the collection (the hint key when given, otherwise the first
/// array-valued key in document order).
pub fn read(path: &Path, options: &ReadOptions) -> ReadResult<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    let value: Value =
        serde_json::from_str(&content).map_err(|e| ReadError::malformed("json", e))?;

    let items: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let collection = match &options.collection_key {
                Some(key) => map.get(key).and_then(Value::as_array).cloned(),
                None => map
                    .values()
                    .find(|v| v.is_array())
                    .and_then(Value::as_array)
                    .cloned(),
            };
            match collection {
                Some(items) => items,
                None => vec![Value::Object(map)],
            }
        }
        other => {
            return Err(ReadError::malformed(
                "json",
                format!("expected an object or array at the top level, got {}", other),
            ))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map),
            other => {
                warn!("json item {} is not an object, skipping: {}", index, other);
            }
        }
    }

    Ok(records)
}
