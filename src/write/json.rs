//! JSON writer.

use chrono::Local;
use serde_json::{Map, Number, Value};

use crate::error::WriteResult;
use crate::eval::evaluate;
use crate::record::Record;
use crate::rules::RuleSet;
use crate::templates::{JsonTemplate, NestedObject};

/// Serialize records as a JSON document.
///
/// Items follow the template's `item` structure; the document optionally
/// nests them under a root property and carries a metadata block. The
/// metadata block requires the root wrapper; a bare top-level array has
/// nowhere to put it.
pub fn write_json(
    template: &JsonTemplate,
    records: &[Record],
    rules: &RuleSet,
) -> WriteResult<Vec<u8>> {
    let items: Vec<Value> = records
        .iter()
        .map(|record| build_item(template, record, rules))
        .collect();

    let document = match &template.root_property {
        Some(root) => {
            let mut doc = Map::new();
            doc.insert(root.clone(), Value::Array(items));

            if let Some(metadata) = &template.metadata {
                let mut block = Map::new();
                if metadata.generated_at {
                    block.insert(
                        "generated_at".to_string(),
                        Value::String(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                    );
                }
                if metadata.total_records {
                    block.insert(
                        "total_records".to_string(),
                        Value::Number(Number::from(records.len())),
                    );
                }
                if let Some(status) = &metadata.status {
                    block.insert("status".to_string(), Value::String(status.clone()));
                }
                doc.insert("metadata".to_string(), Value::Object(block));
            }

            Value::Object(doc)
        }
        None => Value::Array(items),
    };

    let bytes = if template.pretty_print {
        serde_json::to_vec_pretty(&document)?
    } else {
        serde_json::to_vec(&document)?
    };

    Ok(bytes)
}

fn build_item(template: &JsonTemplate, record: &Record, rules: &RuleSet) -> Value {
    let mut item = Map::new();

    for field in &template.item.fields {
        item.insert(field.clone(), evaluate(rules, field, record));
    }

    for nested in &template.item.nested_objects {
        let value = if nested.is_array {
            build_nested_array(nested, record)
        } else {
            build_nested_object(nested, record, rules)
        };
        item.insert(nested.name.clone(), value);
    }

    Value::Object(item)
}

/// A nested object's fields resolve through the evaluator like any other
/// destination field; deeper nesting recurses.
fn build_nested_object(nested: &NestedObject, record: &Record, rules: &RuleSet) -> Value {
    let mut obj = Map::new();
    for field in &nested.fields {
        obj.insert(field.clone(), evaluate(rules, field, record));
    }
    for deeper in &nested.nested_objects {
        let value = if deeper.is_array {
            build_nested_array(deeper, record)
        } else {
            build_nested_object(deeper, record, rules)
        };
        obj.insert(deeper.name.clone(), value);
    }
    Value::Object(obj)
}

/// An array variant copies sub-record fields directly, bypassing rule
/// resolution: the source value under the nested object's name must be a
/// list of records.
fn build_nested_array(nested: &NestedObject, record: &Record) -> Value {
    let sub_records = match record.get(&nested.name).and_then(Value::as_array) {
        Some(list) => list,
        None => return Value::Array(Vec::new()),
    };

    let items: Vec<Value> = sub_records
        .iter()
        .filter_map(Value::as_object)
        .map(|sub| {
            let mut obj = Map::new();
            for field in &nested.fields {
                obj.insert(
                    field.clone(),
                    sub.get(field).cloned().unwrap_or_else(|| Value::String(String::new())),
                );
            }
            Value::Object(obj)
        })
        .collect();

    Value::Array(items)
}
