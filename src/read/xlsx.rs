//! XLSX source reader.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::{Number, Value};

use crate::error::{ReadError, ReadResult};
use crate::record::Record;

/// Read the first sheet of a workbook into records.
///
/// The first row is the header row; remaining rows become records keyed by
/// header text. Date cells surface as serial numbers, so date_transform
/// rules can take their numeric path.
pub fn read(path: &Path) -> ReadResult<Vec<Record>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReadError::malformed("xlsx", e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReadError::malformed("xlsx", "workbook has no sheets"))?
        .map_err(|e| ReadError::malformed("xlsx", e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_to_text).collect(),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row.get(i).map(cell_to_value).unwrap_or_else(empty_cell);
            record.insert(header.clone(), value);
        }
        records.push(record);
    }

    Ok(records)
}

fn empty_cell() -> Value {
    Value::String(String::new())
}

fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => empty_cell(),
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::Number(Number::from(*i)),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => float_value(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(format!("{:?}", e)),
    }
}

fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::Number(Number::from(f as i64))
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}
