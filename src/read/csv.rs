//! CSV source reader.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::ReadOptions;
use crate::analyze::{decode_content, detect_encoding};
use crate::error::{ReadError, ReadResult};
use crate::record::Record;

/// Read a CSV file into records.
///
/// The first physical line is the header row and defines field names by
/// position. Delimiter and enclosure come from the options (the facade
/// fills them from the output template); the encoding is detected so
/// legacy Latin-1/Windows-1252 exports decode cleanly.
pub fn read(path: &Path, options: &ReadOptions) -> ReadResult<Vec<Record>> {
    let bytes = fs::read(path)?;
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReadError::malformed("csv", e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() {
        return Err(ReadError::malformed("csv", "no header row found"));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReadError::malformed("csv", e))?;

        // Blank separator lines are not records.
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).unwrap_or("").trim();
            record.insert(header.clone(), Value::String(value.to_string()));
        }
        records.push(record);
    }

    Ok(records)
}
