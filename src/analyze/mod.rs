//! Source analysis: extract structure from a file before writing rules.
//!
//! Produces a [`SourceProfile`] with the detected encoding and delimiter
//! (CSV), the field names, the record count, and a bounded record sample.
//! Purely informational; the transform path never depends on it except
//! for CSV encoding decode.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{ReadError, ReadResult};
use crate::read::{read_records, ReadOptions, SourceFormat};
use crate::record::Record;

/// Number of sample records kept in a profile.
const SAMPLE_ROWS: usize = 5;

/// Structural summary of one source file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceProfile {
    /// Detected source format.
    pub format: String,
    /// Detected text encoding (CSV only).
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only).
    pub delimiter: Option<char>,
    /// Field names of the first record (or the CSV header row).
    pub headers: Vec<String>,
    /// Total records in the source.
    pub record_count: usize,
    /// Up to the first five records.
    pub sample: Vec<Record>,
}

/// Detect the text encoding of raw bytes.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the named encoding.
///
/// Unknown encodings fall back to lossy UTF-8 rather than failing the read.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting candidates in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Analyze a source file.
pub fn analyze(path: &Path, format: SourceFormat) -> ReadResult<SourceProfile> {
    if !path.exists() {
        return Err(ReadError::SourceNotFound(path.to_path_buf()));
    }

    let mut options = ReadOptions::default();
    let mut encoding = None;
    let mut delimiter = None;

    if format == SourceFormat::Csv {
        let bytes = fs::read(path)?;
        let detected_encoding = detect_encoding(&bytes);
        let content = decode_content(&bytes, &detected_encoding);
        let detected_delimiter = detect_delimiter(&content);
        options.delimiter = detected_delimiter as u8;
        encoding = Some(detected_encoding);
        delimiter = Some(detected_delimiter);
    }

    let records = read_records(format, path, &options)?;
    let headers = records
        .first()
        .map(|record| record.keys().cloned().collect())
        .unwrap_or_default();

    Ok(SourceProfile {
        format: format.as_str().to_string(),
        encoding,
        delimiter,
        headers,
        record_count: records.len(),
        sample: records.into_iter().take(SAMPLE_ROWS).collect(),
    })
}
