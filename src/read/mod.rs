//! Format readers: decode source bytes into canonical records.
//!
//! Every reader checks that the file exists before touching it, parses the
//! whole source into memory, and maps parser diagnostics into
//! [`ReadError::MalformedInput`]. A missing or broken source aborts the
//! transform, it is never silently replaced with empty data.

mod csv;
mod json;
mod xlsx;
mod xml;

use std::path::Path;

use crate::error::{ReadError, ReadResult};
use crate::record::Record;

/// Recognized source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Xml,
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Map a file extension to a format. `xls` is read as a workbook.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(SourceFormat::Json),
            "xml" => Some(SourceFormat::Xml),
            "csv" => Some(SourceFormat::Csv),
            "xlsx" | "xls" => Some(SourceFormat::Xlsx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Xml => "xml",
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Key/element naming the item collection in JSON/XML sources. Without
    /// a hint the reader takes the first plausible collection it finds.
    pub collection_key: Option<String>,
    /// CSV field delimiter. Comes from the output template, not detection.
    pub delimiter: u8,
    /// CSV field enclosure.
    pub quote: u8,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            collection_key: None,
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// Read a source file into a sequence of canonical records.
pub fn read_records(
    format: SourceFormat,
    path: &Path,
    options: &ReadOptions,
) -> ReadResult<Vec<Record>> {
    if !path.exists() {
        return Err(ReadError::SourceNotFound(path.to_path_buf()));
    }

    match format {
        SourceFormat::Json => json::read(path, options),
        SourceFormat::Xml => xml::read(path, options),
        SourceFormat::Csv => csv::read(path, options),
        SourceFormat::Xlsx => xlsx::read(path),
    }
}
