//! Error types for the datashift transformation pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`RuleError`] - rule-set construction errors
//! - [`ReadError`] - source reading/parsing errors
//! - [`EvalError`] - restricted-expression evaluation errors
//! - [`WriteError`] - output serialization errors
//! - [`TransformError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Rule Construction Errors
// =============================================================================

/// Errors raised while building a rule set from configuration.
///
/// All structural validation happens here, at construction time; the
/// evaluator itself never rejects a rule.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule is missing its destination field.
    #[error("Rule is missing destination_field")]
    MissingDestination,

    /// A field_mapping/date_transform rule has neither source_field nor source_path.
    #[error("Rule '{0}' requires source_field or source_path")]
    MissingSource(String),

    /// A fixed_value rule has no fixed_value.
    #[error("Rule '{0}' requires fixed_value")]
    MissingFixedValue(String),

    /// A rule is missing a required entry in its options map.
    #[error("Rule '{field}' requires options.{option}")]
    MissingOption { field: String, option: String },

    /// The rule configuration is not valid JSON or has the wrong shape.
    #[error("Invalid rule configuration: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Source Reading Errors
// =============================================================================

/// Errors while reading a source file into canonical records.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The source file does not exist.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source exists but could not be parsed.
    #[error("Malformed {format} input: {message}")]
    MalformedInput { format: &'static str, message: String },

    /// Failed to read the file contents.
    #[error("Failed to read source: {0}")]
    IoError(#[from] std::io::Error),
}

impl ReadError {
    /// Build a `MalformedInput` from any parser diagnostic.
    pub fn malformed(format: &'static str, err: impl std::fmt::Display) -> Self {
        ReadError::MalformedInput {
            format,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Expression Evaluation Errors
// =============================================================================

/// Errors from the restricted formula/condition evaluator.
///
/// These never abort a transform: the rule evaluator degrades the
/// affected field to an empty value and logs a warning.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// The expression could not be tokenized or parsed.
    #[error("Invalid expression '{expr}' at offset {position}: {message}")]
    ParseError {
        expr: String,
        position: usize,
        message: String,
    },

    /// The expression parsed but evaluated to a type error.
    #[error("Cannot evaluate '{expr}': {message}")]
    TypeError { expr: String, message: String },

    /// Division or modulo by zero.
    #[error("Division by zero in '{0}'")]
    DivisionByZero(String),
}

// =============================================================================
// Output Writing Errors
// =============================================================================

/// Errors while serializing the transformed output.
#[derive(Debug, Error)]
pub enum WriteError {
    /// CSV serialization error.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON write error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// XML serialization error.
    #[error("XML write error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Workbook serialization error.
    #[error("XLSX write error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    /// IO error while flushing the in-memory buffer.
    #[error("Write IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Transform Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::transformer::Transformer::transform`].
///
/// Wraps all lower-level errors and adds the unsupported-pairing variant.
/// I/O and parse errors abort the whole transform with no partial output;
/// per-rule evaluation failures never surface here (they degrade to empty
/// field values instead).
#[derive(Debug, Error)]
pub enum TransformError {
    /// Source reading error.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Rule configuration error.
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Output serialization error.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// The source/target format pairing is not implemented.
    #[error("Unsupported conversion from '{from}' to '{to}'")]
    UnsupportedConversion { from: String, to: String },

    /// IO error while persisting the output.
    #[error("Output IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for rule construction.
pub type RuleResult<T> = Result<T, RuleError>;

/// Result type for source reading.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Result type for output writing.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for whole transforms.
pub type TransformResult<T> = Result<T, TransformError>;
