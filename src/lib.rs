//! # Datashift - rule-driven structured data transformation
//!
//! Datashift converts structured data files between JSON, XML, CSV and
//! XLSX using a per-field rule set and a named output template.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Source file │────▶│   Reader    │────▶│  Evaluator  │────▶│   Writer    │
//! │ (4 formats) │     │  (records)  │     │   (rules)   │     │ (template)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datashift::{OutputFormat, Rule, RuleSet, Source, TemplateRegistry, Transformer};
//!
//! fn main() -> Result<(), datashift::TransformError> {
//!     let rules = RuleSet::new()
//!         .with_mapping(Rule::field_mapping("id", "id"))
//!         .with_mapping(Rule::field_mapping("nome", "name"))
//!         .with_mapping(Rule::field_mapping("preco", "value"));
//!
//!     let transformer = Transformer::new(OutputFormat::Json, TemplateRegistry::with_defaults());
//!     let bytes = transformer.transform(&Source::new("products.csv"), &rules, "default")?;
//!     println!("{}", String::from_utf8_lossy(&bytes));
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`record`] - Canonical record representation
//! - [`rules`] - Rule model and rule sets
//! - [`eval`] - Rule evaluator and restricted expression grammar
//! - [`read`] - Format readers
//! - [`analyze`] - Source structure profiling
//! - [`templates`] - Output templates and registry
//! - [`write`] - Format writers
//! - [`transformer`] - Per-output-format facade

// Core modules
pub mod error;
pub mod record;

// Rules & evaluation
pub mod eval;
pub mod rules;

// Reading
pub mod analyze;
pub mod read;

// Templates & writing
pub mod templates;
pub mod write;

// Facade
pub mod transformer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    EvalError, EvalResult, ReadError, ReadResult, RuleError, RuleResult, TransformError,
    TransformResult, WriteError, WriteResult,
};

// =============================================================================
// Re-exports - Records & Rules
// =============================================================================

pub use record::{get_index, get_nested, is_empty_value, value_to_string, Record};

pub use rules::{example_rules, Rule, RuleKind, RuleSection, RuleSet, Sections};

// =============================================================================
// Re-exports - Evaluation
// =============================================================================

pub use eval::{evaluate, evaluate_rule, evaluate_section, resolve_placeholders};

// =============================================================================
// Re-exports - Reading & Analysis
// =============================================================================

pub use read::{read_records, ReadOptions, SourceFormat};

pub use analyze::{analyze, detect_delimiter, detect_encoding, SourceProfile};

// =============================================================================
// Re-exports - Templates
// =============================================================================

pub use templates::{
    CsvTemplate, DocProperties, HeaderStyle, ItemStructure, JsonMetadata, JsonTemplate,
    NestedObject, SheetTemplate, TemplateRegistry, XlsxTemplate, XmlAttribute, XmlNamespace,
    XmlNode, XmlRoot, XmlTemplate, XmlValue, DEFAULT_TEMPLATE,
};

// =============================================================================
// Re-exports - Writers
// =============================================================================

pub use write::{write_csv, write_json, write_xlsx, write_xml};

// =============================================================================
// Re-exports - Transformer
// =============================================================================

pub use transformer::{OutputFormat, Source, Transformer};
