//! Transformer facade: one entry point per output format.
//!
//! A [`Transformer`] binds an output format and a template registry. Each
//! `transform` call selects its pipeline once, by comparing the detected
//! source extension against the fixed output format, then runs straight
//! through read → evaluate → write with no further branching. The terminal
//! outcome is serialized bytes or one structured error.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{TransformError, TransformResult};
use crate::read::{read_records, ReadOptions, SourceFormat};
use crate::rules::RuleSet;
use crate::templates::TemplateRegistry;
use crate::write::{write_csv, write_json, write_xlsx, write_xml};

/// The fixed output format of one transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Xml,
    Csv,
    Xlsx,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" | "xls" => Ok(OutputFormat::Xlsx),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file handle: path, optionally a declared extension overriding
/// the path's, and optionally a hint naming the item collection for
/// JSON/XML sources.
#[derive(Debug, Clone)]
pub struct Source {
    pub path: PathBuf,
    pub declared_extension: Option<String>,
    pub collection_hint: Option<String>,
}

impl Source {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            declared_extension: None,
            collection_hint: None,
        }
    }

    /// Override the extension used for format detection.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.declared_extension = Some(extension.to_string());
        self
    }

    /// Name the key/element holding the item collection.
    pub fn with_collection_hint(mut self, hint: &str) -> Self {
        self.collection_hint = Some(hint.to_string());
        self
    }

    /// The extension used for format detection: declared wins over path.
    fn extension(&self) -> String {
        self.declared_extension.clone().unwrap_or_else(|| {
            self.path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_lowercase()
        })
    }
}

/// Per-output-format transformation facade.
pub struct Transformer {
    format: OutputFormat,
    registry: TemplateRegistry,
}

impl Transformer {
    /// Bind an output format to a template registry.
    pub fn new(format: OutputFormat, registry: TemplateRegistry) -> Self {
        Self { format, registry }
    }

    /// The fixed output format of this transformer.
    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    /// The template registry used for lookups.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Transform a source file: read, evaluate every destination field per
    /// record, serialize through the named template.
    ///
    /// Returns the complete output bytes or one structured error, never
    /// partial output.
    pub fn transform(
        &self,
        source: &Source,
        rules: &RuleSet,
        template_name: &str,
    ) -> TransformResult<Vec<u8>> {
        let extension = source.extension();
        let source_format = SourceFormat::from_extension(&extension).ok_or_else(|| {
            TransformError::UnsupportedConversion {
                from: extension.clone(),
                to: self.format.as_str().to_string(),
            }
        })?;

        debug!(
            "transforming {} ({}) to {} with template '{}'",
            source.path.display(),
            source_format,
            self.format,
            template_name
        );

        let mut options = ReadOptions {
            collection_key: source.collection_hint.clone(),
            ..ReadOptions::default()
        };

        // CSV sources take delimiter/enclosure from the template, never
        // from auto-detection.
        if source_format == SourceFormat::Csv {
            let csv_template = self.registry.csv(template_name);
            options.delimiter = csv_template.delimiter as u8;
            options.quote = csv_template.quote as u8;
        }

        let records = read_records(source_format, &source.path, &options)?;
        info!(
            "read {} records from {}",
            records.len(),
            source.path.display()
        );

        let bytes = match self.format {
            OutputFormat::Csv => {
                write_csv(&self.registry.csv(template_name), &records, rules)?
            }
            OutputFormat::Json => {
                write_json(&self.registry.json(template_name), &records, rules)?
            }
            OutputFormat::Xml => {
                write_xml(&self.registry.xml(template_name), &records, rules)?
            }
            OutputFormat::Xlsx => {
                write_xlsx(&self.registry.xlsx(template_name), &records, rules)?
            }
        };

        info!("wrote {} bytes of {}", bytes.len(), self.format);
        Ok(bytes)
    }

    /// Transform and persist the output, returning the byte count.
    pub fn transform_to_file(
        &self,
        source: &Source,
        rules: &RuleSet,
        template_name: &str,
        output: &Path,
    ) -> TransformResult<usize> {
        let bytes = self.transform(source, rules, template_name)?;
        fs::write(output, &bytes)?;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use crate::rules::Rule;
    use crate::templates::CsvTemplate;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    const CSV_SOURCE: &str = "id,nome,preco\n1,Produto 1,10.5\n2,Produto 2,20\n";
    const JSON_SOURCE: &str = r#"[
        {"id": "1", "nome": "Produto 1", "preco": "10.5"},
        {"id": "2", "nome": "Produto 2", "preco": "20"}
    ]"#;
    const XML_SOURCE: &str = "<produtos>\
        <produto><id>1</id><nome>Produto 1</nome><preco>10.5</preco></produto>\
        <produto><id>2</id><nome>Produto 2</nome><preco>20</preco></produto>\
        </produtos>";

    fn product_rules() -> RuleSet {
        RuleSet::new()
            .with_mapping(Rule::field_mapping("id", "id"))
            .with_mapping(Rule::field_mapping("nome", "name"))
            .with_mapping(Rule::field_mapping("preco", "value"))
    }

    fn write_source(dir: &TempDir, name: &str, content: &str) -> Source {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        Source::new(path)
    }

    fn transformer(format: OutputFormat) -> Transformer {
        Transformer::new(format, TemplateRegistry::with_defaults())
    }

    #[test]
    fn test_csv_to_json_worked_example() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "input.csv", "id,nome,preco\n1,Produto 1,10.5\n");

        let bytes = transformer(OutputFormat::Json)
            .transform(&source, &product_rules(), "default")
            .unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            doc["data"],
            serde_json::json!([{"id": "1", "name": "Produto 1", "value": "10.5"}])
        );
        assert_eq!(doc["metadata"]["total_records"], 1);
    }

    #[test]
    fn test_all_source_formats_agree() {
        let dir = TempDir::new().unwrap();
        let sources = vec![
            write_source(&dir, "input.csv", CSV_SOURCE),
            write_source(&dir, "input.json", JSON_SOURCE),
            write_source(&dir, "input.xml", XML_SOURCE),
        ];

        let rules = product_rules();
        let json = transformer(OutputFormat::Json);

        let outputs: Vec<Value> = sources
            .iter()
            .map(|source| {
                let bytes = json.transform(source, &rules, "default").unwrap();
                let doc: Value = serde_json::from_slice(&bytes).unwrap();
                doc["data"].clone()
            })
            .collect();

        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);
    }

    #[test]
    fn test_xlsx_source_agrees_on_string_cells() {
        use rust_xlsxwriter::Workbook;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["id", "nome", "preco"].iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (row, values) in [["1", "Produto 1", "10.5"], ["2", "Produto 2", "20"]]
            .iter()
            .enumerate()
        {
            for (col, value) in values.iter().enumerate() {
                sheet
                    .write_string((row + 1) as u32, col as u16, *value)
                    .unwrap();
            }
        }
        workbook.save(&path).unwrap();

        let bytes = transformer(OutputFormat::Json)
            .transform(&Source::new(path), &product_rules(), "default")
            .unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            doc["data"][0],
            serde_json::json!({"id": "1", "name": "Produto 1", "value": "10.5"})
        );
    }

    #[test]
    fn test_round_trip_recovers_scalars() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "input.csv", CSV_SOURCE);

        // Forward: CSV -> JSON under the default template.
        let json_bytes = transformer(OutputFormat::Json)
            .transform(&source, &product_rules(), "default")
            .unwrap();
        let json_path = dir.path().join("intermediate.json");
        fs::write(&json_path, &json_bytes).unwrap();

        // Backward: JSON -> CSV with the inverse rule set and a template
        // matching the original header row.
        let mut registry = TemplateRegistry::with_defaults();
        registry.register_csv(
            "inverse",
            CsvTemplate {
                headers: vec!["id".into(), "nome".into(), "preco".into()],
                ..CsvTemplate::default()
            },
        );
        let inverse_rules = RuleSet::new()
            .with_mapping(Rule::field_mapping("id", "id"))
            .with_mapping(Rule::field_mapping("name", "nome"))
            .with_mapping(Rule::field_mapping("value", "preco"));

        let csv_bytes = Transformer::new(OutputFormat::Csv, registry)
            .transform(
                &Source::new(json_path).with_collection_hint("data"),
                &inverse_rules,
                "inverse",
            )
            .unwrap();

        assert_eq!(String::from_utf8(csv_bytes).unwrap(), CSV_SOURCE);
    }

    #[test]
    fn test_same_format_path() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "input.csv", CSV_SOURCE);

        let bytes = transformer(OutputFormat::Csv)
            .transform(&source, &product_rules(), "default")
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(text.lines().next(), Some("id,name,value"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_idempotent_output() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "input.csv", CSV_SOURCE);

        let xml = transformer(OutputFormat::Xml);
        let rules = product_rules();
        let first = xml.transform(&source, &rules, "default").unwrap();
        let second = xml.transform(&source, &rules, "default").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_source_yields_valid_documents() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "empty.csv", "id,nome,preco\n");
        let rules = product_rules();

        let csv = transformer(OutputFormat::Csv)
            .transform(&source, &rules, "default")
            .unwrap();
        assert_eq!(String::from_utf8(csv).unwrap().trim_end(), "id,name,value");

        let json_bytes = transformer(OutputFormat::Json)
            .transform(&source, &rules, "default")
            .unwrap();
        let doc: Value = serde_json::from_slice(&json_bytes).unwrap();
        assert_eq!(doc["data"], serde_json::json!([]));

        let xml_bytes = transformer(OutputFormat::Xml)
            .transform(&source, &rules, "default")
            .unwrap();
        let xml_text = String::from_utf8(xml_bytes).unwrap();
        assert!(!xml_text.contains("<item"));

        let xlsx_bytes = transformer(OutputFormat::Xlsx)
            .transform(&source, &rules, "default")
            .unwrap();
        assert!(!xlsx_bytes.is_empty());
    }

    #[test]
    fn test_unknown_template_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "input.csv", CSV_SOURCE);

        let named = transformer(OutputFormat::Json)
            .transform(&source, &product_rules(), "no_such_template")
            .unwrap();
        let doc: Value = serde_json::from_slice(&named).unwrap();
        assert!(doc["data"].is_array());
    }

    #[test]
    fn test_unsupported_source_extension() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "input.yaml", "a: 1\n");

        let err = transformer(OutputFormat::Json)
            .transform(&source, &product_rules(), "default")
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnsupportedConversion { from, to }
                if from == "yaml" && to == "json"
        ));
    }

    #[test]
    fn test_missing_source_aborts() {
        let source = Source::new("/definitely/missing.csv");
        let err = transformer(OutputFormat::Json)
            .transform(&source, &product_rules(), "default")
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::Read(ReadError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_declared_extension_wins() {
        let dir = TempDir::new().unwrap();
        // JSON content stored under a .tmp name, declared as json.
        let path = dir.path().join("upload.tmp");
        fs::write(&path, JSON_SOURCE).unwrap();
        let source = Source::new(path).with_extension("json");

        let bytes = transformer(OutputFormat::Json)
            .transform(&source, &product_rules(), "default")
            .unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["metadata"]["total_records"], 2);
    }

    #[test]
    fn test_transform_to_file_writes_output() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "input.csv", CSV_SOURCE);
        let output = dir.path().join("out.json");

        let written = transformer(OutputFormat::Json)
            .transform_to_file(&source, &product_rules(), "default", &output)
            .unwrap();

        assert_eq!(fs::metadata(&output).unwrap().len() as usize, written);
    }
}
