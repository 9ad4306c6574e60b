//! XLSX writer.

use rust_xlsxwriter::{Color, DocProperties, Format, Workbook};
use serde_json::Value;

use crate::error::WriteResult;
use crate::eval::evaluate;
use crate::record::{value_to_string, Record};
use crate::rules::RuleSet;
use crate::templates::{HeaderStyle, XlsxTemplate};

/// Serialize records as a workbook.
///
/// One sheet per template-declared sheet: a styled header row, one data row
/// per record with every header resolved through the rule evaluator, and
/// auto-fitted columns. The workbook is returned as an in-memory buffer.
pub fn write_xlsx(
    template: &XlsxTemplate,
    records: &[Record],
    rules: &RuleSet,
) -> WriteResult<Vec<u8>> {
    let mut workbook = Workbook::new();

    let properties = DocProperties::new()
        .set_author(&template.properties.creator)
        .set_title(&template.properties.title)
        .set_comment(&template.properties.description);
    workbook.set_properties(&properties);

    for sheet_template in &template.sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&sheet_template.name)?;

        let header_format = header_format(&sheet_template.header_style);
        for (col, header) in sheet_template.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }

        for (row, record) in records.iter().enumerate() {
            let row = (row + 1) as u32;
            for (col, header) in sheet_template.headers.iter().enumerate() {
                let col = col as u16;
                match evaluate(rules, header, record) {
                    Value::Number(n) => {
                        sheet.write_number(row, col, n.as_f64().unwrap_or_default())?;
                    }
                    Value::Bool(b) => {
                        sheet.write_boolean(row, col, b)?;
                    }
                    value => {
                        sheet.write_string(row, col, value_to_string(&value))?;
                    }
                }
            }
        }

        sheet.autofit();
    }

    Ok(workbook.save_to_buffer()?)
}

fn header_format(style: &HeaderStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(size) = style.size {
        format = format.set_font_size(size);
    }
    if let Some(color) = style.fill_color.as_deref().and_then(parse_color) {
        format = format.set_background_color(color);
    }
    if let Some(color) = style.font_color.as_deref().and_then(parse_color) {
        format = format.set_font_color(color);
    }
    format
}

/// Parse a `#RRGGBB` color.
fn parse_color(text: &str) -> Option<Color> {
    let hex = text.trim_start_matches('#');
    u32::from_str_radix(hex, 16).ok().map(Color::RGB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read;
    use crate::rules::Rule;
    use crate::templates::SheetTemplate;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn rules() -> RuleSet {
        RuleSet::new()
            .with_mapping(Rule::field_mapping("id", "id"))
            .with_mapping(Rule::field_mapping("nome", "name"))
            .with_mapping(Rule::field_mapping("preco", "value"))
    }

    /// Write a workbook, persist it, and read it back through the reader.
    fn round_trip(template: &XlsxTemplate, records: &[Record], rules: &RuleSet) -> Vec<Record> {
        let bytes = write_xlsx(template, records, rules).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        std::fs::write(&path, bytes).unwrap();
        read::read_records(
            read::SourceFormat::Xlsx,
            &path,
            &read::ReadOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_header_and_data_rows() {
        let records = vec![
            record(json!({"id": "1", "nome": "Produto 1", "preco": "10.5"})),
            record(json!({"id": "2", "nome": "Produto 2", "preco": "20"})),
        ];

        let rows = round_trip(&XlsxTemplate::default(), &records, &rules());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "1");
        assert_eq!(rows[0]["name"], "Produto 1");
        assert_eq!(rows[1]["name"], "Produto 2");
    }

    #[test]
    fn test_numeric_values_stay_numeric() {
        let records = vec![record(json!({"id": "1", "nome": "a", "preco": 10.5}))];
        let rows = round_trip(&XlsxTemplate::default(), &records, &rules());
        assert_eq!(rows[0]["value"], 10.5);
    }

    #[test]
    fn test_empty_input_headers_only() {
        let rows = round_trip(&XlsxTemplate::default(), &[], &rules());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_multiple_sheets() {
        let template = XlsxTemplate {
            sheets: vec![
                SheetTemplate {
                    name: "Revenue".into(),
                    headers: vec!["id".into()],
                    header_style: HeaderStyle::default(),
                },
                SheetTemplate {
                    name: "Expenses".into(),
                    headers: vec!["id".into()],
                    header_style: HeaderStyle::default(),
                },
            ],
            ..XlsxTemplate::default()
        };

        // Serialization succeeds with both sheets; the reader sees the first.
        let bytes = write_xlsx(&template, &[], &rules()).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_parse_color() {
        assert!(parse_color("#DDDDDD").is_some());
        assert!(parse_color("006100").is_some());
        assert!(parse_color("not a color").is_none());
    }
}
