//! CSV writer.

use crate::error::WriteResult;
use crate::eval::evaluate;
use crate::record::{value_to_string, Record};
use crate::rules::RuleSet;
use crate::templates::CsvTemplate;

/// Serialize records as delimited text.
///
/// The template's headers drive both the literal header row and the field
/// order; every header name is resolved as a destination field through the
/// rule evaluator.
pub fn write_csv(
    template: &CsvTemplate,
    records: &[Record],
    rules: &RuleSet,
) -> WriteResult<Vec<u8>> {
    let mut buffer = Vec::new();

    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(template.delimiter as u8)
            .quote(template.quote as u8)
            .escape(template.escape as u8)
            .from_writer(&mut buffer);

        if template.has_header_row {
            writer.write_record(&template.headers)?;
        }

        for record in records {
            let row: Vec<String> = template
                .headers
                .iter()
                .map(|header| value_to_string(&evaluate(rules, header, record)))
                .collect();
            writer.write_record(&row)?;
        }

        writer.flush()?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn rules() -> RuleSet {
        RuleSet::new()
            .with_mapping(Rule::field_mapping("id", "id"))
            .with_mapping(Rule::field_mapping("nome", "name"))
            .with_mapping(Rule::field_mapping("preco", "value"))
    }

    #[test]
    fn test_headers_and_rows() {
        let template = CsvTemplate::default();
        let records = vec![
            record(json!({"id": "1", "nome": "Produto 1", "preco": "10.5"})),
            record(json!({"id": "2", "nome": "Produto 2", "preco": "20"})),
        ];

        let bytes = write_csv(&template, &records, &rules()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,name,value"));
        assert_eq!(lines.next(), Some("1,Produto 1,10.5"));
        assert_eq!(lines.next(), Some("2,Produto 2,20"));
    }

    #[test]
    fn test_template_delimiter() {
        let template = CsvTemplate {
            delimiter: ';',
            ..CsvTemplate::default()
        };
        let records = vec![record(json!({"id": "1", "nome": "a", "preco": "2"}))];

        let text = String::from_utf8(write_csv(&template, &records, &rules()).unwrap()).unwrap();
        assert!(text.starts_with("id;name;value"));
    }

    #[test]
    fn test_missing_field_is_empty_cell() {
        let template = CsvTemplate::default();
        let records = vec![record(json!({"id": "1"}))];

        let text = String::from_utf8(write_csv(&template, &records, &rules()).unwrap()).unwrap();
        assert_eq!(text.lines().nth(1), Some("1,,"));
    }

    #[test]
    fn test_empty_input_yields_headers_only() {
        let template = CsvTemplate::default();
        let text = String::from_utf8(write_csv(&template, &[], &rules()).unwrap()).unwrap();
        assert_eq!(text.trim_end(), "id,name,value");
    }

    #[test]
    fn test_delimiter_inside_value_is_quoted() {
        let template = CsvTemplate::default();
        let records = vec![record(json!({"id": "1", "nome": "a,b", "preco": ""}))];

        let text = String::from_utf8(write_csv(&template, &records, &rules()).unwrap()).unwrap();
        assert!(text.contains("\"a,b\""));
    }
}
