//! Rule evaluator: resolves one destination field from a rule set and a
//! canonical record.
//!
//! Lookup scans the rule set's flat mappings for the first rule whose
//! `destination_field` matches and dispatches on its kind. With no matching
//! rule the record itself is consulted under the same name, defaulting to
//! an empty value. Per-rule evaluation failures degrade to an empty value
//! for that field, a best-effort policy distinct from the all-or-nothing
//! handling of source I/O.

pub mod expr;

use chrono::{Duration, NaiveDate};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::error::EvalResult;
use crate::record::{get_index, get_nested, is_empty_value, value_to_string, Record};
use crate::rules::{Rule, RuleKind, RuleSection, RuleSet};

use expr::ExprValue;

/// Day zero of the spreadsheet serial-date scheme.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Date pattern applied when a date_transform rule declares none.
const DEFAULT_DATE_FORMAT: &str = "dd/mm/yyyy";

/// Patterns tried for textual dates with no declared source format.
const DATE_CANDIDATES: [&str; 4] = ["yyyy-mm-dd", "dd/mm/yyyy", "mm/dd/yyyy", "yyyy/mm/dd"];

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder regex"));

/// Resolve the value of `destination_field` for one record.
pub fn evaluate(rules: &RuleSet, destination_field: &str, record: &Record) -> Value {
    match rules.find(destination_field) {
        Some(rule) => evaluate_rule(rule, record),
        None => record
            .get(destination_field)
            .cloned()
            .unwrap_or_else(empty_value),
    }
}

/// Resolve `destination_field` through a named section's rules first,
/// falling back to the flat mappings and then the record itself.
pub fn evaluate_section(
    rules: &RuleSet,
    section: RuleSection,
    destination_field: &str,
    record: &Record,
) -> Value {
    match rules.find_in_section(section, destination_field) {
        Some(rule) => evaluate_rule(rule, record),
        None => record
            .get(destination_field)
            .cloned()
            .unwrap_or_else(empty_value),
    }
}

/// Apply a single rule, degrading evaluation failures to an empty value.
pub fn evaluate_rule(rule: &Rule, record: &Record) -> Value {
    match apply_rule(rule, record) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "rule for '{}' failed, emitting empty value: {}",
                rule.destination_field, err
            );
            empty_value()
        }
    }
}

/// Replace each `{{field}}` placeholder in `text` with the evaluated
/// destination field.
pub fn resolve_placeholders(rules: &RuleSet, text: &str, record: &Record) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &regex::Captures| {
            value_to_string(&evaluate(rules, caps[1].trim(), record))
        })
        .into_owned()
}

fn empty_value() -> Value {
    Value::String(String::new())
}

fn apply_rule(rule: &Rule, record: &Record) -> EvalResult<Value> {
    match rule.kind {
        RuleKind::FieldMapping => {
            let value = source_value(rule, record).unwrap_or_else(empty_value);
            Ok(format_value(value, rule.format.as_deref()))
        }
        RuleKind::FixedValue => Ok(Value::String(
            rule.fixed_value.clone().unwrap_or_default(),
        )),
        RuleKind::Concat => Ok(concat_fields(rule, record)),
        RuleKind::DateTransform => {
            let value = source_value(rule, record).unwrap_or_else(empty_value);
            Ok(transform_date(rule, &value))
        }
        RuleKind::Formula => process_formula(rule, record),
        RuleKind::Conditional => Ok(process_conditional(rule, record)),
    }
}

/// Resolve a rule's source value: index, then dot-path, then plain field.
fn source_value(rule: &Rule, record: &Record) -> Option<Value> {
    if let Some(index) = rule.source_index {
        if let Some(value) = get_index(record, index) {
            return Some(value.clone());
        }
    }

    if let Some(path) = &rule.source_path {
        return get_nested(record, path).cloned();
    }

    if let Some(field) = &rule.source_field {
        return record.get(field).cloned();
    }

    None
}

/// Apply a string formatting directive to a value.
fn format_value(value: Value, format: Option<&str>) -> Value {
    let format = match format {
        Some(f) => f,
        None => return value,
    };

    if value.is_null() {
        return empty_value();
    }

    let text = value_to_string(&value);
    match format {
        "uppercase" => Value::String(text.to_uppercase()),
        "lowercase" => Value::String(text.to_lowercase()),
        "capitalize" => Value::String(capitalize_words(&text)),
        "trim" => Value::String(text.trim().to_string()),
        _ => value,
    }
}

/// Lowercase the text, then uppercase the first letter of each word.
fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }

    out
}

/// Join the rule's `options.fields` values, skipping empty ones entirely.
fn concat_fields(rule: &Rule, record: &Record) -> Value {
    let fields = match rule.option("fields").and_then(Value::as_array) {
        Some(fields) => fields,
        None => return empty_value(),
    };

    let separator = rule
        .option("separator")
        .and_then(Value::as_str)
        .unwrap_or(" ");

    let parts: Vec<String> = fields
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|field| record.get(field))
        .filter(|value| !is_empty_value(value))
        .map(value_to_string)
        .collect();

    Value::String(parts.join(separator))
}

/// Reformat a date value.
///
/// Numeric input is a spreadsheet serial date (days since 1899-12-30);
/// textual input is parsed against the declared source format or the fixed
/// candidate list. Anything unparsable is returned untouched.
fn transform_date(rule: &Rule, value: &Value) -> Value {
    if is_empty_value(value) {
        return empty_value();
    }

    let output_format = rule.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
    let output_pattern = chrono_pattern(output_format);

    let serial = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    if let Some(serial) = serial {
        let (y, m, d) = SERIAL_EPOCH;
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|epoch| epoch.checked_add_signed(Duration::days(serial.trunc() as i64)));
        return match date {
            Some(date) => Value::String(date.format(&output_pattern).to_string()),
            None => Value::String(value_to_string(value)),
        };
    }

    let text = value_to_string(value);
    let source_format = rule.option("source_format").and_then(Value::as_str);
    let candidates: Vec<&str> = match source_format {
        Some(fmt) => vec![fmt],
        None => DATE_CANDIDATES.to_vec(),
    };

    for candidate in candidates {
        if let Ok(date) = NaiveDate::parse_from_str(text.trim(), &chrono_pattern(candidate)) {
            return Value::String(date.format(&output_pattern).to_string());
        }
    }

    Value::String(text)
}

/// Translate `dd/mm/yyyy`-style tokens into a chrono pattern.
fn chrono_pattern(format: &str) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while !rest.is_empty() {
        let (token, advance) = if rest.starts_with("yyyy") {
            ("%Y", 4)
        } else if rest.starts_with("yy") {
            ("%y", 2)
        } else if rest.starts_with("mm") {
            ("%m", 2)
        } else if rest.starts_with("dd") {
            ("%d", 2)
        } else if rest.starts_with("hh") {
            ("%H", 2)
        } else if rest.starts_with("ii") {
            ("%M", 2)
        } else if rest.starts_with("ss") {
            ("%S", 2)
        } else {
            out.push(rest.chars().next().unwrap());
            rest = &rest[rest.chars().next().unwrap().len_utf8()..];
            continue;
        };
        out.push_str(token);
        rest = &rest[advance..];
    }

    out
}

/// Substitute `{{field}}` placeholders, then evaluate as arithmetic.
fn process_formula(rule: &Rule, record: &Record) -> EvalResult<Value> {
    let formula = rule
        .option("formula")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let substituted = PLACEHOLDER_RE.replace_all(formula, |caps: &regex::Captures| {
        record
            .get(caps[1].trim())
            .map(value_to_string)
            .unwrap_or_default()
    });

    let result = expr::evaluate(&substituted)?;
    Ok(expr_to_value(result))
}

fn expr_to_value(value: ExprValue) -> Value {
    match value {
        ExprValue::Num(n) => {
            if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                Value::Number(Number::from(n as i64))
            } else {
                Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
            }
        }
        ExprValue::Str(s) => Value::String(s),
        ExprValue::Bool(b) => Value::Bool(b),
    }
}

/// Substitute the resolved source value for `?` in each condition and
/// return the first matching condition's value.
///
/// A condition that fails to evaluate is skipped, not fatal.
fn process_conditional(rule: &Rule, record: &Record) -> Value {
    let default = || {
        rule.option("default")
            .cloned()
            .unwrap_or_else(empty_value)
    };

    let conditions = match rule.option("conditions").and_then(Value::as_array) {
        Some(conditions) => conditions.clone(),
        None => return default(),
    };

    let source = source_value(rule, record)
        .map(|v| value_to_string(&v))
        .unwrap_or_default();

    for condition in &conditions {
        let (predicate, value) = match (
            condition.get("condition").and_then(Value::as_str),
            condition.get("value"),
        ) {
            (Some(predicate), Some(value)) => (predicate, value),
            _ => continue,
        };

        let substituted = predicate.replace('?', &source);
        match expr::evaluate_predicate(&substituted) {
            Ok(true) => return value.clone(),
            Ok(false) => {}
            Err(err) => {
                warn!(
                    "condition '{}' for '{}' skipped: {}",
                    substituted, rule.destination_field, err
                );
            }
        }
    }

    default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_field_mapping_direct() {
        let rules = RuleSet::new().with_mapping(Rule::field_mapping("nome", "name"));
        let rec = record(json!({"nome": "Produto 1"}));
        assert_eq!(evaluate(&rules, "name", &rec), json!("Produto 1"));
    }

    #[test]
    fn test_field_mapping_formats() {
        let rec = record(json!({"nome": "  ana SILVA  "}));

        let upper = Rule::field_mapping("nome", "n").with_format("uppercase");
        assert_eq!(evaluate_rule(&upper, &rec), json!("  ANA SILVA  "));

        let lower = Rule::field_mapping("nome", "n").with_format("lowercase");
        assert_eq!(evaluate_rule(&lower, &rec), json!("  ana silva  "));

        let trim = Rule::field_mapping("nome", "n").with_format("trim");
        assert_eq!(evaluate_rule(&trim, &rec), json!("ana SILVA"));

        let cap = Rule::field_mapping("nome", "n").with_format("trim");
        let trimmed = evaluate_rule(&cap, &rec);
        assert_eq!(
            format_value(trimmed, Some("capitalize")),
            json!("Ana Silva")
        );
    }

    #[test]
    fn test_field_mapping_nested_path() {
        let rule = Rule::field_path("user.address.city", "city");
        let rec = record(json!({"user": {"address": {"city": "Lisboa"}}}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("Lisboa"));
    }

    #[test]
    fn test_source_index_takes_precedence() {
        let mut rule = Rule::field_mapping("b", "out");
        rule.source_index = Some(0);
        let rec = record(json!({"a": "first", "b": "second"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("first"));
    }

    #[test]
    fn test_fixed_value() {
        let rules = RuleSet::new().with_mapping(Rule::fixed_value("origin", "import"));
        let rec = record(json!({}));
        assert_eq!(evaluate(&rules, "origin", &rec), json!("import"));
    }

    #[test]
    fn test_no_rule_falls_back_to_record() {
        let rules = RuleSet::new();
        let rec = record(json!({"name": "direct"}));
        assert_eq!(evaluate(&rules, "name", &rec), json!("direct"));
        assert_eq!(evaluate(&rules, "missing", &rec), json!(""));
    }

    #[test]
    fn test_concat_skips_empty_values() {
        let rule = Rule::concat("full", &["first", "last"], " ");

        let rec = record(json!({"first": "Ana", "last": "Silva"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("Ana Silva"));

        let rec = record(json!({"first": "", "last": "Silva"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("Silva"));
    }

    #[test]
    fn test_concat_custom_separator() {
        let rule = Rule::concat("address", &["street", "number"], ", ");
        let rec = record(json!({"street": "Rua A", "number": "12"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("Rua A, 12"));
    }

    #[test]
    fn test_date_transform_serial() {
        let rule = Rule::date_transform("date", "date").with_format("dd/mm/yyyy");
        let rec = record(json!({"date": 44197}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("01/01/2021"));
    }

    #[test]
    fn test_date_transform_serial_string() {
        let rule = Rule::date_transform("date", "date");
        let rec = record(json!({"date": "44197"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("01/01/2021"));
    }

    #[test]
    fn test_date_transform_textual_candidates() {
        let rule = Rule::date_transform("date", "date").with_format("yyyy-mm-dd");
        let rec = record(json!({"date": "31/12/2020"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("2020-12-31"));
    }

    #[test]
    fn test_date_transform_source_format() {
        let rule = Rule::date_transform("date", "date")
            .with_format("dd/mm/yyyy")
            .with_option("source_format", json!("yyyy.mm.dd"));
        let rec = record(json!({"date": "2021.03.15"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("15/03/2021"));
    }

    #[test]
    fn test_date_transform_unparsable_passthrough() {
        let rule = Rule::date_transform("date", "date");
        let rec = record(json!({"date": "not a date"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!("not a date"));
    }

    #[test]
    fn test_formula() {
        let rule = Rule::formula("total", "{{price}} * {{quantity}}");
        let rec = record(json!({"price": "10.5", "quantity": "3"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!(31.5));
    }

    #[test]
    fn test_formula_integral_result() {
        let rule = Rule::formula("total", "{{a}} + {{b}}");
        let rec = record(json!({"a": 2, "b": 3}));
        assert_eq!(evaluate_rule(&rule, &rec), json!(5));
    }

    #[test]
    fn test_formula_failure_degrades_to_empty() {
        let rule = Rule::formula("total", "{{price}} *");
        let rec = record(json!({"price": "10"}));
        assert_eq!(evaluate_rule(&rule, &rec), json!(""));
    }

    #[test]
    fn test_conditional() {
        let rule = Rule::conditional(
            "score",
            "grade",
            &[("? >= 90", "A"), ("? >= 70", "B")],
        )
        .with_option("default", json!("C"));

        assert_eq!(
            evaluate_rule(&rule, &record(json!({"score": "95"}))),
            json!("A")
        );
        assert_eq!(
            evaluate_rule(&rule, &record(json!({"score": "75"}))),
            json!("B")
        );
        assert_eq!(
            evaluate_rule(&rule, &record(json!({"score": "10"}))),
            json!("C")
        );
    }

    #[test]
    fn test_conditional_string_match() {
        let rule = Rule::conditional(
            "status",
            "label",
            &[("'?' == 'active'", "Ativo"), ("'?' == 'inactive'", "Inativo")],
        );

        assert_eq!(
            evaluate_rule(&rule, &record(json!({"status": "inactive"}))),
            json!("Inativo")
        );
        assert_eq!(
            evaluate_rule(&rule, &record(json!({"status": "other"}))),
            json!("")
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = RuleSet::new()
            .with_mapping(Rule::fixed_value("status", "specific"))
            .with_mapping(Rule::fixed_value("status", "generic"));
        assert_eq!(evaluate(&rules, "status", &record(json!({}))), json!("specific"));
    }

    #[test]
    fn test_section_lookup() {
        let mut rules = RuleSet::new().with_mapping(Rule::fixed_value("title", "row title"));
        rules
            .sections
            .header
            .push(Rule::fixed_value("title", "header title"));

        let rec = record(json!({}));
        assert_eq!(
            evaluate_section(&rules, RuleSection::Header, "title", &rec),
            json!("header title")
        );
        assert_eq!(evaluate(&rules, "title", &rec), json!("row title"));
    }

    #[test]
    fn test_chrono_pattern() {
        assert_eq!(chrono_pattern("dd/mm/yyyy"), "%d/%m/%Y");
        assert_eq!(chrono_pattern("yyyy-mm-dd hh:ii:ss"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(chrono_pattern("dd.mm.yy"), "%d.%m.%y");
    }
}
