//! Rule configuration: the per-field transformation instructions.
//!
//! A [`RuleSet`] is built from external JSON configuration, validated once,
//! then consumed read-only for a single transform call. Each [`Rule`] maps
//! one destination field through one of the six rule kinds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RuleError, RuleResult};

/// The kind of transformation a rule performs.
///
/// Serialized as the `type` tag of the persisted rule form. The evaluator
/// matches on this exhaustively, so adding a variant forces a new arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Copy a source field, optionally reformatted.
    FieldMapping,
    /// Emit a configured constant.
    FixedValue,
    /// Evaluate an arithmetic expression over record fields.
    Formula,
    /// Join several record fields with a separator.
    Concat,
    /// Reformat a date value (serial or textual).
    DateTransform,
    /// Pick a value from the first matching condition.
    Conditional,
}

/// One field-level transformation rule.
///
/// Mirrors the persisted configuration form: a `type` tag plus the flat
/// optional columns. Immutable once constructed; owned by a [`RuleSet`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Rule kind (the `type` tag).
    #[serde(rename = "type")]
    pub kind: RuleKind,

    /// Source field name, for direct lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,

    /// Dot-notation path into nested source structures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    /// Positional source index, for tabular sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_index: Option<usize>,

    /// Destination field this rule produces. Always present.
    pub destination_field: String,

    /// Dot-notation path in the destination structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<String>,

    /// Positional destination index, for tabular destinations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_index: Option<usize>,

    /// Formatting directive (`uppercase`, `lowercase`, `capitalize`, `trim`,
    /// or a date pattern for date_transform rules).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Declared value type of the destination (`string`, `number`, `date`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_format: Option<String>,

    /// Constant for fixed_value rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<String>,

    /// Kind-specific options (concat fields, formula text, conditions...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl Rule {
    /// Create a field_mapping rule from source to destination.
    pub fn field_mapping(source: &str, destination: &str) -> Self {
        Self::new(RuleKind::FieldMapping, destination).with_source_field(source)
    }

    /// Create a field_mapping rule from a dot-notation source path.
    pub fn field_path(path: &str, destination: &str) -> Self {
        let mut rule = Self::new(RuleKind::FieldMapping, destination);
        rule.source_path = Some(path.to_string());
        rule
    }

    /// Create a fixed_value rule.
    pub fn fixed_value(destination: &str, value: &str) -> Self {
        let mut rule = Self::new(RuleKind::FixedValue, destination);
        rule.fixed_value = Some(value.to_string());
        rule
    }

    /// Create a concat rule joining `fields` with `separator`.
    pub fn concat(destination: &str, fields: &[&str], separator: &str) -> Self {
        let mut options = Map::new();
        options.insert(
            "fields".to_string(),
            Value::Array(fields.iter().map(|f| Value::String(f.to_string())).collect()),
        );
        options.insert(
            "separator".to_string(),
            Value::String(separator.to_string()),
        );
        Self::new(RuleKind::Concat, destination).with_options(options)
    }

    /// Create a formula rule from an expression with `{{field}}` placeholders.
    pub fn formula(destination: &str, formula: &str) -> Self {
        let mut options = Map::new();
        options.insert("formula".to_string(), Value::String(formula.to_string()));
        Self::new(RuleKind::Formula, destination).with_options(options)
    }

    /// Create a date_transform rule.
    pub fn date_transform(source: &str, destination: &str) -> Self {
        Self::new(RuleKind::DateTransform, destination).with_source_field(source)
    }

    /// Create a conditional rule from `(condition, value)` pairs.
    pub fn conditional(source: &str, destination: &str, conditions: &[(&str, &str)]) -> Self {
        let entries: Vec<Value> = conditions
            .iter()
            .map(|(cond, value)| {
                let mut entry = Map::new();
                entry.insert("condition".to_string(), Value::String(cond.to_string()));
                entry.insert("value".to_string(), Value::String(value.to_string()));
                Value::Object(entry)
            })
            .collect();
        let mut options = Map::new();
        options.insert("conditions".to_string(), Value::Array(entries));
        Self::new(RuleKind::Conditional, destination)
            .with_source_field(source)
            .with_options(options)
    }

    fn new(kind: RuleKind, destination: &str) -> Self {
        Self {
            kind,
            source_field: None,
            source_path: None,
            source_index: None,
            destination_field: destination.to_string(),
            destination_path: None,
            destination_index: None,
            format: None,
            value_format: None,
            fixed_value: None,
            options: None,
        }
    }

    fn with_source_field(mut self, source: &str) -> Self {
        self.source_field = Some(source.to_string());
        self
    }

    /// Set the formatting directive.
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Replace the options map.
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = Some(options);
        self
    }

    /// Add one option entry.
    pub fn with_option(mut self, key: &str, value: Value) -> Self {
        self.options
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        self
    }

    /// Fetch one option entry, if present.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.as_ref()?.get(key)
    }

    /// Validate the per-kind invariants.
    pub fn validate(&self) -> RuleResult<()> {
        if self.destination_field.is_empty() {
            return Err(RuleError::MissingDestination);
        }

        match self.kind {
            RuleKind::FieldMapping | RuleKind::DateTransform => {
                if self.source_field.is_none() && self.source_path.is_none() {
                    return Err(RuleError::MissingSource(self.destination_field.clone()));
                }
            }
            RuleKind::FixedValue => {
                if self.fixed_value.is_none() {
                    return Err(RuleError::MissingFixedValue(self.destination_field.clone()));
                }
            }
            RuleKind::Concat => {
                if !matches!(self.option("fields"), Some(Value::Array(_))) {
                    return Err(RuleError::MissingOption {
                        field: self.destination_field.clone(),
                        option: "fields".to_string(),
                    });
                }
            }
            RuleKind::Formula => {
                if !matches!(self.option("formula"), Some(Value::String(_))) {
                    return Err(RuleError::MissingOption {
                        field: self.destination_field.clone(),
                        option: "formula".to_string(),
                    });
                }
            }
            RuleKind::Conditional => {
                let has_conditions = matches!(self.option("conditions"), Some(Value::Array(_)));
                let has_default = self.option("default").is_some();
                if !has_conditions && !has_default {
                    return Err(RuleError::MissingOption {
                        field: self.destination_field.clone(),
                        option: "conditions".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Named rule sections for once-per-document output blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSection {
    Header,
    Row,
    Footer,
}

/// Optional partition of rules into header/row/footer sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sections {
    #[serde(default)]
    pub header: Vec<Rule>,
    #[serde(default)]
    pub row: Vec<Rule>,
    #[serde(default)]
    pub footer: Vec<Rule>,
}

/// The full rule collection for one transform call.
///
/// Lookup scans `mappings` in order and uses the first rule whose
/// `destination_field` matches. Authors order rules by specificity; the
/// engine does not enforce uniqueness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    /// Flat field mappings, scanned in order.
    #[serde(default)]
    pub mappings: Vec<Rule>,

    /// Optional header/row/footer sections.
    #[serde(default)]
    pub sections: Sections,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a rule set from a JSON string.
    pub fn from_json(json: &str) -> RuleResult<Self> {
        let rules: RuleSet = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Parse and validate a rule set from a JSON value.
    pub fn from_value(value: &Value) -> RuleResult<Self> {
        let rules: RuleSet = serde_json::from_value(value.clone())?;
        rules.validate()?;
        Ok(rules)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Append a mapping rule.
    pub fn with_mapping(mut self, rule: Rule) -> Self {
        self.mappings.push(rule);
        self
    }

    /// Validate every rule in every section.
    pub fn validate(&self) -> RuleResult<()> {
        for rule in self.iter_all() {
            rule.validate()?;
        }
        Ok(())
    }

    /// First mapping rule producing `destination_field`, if any.
    pub fn find(&self, destination_field: &str) -> Option<&Rule> {
        self.mappings
            .iter()
            .find(|rule| rule.destination_field == destination_field)
    }

    /// First rule producing `destination_field` in the given section,
    /// falling back to the flat mappings.
    pub fn find_in_section(&self, section: RuleSection, destination_field: &str) -> Option<&Rule> {
        self.section(section)
            .iter()
            .find(|rule| rule.destination_field == destination_field)
            .or_else(|| self.find(destination_field))
    }

    /// The rules of one named section.
    pub fn section(&self, section: RuleSection) -> &[Rule] {
        match section {
            RuleSection::Header => &self.sections.header,
            RuleSection::Row => &self.sections.row,
            RuleSection::Footer => &self.sections.footer,
        }
    }

    fn iter_all(&self) -> impl Iterator<Item = &Rule> {
        self.mappings
            .iter()
            .chain(self.sections.header.iter())
            .chain(self.sections.row.iter())
            .chain(self.sections.footer.iter())
    }
}

/// An example rule set for documentation and the CLI.
pub fn example_rules() -> RuleSet {
    RuleSet::new()
        .with_mapping(Rule::field_mapping("id", "id"))
        .with_mapping(Rule::field_mapping("nome", "name").with_format("trim"))
        .with_mapping(Rule::field_mapping("preco", "value"))
        .with_mapping(Rule::concat("full_name", &["first", "last"], " "))
        .with_mapping(Rule::date_transform("criado_em", "created_at").with_format("dd/mm/yyyy"))
        .with_mapping(Rule::fixed_value("origin", "import"))
}
