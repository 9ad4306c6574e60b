//! Output templates and the template registry.
//!
//! A template is a named, format-specific structural descriptor: field
//! order, nesting, styling and sheet layout for one output format. The
//! [`TemplateRegistry`] is built once at startup and passed explicitly into
//! writer calls; looking up an unknown name silently falls back to the
//! format's `default` template, a deliberately permissive policy distinct
//! from the strict handling of source I/O.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

/// Name of the guaranteed template in every format family.
pub const DEFAULT_TEMPLATE: &str = "default";

// =============================================================================
// CSV Templates
// =============================================================================

/// Structural descriptor for delimited-text output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvTemplate {
    /// Output column order, also emitted as the literal header row.
    pub headers: Vec<String>,
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Field enclosure character.
    #[serde(default = "default_quote")]
    pub quote: char,
    /// Escape character.
    #[serde(default = "default_escape")]
    pub escape: char,
    /// Whether the header row is written.
    #[serde(default = "default_true")]
    pub has_header_row: bool,
}

fn default_delimiter() -> char {
    ','
}

fn default_quote() -> char {
    '"'
}

fn default_escape() -> char {
    '\\'
}

fn default_true() -> bool {
    true
}

impl Default for CsvTemplate {
    fn default() -> Self {
        Self {
            headers: vec!["id".into(), "name".into(), "value".into()],
            delimiter: default_delimiter(),
            quote: default_quote(),
            escape: default_escape(),
            has_header_row: true,
        }
    }
}

// =============================================================================
// JSON Templates
// =============================================================================

/// Structural descriptor for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTemplate {
    /// Property the item array is nested under; `None` emits a bare array.
    #[serde(default)]
    pub root_property: Option<String>,
    /// Optional document metadata block.
    #[serde(default)]
    pub metadata: Option<JsonMetadata>,
    /// Structure of each emitted item.
    pub item: ItemStructure,
    /// Pretty-print the output.
    #[serde(default = "default_true")]
    pub pretty_print: bool,
}

/// Metadata block emitted alongside the item array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonMetadata {
    /// Emit a generation timestamp.
    #[serde(default = "default_true")]
    pub generated_at: bool,
    /// Emit the record count.
    #[serde(default = "default_true")]
    pub total_records: bool,
    /// Literal status string.
    #[serde(default)]
    pub status: Option<String>,
}

impl Default for JsonMetadata {
    fn default() -> Self {
        Self {
            generated_at: true,
            total_records: true,
            status: Some("success".into()),
        }
    }
}

/// Field layout of one output item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemStructure {
    /// Destination fields, resolved through the rule evaluator.
    pub fields: Vec<String>,
    /// Nested sub-objects.
    #[serde(default)]
    pub nested_objects: Vec<NestedObject>,
}

/// One nested object inside an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NestedObject {
    /// Property name in the output item.
    pub name: String,
    /// When set, the source value is a list of sub-records whose fields are
    /// copied directly, bypassing rule resolution.
    #[serde(default)]
    pub is_array: bool,
    /// Fields of the nested object.
    pub fields: Vec<String>,
    /// Deeper nesting, same structure.
    #[serde(default)]
    pub nested_objects: Vec<NestedObject>,
}

impl Default for JsonTemplate {
    fn default() -> Self {
        Self {
            root_property: Some("data".into()),
            metadata: Some(JsonMetadata::default()),
            item: ItemStructure {
                fields: vec!["id".into(), "name".into(), "value".into()],
                nested_objects: Vec::new(),
            },
            pretty_print: true,
        }
    }
}

// =============================================================================
// XML Templates
// =============================================================================

/// Structural descriptor for XML output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmlTemplate {
    /// Document root element.
    pub root: XmlRoot,
    /// Optional block emitted once before the items.
    #[serde(default)]
    pub header: Option<XmlNode>,
    /// Element tree emitted once per record.
    pub item: XmlNode,
    /// Optional elements emitted once after the items.
    #[serde(default)]
    pub footer: Vec<XmlNode>,
}

/// The root element wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmlRoot {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<XmlAttribute>,
    /// Namespace declarations; an empty prefix declares the default namespace.
    #[serde(default)]
    pub namespaces: Vec<XmlNamespace>,
}

/// One namespace declaration on the root element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmlNamespace {
    #[serde(default)]
    pub prefix: String,
    pub uri: String,
}

/// One element in the output tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmlNode {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<XmlAttribute>,
    /// Text content: a literal (which may carry `{{field}}` placeholders)
    /// or a rule-resolved field reference.
    #[serde(default)]
    pub value: Option<XmlValue>,
    #[serde(default)]
    pub children: Vec<XmlNode>,
}

/// One attribute on an output element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmlAttribute {
    pub name: String,
    pub value: XmlValue,
}

/// A literal or a rule-resolved field reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XmlValue {
    /// Resolve through the rule evaluator: `{"field": "name"}`.
    Field { field: String },
    /// Emit verbatim (after `{{field}}` placeholder substitution).
    Literal(String),
}

impl XmlNode {
    /// A leaf element whose content is a rule-resolved field.
    pub fn field(name: &str, field: &str) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            value: Some(XmlValue::Field {
                field: field.into(),
            }),
            children: Vec::new(),
        }
    }

    /// A leaf element with literal content.
    pub fn literal(name: &str, text: &str) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            value: Some(XmlValue::Literal(text.into())),
            children: Vec::new(),
        }
    }

    /// A container element.
    pub fn parent(name: &str, children: Vec<XmlNode>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            value: None,
            children,
        }
    }

    /// Attach a rule-resolved attribute.
    pub fn with_field_attribute(mut self, name: &str, field: &str) -> Self {
        self.attributes.push(XmlAttribute {
            name: name.into(),
            value: XmlValue::Field {
                field: field.into(),
            },
        });
        self
    }
}

impl Default for XmlTemplate {
    fn default() -> Self {
        Self {
            root: XmlRoot {
                name: "data".into(),
                attributes: vec![XmlAttribute {
                    name: "version".into(),
                    value: XmlValue::Literal("1.0".into()),
                }],
                namespaces: Vec::new(),
            },
            header: None,
            item: XmlNode::parent(
                "item",
                vec![
                    XmlNode::field("id", "id"),
                    XmlNode::field("name", "name"),
                    XmlNode::field("value", "value"),
                ],
            ),
            footer: Vec::new(),
        }
    }
}

// =============================================================================
// XLSX Templates
// =============================================================================

/// Structural descriptor for workbook output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XlsxTemplate {
    /// Document properties.
    #[serde(default)]
    pub properties: DocProperties,
    /// Sheets, in workbook order.
    pub sheets: Vec<SheetTemplate>,
}

/// Workbook document properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocProperties {
    pub creator: String,
    pub title: String,
    pub description: String,
}

impl Default for DocProperties {
    fn default() -> Self {
        Self {
            creator: "datashift".into(),
            title: "Data Export".into(),
            description: "Generated export".into(),
        }
    }
}

/// One sheet: headers plus header-row styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetTemplate {
    pub name: String,
    pub headers: Vec<String>,
    #[serde(default)]
    pub header_style: HeaderStyle,
}

/// Styling applied to the header row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderStyle {
    #[serde(default = "default_true")]
    pub bold: bool,
    #[serde(default)]
    pub size: Option<f64>,
    /// Background fill, `#RRGGBB`.
    #[serde(default)]
    pub fill_color: Option<String>,
    /// Font color, `#RRGGBB`.
    #[serde(default)]
    pub font_color: Option<String>,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            bold: true,
            size: Some(12.0),
            fill_color: Some("#DDDDDD".into()),
            font_color: Some("#000000".into()),
        }
    }
}

impl Default for XlsxTemplate {
    fn default() -> Self {
        Self {
            properties: DocProperties::default(),
            sheets: vec![SheetTemplate {
                name: "Data".into(),
                headers: vec!["id".into(), "name".into(), "value".into()],
                header_style: HeaderStyle::default(),
            }],
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Named templates for all four output formats.
///
/// Construct once with [`TemplateRegistry::with_defaults`] and pass into
/// transformer/writer calls; there is no ambient global registry.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    csv: HashMap<String, CsvTemplate>,
    json: HashMap<String, JsonTemplate>,
    xml: HashMap<String, XmlTemplate>,
    xlsx: HashMap<String, XlsxTemplate>,
}

impl TemplateRegistry {
    /// An empty registry. Lookups still succeed via the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with the stock presets for every format.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_csv(DEFAULT_TEMPLATE, CsvTemplate::default());
        registry.register_csv("customers", customers_csv());
        registry.register_csv("products", products_csv());
        registry.register_csv("financial_report", financial_csv());

        registry.register_json(DEFAULT_TEMPLATE, JsonTemplate::default());
        registry.register_json("customers", customers_json());
        registry.register_json("products", products_json());

        registry.register_xml(DEFAULT_TEMPLATE, XmlTemplate::default());
        registry.register_xml("customers", customers_xml());
        registry.register_xml("orders", orders_xml());

        registry.register_xlsx(DEFAULT_TEMPLATE, XlsxTemplate::default());
        registry.register_xlsx("products", products_xlsx());
        registry.register_xlsx("financial_report", financial_xlsx());

        registry
    }

    pub fn register_csv(&mut self, name: &str, template: CsvTemplate) {
        self.csv.insert(name.to_string(), template);
    }

    pub fn register_json(&mut self, name: &str, template: JsonTemplate) {
        self.json.insert(name.to_string(), template);
    }

    pub fn register_xml(&mut self, name: &str, template: XmlTemplate) {
        self.xml.insert(name.to_string(), template);
    }

    pub fn register_xlsx(&mut self, name: &str, template: XlsxTemplate) {
        self.xlsx.insert(name.to_string(), template);
    }

    /// CSV template by name, falling back to `default`.
    pub fn csv(&self, name: &str) -> CsvTemplate {
        lookup(&self.csv, name)
    }

    /// JSON template by name, falling back to `default`.
    pub fn json(&self, name: &str) -> JsonTemplate {
        lookup(&self.json, name)
    }

    /// XML template by name, falling back to `default`.
    pub fn xml(&self, name: &str) -> XmlTemplate {
        lookup(&self.xml, name)
    }

    /// XLSX template by name, falling back to `default`.
    pub fn xlsx(&self, name: &str) -> XlsxTemplate {
        lookup(&self.xlsx, name)
    }

    /// Registered template names per format, sorted.
    pub fn names(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![
            ("csv", sorted_keys(&self.csv)),
            ("json", sorted_keys(&self.json)),
            ("xml", sorted_keys(&self.xml)),
            ("xlsx", sorted_keys(&self.xlsx)),
        ]
    }
}

fn sorted_keys<T>(map: &HashMap<String, T>) -> Vec<String> {
    let mut names: Vec<String> = map.keys().cloned().collect();
    names.sort();
    names
}

fn lookup<T: Clone + Default>(map: &HashMap<String, T>, name: &str) -> T {
    if let Some(template) = map.get(name) {
        return template.clone();
    }
    if name != DEFAULT_TEMPLATE {
        debug!("template '{}' not registered, using default", name);
    }
    map.get(DEFAULT_TEMPLATE).cloned().unwrap_or_default()
}

// =============================================================================
// Stock presets
// =============================================================================

fn customers_csv() -> CsvTemplate {
    CsvTemplate {
        headers: vec![
            "code".into(),
            "full_name".into(),
            "email".into(),
            "phone".into(),
            "city".into(),
            "state".into(),
            "created_at".into(),
        ],
        delimiter: ';',
        ..CsvTemplate::default()
    }
}

fn products_csv() -> CsvTemplate {
    CsvTemplate {
        headers: vec![
            "sku".into(),
            "name".into(),
            "description".into(),
            "category".into(),
            "price".into(),
            "stock".into(),
        ],
        ..CsvTemplate::default()
    }
}

fn financial_csv() -> CsvTemplate {
    CsvTemplate {
        headers: vec![
            "transaction_id".into(),
            "date".into(),
            "type".into(),
            "description".into(),
            "amount".into(),
            "status".into(),
        ],
        delimiter: ';',
        ..CsvTemplate::default()
    }
}

fn customers_json() -> JsonTemplate {
    JsonTemplate {
        root_property: Some("customers".into()),
        metadata: Some(JsonMetadata::default()),
        item: ItemStructure {
            fields: vec![
                "id".into(),
                "name".into(),
                "email".into(),
                "phone".into(),
                "status".into(),
                "created_at".into(),
            ],
            nested_objects: vec![NestedObject {
                name: "address".into(),
                is_array: false,
                fields: vec![
                    "street".into(),
                    "number".into(),
                    "district".into(),
                    "city".into(),
                    "state".into(),
                    "zipcode".into(),
                ],
                nested_objects: Vec::new(),
            }],
        },
        pretty_print: true,
    }
}

fn products_json() -> JsonTemplate {
    JsonTemplate {
        root_property: Some("products".into()),
        metadata: Some(JsonMetadata::default()),
        item: ItemStructure {
            fields: vec![
                "sku".into(),
                "name".into(),
                "description".into(),
                "category".into(),
                "price".into(),
                "stock".into(),
            ],
            nested_objects: vec![
                NestedObject {
                    name: "dimensions".into(),
                    is_array: false,
                    fields: vec![
                        "weight".into(),
                        "width".into(),
                        "height".into(),
                        "length".into(),
                    ],
                    nested_objects: Vec::new(),
                },
                NestedObject {
                    name: "images".into(),
                    is_array: true,
                    fields: vec!["url".into(), "order".into()],
                    nested_objects: Vec::new(),
                },
            ],
        },
        pretty_print: true,
    }
}

fn customers_xml() -> XmlTemplate {
    XmlTemplate {
        root: XmlRoot {
            name: "customers".into(),
            attributes: vec![XmlAttribute {
                name: "version".into(),
                value: XmlValue::Literal("1.0".into()),
            }],
            namespaces: Vec::new(),
        },
        header: Some(XmlNode::parent(
            "header",
            vec![
                XmlNode::literal("title", "Customer List"),
                XmlNode::literal("description", "Customer data export"),
            ],
        )),
        item: XmlNode::parent(
            "customer",
            vec![
                XmlNode::field("name", "name"),
                XmlNode::field("email", "email"),
                XmlNode::field("phone", "phone"),
                XmlNode::parent(
                    "address",
                    vec![
                        XmlNode::field("street", "street"),
                        XmlNode::field("city", "city"),
                        XmlNode::field("state", "state"),
                        XmlNode::field("zipcode", "zipcode"),
                    ],
                ),
                XmlNode::field("status", "status"),
            ],
        )
        .with_field_attribute("id", "id"),
        footer: Vec::new(),
    }
}

fn orders_xml() -> XmlTemplate {
    XmlTemplate {
        root: XmlRoot {
            name: "orders".into(),
            attributes: vec![XmlAttribute {
                name: "version".into(),
                value: XmlValue::Literal("1.0".into()),
            }],
            namespaces: Vec::new(),
        },
        header: Some(XmlNode::parent(
            "header",
            vec![
                XmlNode::literal("title", "Order List"),
                XmlNode::literal("description", "Order data export"),
            ],
        )),
        item: XmlNode {
            name: "order".into(),
            attributes: vec![
                XmlAttribute {
                    name: "number".into(),
                    value: XmlValue::Field {
                        field: "order_number".into(),
                    },
                },
                XmlAttribute {
                    name: "date".into(),
                    value: XmlValue::Field {
                        field: "order_date".into(),
                    },
                },
            ],
            value: None,
            children: vec![
                XmlNode::field("customer", "customer_name")
                    .with_field_attribute("id", "customer_id"),
                XmlNode::field("total", "total"),
                XmlNode::field("status", "status"),
            ],
        },
        footer: Vec::new(),
    }
}

fn products_xlsx() -> XlsxTemplate {
    XlsxTemplate {
        properties: DocProperties {
            creator: "datashift".into(),
            title: "Product Catalog".into(),
            description: "Product catalog export".into(),
        },
        sheets: vec![SheetTemplate {
            name: "Products".into(),
            headers: vec![
                "sku".into(),
                "name".into(),
                "category".into(),
                "price".into(),
                "stock".into(),
            ],
            header_style: HeaderStyle {
                fill_color: Some("#B7DEE8".into()),
                font_color: Some("#0070C0".into()),
                ..HeaderStyle::default()
            },
        }],
    }
}

fn financial_xlsx() -> XlsxTemplate {
    let headers = vec![
        "id".into(),
        "description".into(),
        "category".into(),
        "amount".into(),
        "date".into(),
        "status".into(),
    ];
    XlsxTemplate {
        properties: DocProperties {
            creator: "datashift".into(),
            title: "Financial Report".into(),
            description: "Financial report export".into(),
        },
        sheets: vec![
            SheetTemplate {
                name: "Revenue".into(),
                headers: headers.clone(),
                header_style: HeaderStyle {
                    fill_color: Some("#C6EFCE".into()),
                    font_color: Some("#006100".into()),
                    ..HeaderStyle::default()
                },
            },
            SheetTemplate {
                name: "Expenses".into(),
                headers,
                header_style: HeaderStyle {
                    fill_color: Some("#FFC7CE".into()),
                    font_color: Some("#9C0006".into()),
                    ..HeaderStyle::default()
                },
            },
        ],
    }
}
