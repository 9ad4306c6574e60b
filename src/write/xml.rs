//! XML writer.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::WriteResult;
use crate::eval::{evaluate, evaluate_section, resolve_placeholders};
use crate::record::{value_to_string, Record};
use crate::rules::{RuleSection, RuleSet};
use crate::templates::{XmlNode, XmlTemplate, XmlValue};

/// Serialize records as an XML document.
///
/// The root wrapper, header block and footer elements are emitted once per
/// document; the item tree is emitted once per record. Header/footer field
/// references resolve through the matching rule section against the first
/// record. All text and attribute content is markup-escaped.
pub fn write_xml(
    template: &XmlTemplate,
    records: &[Record],
    rules: &RuleSet,
) -> WriteResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    // Once-per-document blocks resolve against the first record.
    let document_record = records.first().cloned().unwrap_or_default();

    let mut root = BytesStart::new(template.root.name.as_str());
    for ns in &template.root.namespaces {
        let name = if ns.prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", ns.prefix)
        };
        root.push_attribute((name.as_str(), ns.uri.as_str()));
    }
    for attr in &template.root.attributes {
        let value = resolve(
            &attr.value,
            rules,
            Some(RuleSection::Header),
            &document_record,
        );
        root.push_attribute((attr.name.as_str(), value.as_str()));
    }
    writer.write_event(Event::Start(root))?;

    if let Some(header) = &template.header {
        write_node(
            &mut writer,
            header,
            rules,
            Some(RuleSection::Header),
            &document_record,
        )?;
    }

    for record in records {
        write_node(&mut writer, &template.item, rules, None, record)?;
    }

    for node in &template.footer {
        write_node(
            &mut writer,
            node,
            rules,
            Some(RuleSection::Footer),
            &document_record,
        )?;
    }

    writer.write_event(Event::End(BytesEnd::new(template.root.name.as_str())))?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    node: &XmlNode,
    rules: &RuleSet,
    section: Option<RuleSection>,
    record: &Record,
) -> WriteResult<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for attr in &node.attributes {
        let value = resolve(&attr.value, rules, section, record);
        start.push_attribute((attr.name.as_str(), value.as_str()));
    }

    let text = node
        .value
        .as_ref()
        .map(|value| resolve(value, rules, section, record));

    if text.is_none() && node.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;

    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(&text)))?;
    }

    for child in &node.children {
        write_node(writer, child, rules, section, record)?;
    }

    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}

/// Resolve a template value: a field reference goes through the evaluator
/// (section-aware for once-per-document blocks); a literal only has its
/// `{{field}}` placeholders substituted.
fn resolve(
    value: &XmlValue,
    rules: &RuleSet,
    section: Option<RuleSection>,
    record: &Record,
) -> String {
    match value {
        XmlValue::Field { field } => {
            let resolved = match section {
                Some(section) => evaluate_section(rules, section, field, record),
                None => evaluate(rules, field, record),
            };
            value_to_string(&resolved)
        }
        XmlValue::Literal(text) => resolve_placeholders(rules, text, record),
    }
}
