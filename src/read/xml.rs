//! XML source reader.

use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ReadOptions;
use crate::error::{ReadError, ReadResult};
use crate::record::Record;
use serde_json::Value;

/// One parsed element: name, direct text and child elements.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// All text inside this element, descendants included.
    fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
        }
        out
    }
}

/// Read an XML file into records.
///
/// The item collection is the set of same-named children directly under the
/// root element, named by the hint or by the root's first child. Each
/// item's direct children, flattened to their text content, become one
/// record.
pub fn read(path: &Path, options: &ReadOptions) -> ReadResult<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    let root = parse_tree(&content)?;

    let item_name = match &options.collection_key {
        Some(key) => key.clone(),
        None => match root.children.first() {
            Some(first) => first.name.clone(),
            None => return Ok(Vec::new()),
        },
    };

    let records = root
        .children
        .iter()
        .filter(|child| child.name == item_name)
        .map(|item| {
            let mut record = Record::new();
            for field in &item.children {
                record.insert(
                    field.name.clone(),
                    Value::String(field.text_content().trim().to_string()),
                );
            }
            record
        })
        .collect();

    Ok(records)
}

/// Parse the document into an element tree, rooted at the document element.
fn parse_tree(content: &str) -> ReadResult<Element> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(Element {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ..Element::default()
                });
            }
            Ok(Event::Empty(start)) => {
                let element = Element {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ..Element::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(text)) => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| ReadError::malformed("xml", e))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ReadError::malformed("xml", "unexpected closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ReadError::malformed("xml", e)),
        }
    }

    root.ok_or_else(|| ReadError::malformed("xml", "document has no root element"))
}
