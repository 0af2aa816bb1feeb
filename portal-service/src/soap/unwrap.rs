//! Inner-payload extraction and record flattening.
//!
//! The backend double-wraps its real payload: the SOAP body carries a result
//! element whose text content is itself an XML document, usually with its
//! markup HTML-entity-escaped. Unwrapping is therefore a two-pass affair:
//! locate and decode the inner text, then parse it and flatten the repeated
//! record elements into ordered field maps.
//!
//! Extraction runs a fixed three-branch strategy, in precedence order:
//!
//! 1. the first element whose local name equals the operation's result tag
//!    (case-insensitive),
//! 2. the first generic `<string>` element,
//! 3. the root element's leading text.
//!
//! A branch that matches an element wins even when its content turns out to
//! be empty; later branches are only consulted when the element is absent.

use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::UpstreamError;

/// One flattened record: an insertion-ordered mapping from child element
/// name to trimmed text content. Upstream field sets vary by operation and
/// are not contractually stable, so unknown fields pass through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, overwriting the value of an existing key in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A field of the richer single-entity flattening used by the policy-detail
/// operation: leaves stay text, nested elements become records, and the
/// collateral-names collection becomes a list of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Record(Record),
    List(Vec<Record>),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => s.serialize(serializer),
            FieldValue::Record(r) => r.serialize(serializer),
            FieldValue::List(v) => v.serialize(serializer),
        }
    }
}

/// Ordered field map for a single flattened entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRecord {
    fields: Vec<(String, FieldValue)>,
}

impl DetailRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for DetailRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Extract the decoded inner payload from a raw SOAP response body, or
/// `None` when the body carries no usable content.
pub fn extract_inner(result_tag: &str, body: &str) -> Option<String> {
    if let Some(raw) = first_element_raw_text(body, result_tag) {
        return clean(&raw);
    }
    if let Some(raw) = first_element_raw_text(body, "string") {
        return clean(&raw);
    }
    let root = parse_tree(body)?;
    clean(&root.text)
}

/// Parse the inner document and flatten every element named `record_tag`,
/// found at any depth, into a record. Zero matches retries a single-element
/// locate so operations that return one unwrapped item still yield a
/// one-element list. Zero records is success, not failure.
pub fn parse_records(inner: &str, record_tag: &str) -> Result<Vec<Record>, UpstreamError> {
    let root = parse_tree(inner).ok_or(UpstreamError::InvalidInner)?;
    let mut nodes = Vec::new();
    root.collect(record_tag, &mut nodes);
    let records: Vec<Record> = nodes.iter().map(|n| flatten(n)).collect();
    if records.is_empty() {
        if let Some(node) = root.find_first(record_tag) {
            return Ok(vec![flatten(node)]);
        }
    }
    Ok(records)
}

/// Flatten the inner document's root children into a single entity. Leaf
/// children become text fields; a nested `COLLATERAL_NAMES` collection
/// becomes a list of records; any other nested element becomes one record.
pub fn parse_detail(inner: &str) -> Result<DetailRecord, UpstreamError> {
    let root = parse_tree(inner).ok_or(UpstreamError::InvalidInner)?;
    let mut detail = DetailRecord::new();
    for child in &root.children {
        if child.children.is_empty() {
            detail.insert(child.name.clone(), FieldValue::Text(child.text.trim().to_string()));
        } else if child.name.eq_ignore_ascii_case("COLLATERAL_NAMES") {
            let items = child.children.iter().map(flatten).collect();
            detail.insert("COLLATERAL_NAMES", FieldValue::List(items));
        } else {
            detail.insert(child.name.clone(), FieldValue::Record(flatten(child)));
        }
    }
    Ok(detail)
}

fn clean(raw: &str) -> Option<String> {
    let decoded = decode_entities(raw.trim());
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decode XML/HTML entity references, tolerating stray ampersands by
/// falling back to the input unchanged.
fn decode_entities(raw: &str) -> String {
    match unescape(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Capture the raw (still-escaped) content of the first element whose local
/// name matches `tag` case-insensitively, nested markup included.
fn first_element_raw_text(body: &str, tag: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                let name = std::str::from_utf8(local.as_ref()).ok()?;
                if name.eq_ignore_ascii_case(tag) {
                    return reader.read_text(e.name()).ok().map(|cow| cow.into_owned());
                }
            }
            Ok(Event::Empty(e)) => {
                let local = e.local_name();
                let name = std::str::from_utf8(local.as_ref()).ok()?;
                if name.eq_ignore_ascii_case(tag) {
                    return Some(String::new());
                }
            }
            Ok(Event::Eof) => return None,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
}

/// Minimal element tree with ElementTree-style `text` semantics: only the
/// text appearing before the first child element is retained.
#[derive(Debug, Default, Clone)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn collect<'a>(&'a self, name: &str, out: &mut Vec<&'a Node>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.collect(name, out);
        }
    }

    fn find_first(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first(name))
    }
}

fn flatten(node: &Node) -> Record {
    let mut record = Record::new();
    for child in &node.children {
        record.insert(child.name.clone(), child.text.trim().to_string());
    }
    record
}

fn parse_tree(xml: &str) -> Option<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.local_name().as_ref()).ok()?.to_string();
                stack.push(Node {
                    name,
                    text: String::new(),
                    children: Vec::new(),
                });
            }
            Ok(Event::Empty(e)) => {
                let name = std::str::from_utf8(e.local_name().as_ref()).ok()?.to_string();
                let node = Node {
                    name,
                    text: String::new(),
                    children: Vec::new(),
                };
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(t)) => {
                if let Some(top) = stack.last_mut() {
                    if top.children.is_empty() {
                        top.text.push_str(&t.unescape().ok()?);
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    if top.children.is_empty() {
                        top.text.push_str(std::str::from_utf8(&c).ok()?);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let node = stack.pop()?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    if !stack.is_empty() {
        return None;
    }
    root
}

fn attach(stack: &mut Vec<Node>, root: &mut Option<Node>, node: Node) -> Option<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_some() {
                // trailing junk after the document root
                return None;
            }
            *root = Some(node);
        }
    }
    Some(())
}
