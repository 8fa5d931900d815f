// XML response decoding
//
// PAN-OS result payloads vary per command, so bodies are decoded into a
// generic tree rather than per-endpoint structs. The mapping follows the
// usual attribute/element convention for XML-as-dictionary:
//
//   <response status="success"><result><key>abc</key></result></response>
//
// becomes
//
//   { "response": { "@status": "success", "result": { "key": "abc" } } }

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::Error;

/// Key under which mixed text content is stored in an element map.
pub const TEXT_KEY: &str = "#text";

/// A decoded XML node.
///
/// - an element with only text (or nothing) is [`Text`](Self::Text)
/// - an element with attributes or children is [`Map`](Self::Map); attributes
///   are keyed `@name`, children by tag name
/// - a child tag repeated under one parent is collected into a
///   [`List`](Self::List), in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParsedValue {
    Text(String),
    Map(IndexMap<String, ParsedValue>),
    List(Vec<ParsedValue>),
}

impl ParsedValue {
    /// Decode an XML document. The returned map has a single key, the root tag.
    pub fn from_xml(body: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(body);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<ParsedValue> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    if root.is_some() {
                        return Err(Error::Xml("content after the root element".into()));
                    }
                    stack.push(Frame::open(&start)?);
                }
                Ok(Event::Empty(start)) => {
                    let frame = Frame::open(&start)?;
                    attach(&mut stack, &mut root, frame)?;
                }
                Ok(Event::End(_)) => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced closing tag".into()))?;
                    attach(&mut stack, &mut root, frame)?;
                }
                Ok(Event::Text(text)) => {
                    let unescaped = text.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&unescaped);
                    }
                }
                Ok(Event::CData(cdata)) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml("unexpected end of document".into()));
        }
        root.ok_or_else(|| Error::Xml("document has no root element".into()))
    }

    /// Child lookup on a map. `None` for text, lists, and missing keys.
    pub fn get(&self, key: &str) -> Option<&ParsedValue> {
        match self {
            Self::Map(map) => map.get(key),
            Self::Text(_) | Self::List(_) => None,
        }
    }

    /// Walk a sequence of map keys.
    pub fn path(&self, keys: &[&str]) -> Option<&ParsedValue> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Text of a text node, or the `#text` of a map with mixed content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Map(map) => map.get(TEXT_KEY).and_then(Self::as_text),
            Self::List(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ParsedValue>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Text(_) | Self::List(_) => None,
        }
    }

    /// Shorthand for `get(key).and_then(as_text)`.
    pub fn text_at(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Self::as_text)
    }

    /// View as a sequence: every element of a list, or `self` alone.
    ///
    /// A single `<entry>` decodes to a map and several decode to a list;
    /// iterate with this to treat both the same way.
    pub fn items(&self) -> &[ParsedValue] {
        match self {
            Self::List(items) => items,
            Self::Text(_) | Self::Map(_) => std::slice::from_ref(self),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

// ── Decoder internals ───────────────────────────────────────────────

struct Frame {
    name: String,
    attributes: Vec<(String, String)>,
    children: IndexMap<String, ParsedValue>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, Error> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: IndexMap::new(),
            text: String::new(),
        })
    }

    fn add_child(&mut self, name: String, value: ParsedValue) {
        match self.children.get_mut(&name) {
            Some(ParsedValue::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, ParsedValue::List(Vec::with_capacity(2)));
                *existing = ParsedValue::List(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn finish(self) -> (String, ParsedValue) {
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, ParsedValue::Text(self.text));
        }

        let mut map = IndexMap::with_capacity(self.attributes.len() + self.children.len() + 1);
        for (key, value) in self.attributes {
            map.insert(format!("@{key}"), ParsedValue::Text(value));
        }
        map.extend(self.children);
        if !self.text.is_empty() {
            map.insert(TEXT_KEY.to_owned(), ParsedValue::Text(self.text));
        }
        (self.name, ParsedValue::Map(map))
    }
}

/// Close `frame` and hang it off its parent, or make it the document root.
fn attach(
    stack: &mut [Frame],
    root: &mut Option<ParsedValue>,
    frame: Frame,
) -> Result<(), Error> {
    let (name, value) = frame.finish();
    if let Some(parent) = stack.last_mut() {
        parent.add_child(name, value);
        return Ok(());
    }
    if root.is_some() {
        return Err(Error::Xml("multiple root elements".into()));
    }
    let mut map = IndexMap::with_capacity(1);
    map.insert(name, value);
    *root = Some(ParsedValue::Map(map));
    Ok(())
}
