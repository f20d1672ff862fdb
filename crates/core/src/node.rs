//! Telegraph content nodes.
//!
//! A page body is an ordered sequence of [`ContentNode`] values. Each node is
//! either a text run or an [`Element`] with a tag, optional attributes and
//! optional children. This is the exact shape the Telegraph API stores:
//!
//! ```text
//! Array<string | {tag: string, attrs?: {[name]: string}, children?: Array<...>}>
//! ```
//!
//! # Example
//!
//! ```rust
//! use telegraph_core::{ContentNode, Element};
//!
//! let link = Element::new("a").with_attr("href", "https://telegra.ph/").with_child("Telegraph");
//! let paragraph = Element::new("p").with_child("Visit ").with_child(link);
//!
//! assert_eq!(paragraph.children().len(), 2);
//! assert_eq!(ContentNode::from(paragraph).text_content(), "Visit Telegraph");
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{Result, TelegraphError};

/// Insertion-ordered attribute map.
///
/// Iteration and serialization follow insertion order; equality ignores it.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, keeping its original position when it already exists.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(name, value)| other.get(name) == Some(value))
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// An element node: a tag with optional attributes and children.
///
/// `attrs` and `children` are `None` rather than empty; the builder methods
/// keep that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Attributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ContentNode>>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), attrs: None, children: None }
    }

    /// Adds an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.get_or_insert_with(Attributes::new).insert(name, value);
        self
    }

    /// Replaces the attribute map; an empty map is stored as `None`.
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = (!attrs.is_empty()).then_some(attrs);
        self
    }

    /// Appends a child node.
    pub fn with_child(mut self, child: impl Into<ContentNode>) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child.into());
        self
    }

    /// Appends several child nodes in order.
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ContentNode>,
    {
        let mut children = children.into_iter().map(Into::<ContentNode>::into).peekable();
        if children.peek().is_some() {
            self.children.get_or_insert_with(Vec::new).extend(children);
        }
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.as_ref().and_then(|attrs| attrs.get(name))
    }

    /// Child nodes, or an empty slice when there are none.
    pub fn children(&self) -> &[ContentNode] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// A node of Telegraph page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContentNode {
    /// A literal text run.
    Text(String),
    /// An element with a tag and optional attributes and children.
    Element(Element),
}

impl ContentNode {
    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentNode::Text(text) => Some(text),
            ContentNode::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            ContentNode::Element(element) => Some(element),
            ContentNode::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &ContentNode, out: &mut String) {
    match node {
        ContentNode::Text(text) => out.push_str(text),
        ContentNode::Element(element) => {
            for child in element.children() {
                collect_text(child, out);
            }
        }
    }
}

impl From<Element> for ContentNode {
    fn from(element: Element) -> Self {
        ContentNode::Element(element)
    }
}

impl From<String> for ContentNode {
    fn from(text: String) -> Self {
        ContentNode::Text(text)
    }
}

impl From<&str> for ContentNode {
    fn from(text: &str) -> Self {
        ContentNode::Text(text.to_string())
    }
}

/// Short JSON type name for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl TryFrom<Value> for ContentNode {
    type Error = TelegraphError;

    /// Maps a JSON value onto a node without applying any policy.
    fn try_from(value: Value) -> Result<Self> {
        let mut object = match value {
            Value::String(text) => return Ok(ContentNode::Text(text)),
            Value::Object(object) => object,
            other => {
                return Err(TelegraphError::InvalidContent(format!(
                    "expected a string or an element, found {}",
                    json_kind(&other)
                )));
            }
        };

        let tag = match object.remove("tag") {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(TelegraphError::InvalidContent(format!(
                    "element tag must be a string, found {}",
                    json_kind(&other)
                )));
            }
            None => return Err(TelegraphError::InvalidContent("element is missing a tag".to_string())),
        };

        let attrs = match object.remove("attrs") {
            None | Some(Value::Null) => Attributes::new(),
            Some(Value::Object(attrs)) => attrs
                .into_iter()
                .map(|(name, value)| match value {
                    Value::String(value) => Ok((name, value)),
                    other => Err(TelegraphError::InvalidContent(format!(
                        "attribute {} on <{}> must be a string, found {}",
                        name,
                        tag,
                        json_kind(&other)
                    ))),
                })
                .collect::<Result<Attributes>>()?,
            Some(other) => {
                return Err(TelegraphError::InvalidContent(format!(
                    "attrs of <{}> must be an object, found {}",
                    tag,
                    json_kind(&other)
                )));
            }
        };

        let children = match object.remove("children") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(children)) => children
                .into_iter()
                .map(ContentNode::try_from)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(TelegraphError::InvalidContent(format!(
                    "children of <{}> must be an array, found {}",
                    tag,
                    json_kind(&other)
                )));
            }
        };

        Ok(Element::new(tag).with_attrs(attrs).with_children(children).into())
    }
}

impl<'de> Deserialize<'de> for ContentNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ContentNode::try_from(value).map_err(serde::de::Error::custom)
    }
}
