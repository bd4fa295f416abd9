//! Document tree model
//!
//! This module defines the nodes and marks of a rich document tree. The tree
//! is the common intermediate format shared by the serializer and the
//! deserializer; its serde form is the canonical export
//! (`{ "type", "attrs", "content", "text", "marks" }`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute map of a node or mark, in insertion order
pub type Attrs = IndexMap<String, Value>;

/// An inline decoration attached to a run of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    /// Key into the schema's mark rules
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            attrs: Attrs::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Get a string attribute. Empty strings count as absent.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        attr_str(&self.attrs, name)
    }

    /// Check whether an equal mark is present in `set`
    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }
}

/// One element of the document tree.
///
/// Text nodes carry `text` and `marks`; every other node carries an ordered
/// list of children in `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Key into the schema's node rules
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: Attrs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl Node {
    /// Create an empty node of the given type
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    /// Create a text node without marks
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::new(crate::schema::TEXT)
        }
    }

    /// Create a text node carrying `marks`
    pub fn marked_text(text: &str, marks: Vec<Mark>) -> Self {
        Self {
            marks,
            ..Self::text(text)
        }
    }

    /// Create a node with children
    pub fn with_content(type_name: &str, content: Vec<Node>) -> Self {
        Self {
            content,
            ..Self::new(type_name)
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Append a child node
    pub fn add_child(&mut self, child: Node) {
        self.content.push(child);
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    /// The text of a text node, or `""` for any other node
    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    /// A copy of this text node with different text but the same marks
    pub fn with_text(&self, text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..self.clone()
        }
    }

    /// Concatenated text of this node and all descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            child.collect_text(out);
        }
    }

    /// Get a string attribute. Empty strings count as absent.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        attr_str(&self.attrs, name)
    }

    /// Get a boolean attribute
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        self.attrs.get(name).and_then(Value::as_bool)
    }

    /// Get an integer attribute. Floats are truncated, numeric strings parsed.
    pub fn attr_i64(&self, name: &str) -> Option<i64> {
        match self.attrs.get(name)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Visit this node and every descendant, depth-first, parents first
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Depth-first iterator returned by [`Node::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.content.iter().rev());
        Some(node)
    }
}

fn attr_str<'a>(attrs: &'a Attrs, name: &str) -> Option<&'a str> {
    attrs
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
