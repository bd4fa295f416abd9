//! Generic HTML DOM used between the HTML parser and the tree builder.
//!
//! Any HTML parser can produce this structure. Comments are kept because the
//! deserializer stores the Markdown source in a trailing comment.

use crate::utilities::is_void;

/// DOM node kinds the tree builder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomNodeType {
    Element,
    Text,
    Comment,
    DocumentFragment,
}

/// A DOM node with lowercase tag names and ordered attributes
#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
    pub node_type: DomNodeType,

    /// Lowercase tag name, or `#text` / `#comment` / `#document-fragment`
    pub node_name: String,

    /// Text of text and comment nodes
    pub node_value: Option<String>,

    pub attributes: Vec<(String, String)>,

    pub children: Vec<DomNode>,
}

impl DomNode {
    pub fn element(tag_name: &str) -> Self {
        Self::element_with_attrs(tag_name, Vec::new())
    }

    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        Self {
            node_type: DomNodeType::Element,
            node_name: tag_name.to_lowercase(),
            node_value: None,
            attributes: attrs
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            children: Vec::new(),
        }
    }

    pub fn text(content: &str) -> Self {
        Self::leaf(DomNodeType::Text, "#text", content)
    }

    pub fn comment(content: &str) -> Self {
        Self::leaf(DomNodeType::Comment, "#comment", content)
    }

    pub fn document_fragment() -> Self {
        Self {
            node_type: DomNodeType::DocumentFragment,
            node_name: "#document-fragment".to_string(),
            node_value: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn leaf(node_type: DomNodeType, name: &str, value: &str) -> Self {
        Self {
            node_type,
            node_name: name.to_string(),
            node_value: Some(value.to_string()),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_element(&self) -> bool {
        self.node_type == DomNodeType::Element
    }

    pub fn is_text(&self) -> bool {
        self.node_type == DomNodeType::Text
    }

    pub fn is_comment(&self) -> bool {
        self.node_type == DomNodeType::Comment
    }

    pub fn tag_name(&self) -> &str {
        &self.node_name
    }

    /// Attribute value by case-insensitive name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn children(&self) -> impl Iterator<Item = &DomNode> {
        self.children.iter()
    }

    pub fn element_children(&self) -> impl Iterator<Item = &DomNode> {
        self.children().filter(|n| n.is_element())
    }

    pub fn add_child(&mut self, child: DomNode) {
        self.children.push(child);
    }

    /// Concatenated text of this node and its descendants. Comments are skipped.
    pub fn text_content(&self) -> String {
        match self.node_type {
            DomNodeType::Text => self.node_value.clone().unwrap_or_default(),
            DomNodeType::Comment => String::new(),
            _ => self.children().map(DomNode::text_content).collect(),
        }
    }

    /// Reconstruct the element as HTML, for diagnostics
    pub fn outer_html(&self) -> String {
        match self.node_type {
            DomNodeType::Text => self.node_value.clone().unwrap_or_default(),
            DomNodeType::Comment => format!("<!--{}-->", self.node_value.as_deref().unwrap_or("")),
            DomNodeType::Element => {
                let tag = self.tag_name();
                let mut open = format!("<{tag}");
                for (name, value) in &self.attributes {
                    if value.is_empty() {
                        open.push_str(&format!(" {name}"));
                    } else {
                        open.push_str(&format!(" {name}=\"{}\"", escape_html_attr(value)));
                    }
                }
                open.push('>');
                if is_void(tag) {
                    open
                } else {
                    format!("{open}{}</{tag}>", self.inner_html())
                }
            }
            DomNodeType::DocumentFragment => self.inner_html(),
        }
    }

    pub fn inner_html(&self) -> String {
        self.children().map(DomNode::outer_html).collect()
    }
}

fn escape_html_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
