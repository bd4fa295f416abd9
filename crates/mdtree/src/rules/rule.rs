//! Rule and Filter types for DOM to tree conversion.

use mdtree_core::Attrs;

use crate::node::DomNode;

/// Type alias for attribute extraction functions
pub type AttrsFn = Box<dyn Fn(&DomNode) -> Attrs + Send + Sync>;

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate over the lowercase tag and the element
    Predicate(Box<dyn Fn(&str, &DomNode) -> bool + Send + Sync>),
}

impl Filter {
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &DomNode) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    pub fn matches(&self, element: &DomNode) -> bool {
        let tag = element.tag_name();
        match self {
            Filter::TagName(t) => tag == t,
            Filter::TagNames(tags) => tags.iter().any(|t| t == tag),
            Filter::Predicate(f) => f(tag, element),
        }
    }
}

/// What a matched element becomes in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A node of the named schema type
    Node(String),
    /// A mark of the named schema type on all inline content inside
    Mark(String),
    /// No node of its own; children are parsed in place
    Transparent,
}

/// How the content of a matched node element is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Parse child elements with the rule table
    #[default]
    Parse,
    /// Take the element's raw text, whitespace preserved, as one text node
    RawText,
}

/// A rule maps matched HTML elements to a node or mark type
pub struct Rule {
    pub filter: Filter,
    pub target: Target,
    pub content: ContentMode,
    attrs: Option<AttrsFn>,
}

impl Rule {
    pub fn node(filter: Filter, type_name: &str) -> Self {
        Self::new(filter, Target::Node(type_name.to_string()))
    }

    pub fn mark(filter: Filter, type_name: &str) -> Self {
        Self::new(filter, Target::Mark(type_name.to_string()))
    }

    pub fn transparent(filter: Filter) -> Self {
        Self::new(filter, Target::Transparent)
    }

    fn new(filter: Filter, target: Target) -> Self {
        Self {
            filter,
            target,
            content: ContentMode::Parse,
            attrs: None,
        }
    }

    /// Read node or mark attributes from the element
    pub fn with_attrs<F>(mut self, attrs: F) -> Self
    where
        F: Fn(&DomNode) -> Attrs + Send + Sync + 'static,
    {
        self.attrs = Some(Box::new(attrs));
        self
    }

    pub fn raw_text(mut self) -> Self {
        self.content = ContentMode::RawText;
        self
    }

    pub fn attrs(&self, element: &DomNode) -> Attrs {
        self.attrs.as_ref().map(|f| f(element)).unwrap_or_default()
    }
}
