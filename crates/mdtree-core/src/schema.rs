//! Schema: the ordered registry of node and mark rules.
//!
//! Well-known node and mark kinds are closed enums dispatched with `match`;
//! genuinely custom types register a render function or a delimiter resolver.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::marks::{ResolveDelimiter, StaticDelimiters};
use crate::model::{Mark, Node};
use crate::writer::MarkdownWriter;
use crate::{Error, Result, TypeCategory};

pub const DOC: &str = "doc";
pub const PARAGRAPH: &str = "paragraph";
pub const HEADING: &str = "heading";
pub const BULLET_LIST: &str = "bullet_list";
pub const ORDERED_LIST: &str = "ordered_list";
pub const LIST_ITEM: &str = "list_item";
pub const HORIZONTAL_RULE: &str = "horizontal_rule";
pub const CODE_BLOCK: &str = "code_block";
pub const BLOCKQUOTE: &str = "blockquote";
pub const HARD_BREAK: &str = "hard_break";
pub const IMAGE: &str = "image";
pub const TABLE: &str = "table";
pub const TABLE_ROW: &str = "table_row";
pub const TABLE_HEADER: &str = "table_header";
pub const TABLE_CELL: &str = "table_cell";
pub const TEXT: &str = "text";

pub const BOLD: &str = "bold";
pub const ITALIC: &str = "italic";
pub const STRIKE: &str = "strike";
pub const CODE: &str = "code";
pub const LINK: &str = "link";

/// Built-in node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    ListItem,
    HorizontalRule,
    CodeBlock,
    Blockquote,
    HardBreak,
    Image,
    Table,
    TableRow,
    TableHeader,
    TableCell,
    Text,
}

impl NodeKind {
    pub const ALL: [NodeKind; 16] = [
        NodeKind::Doc,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::BulletList,
        NodeKind::OrderedList,
        NodeKind::ListItem,
        NodeKind::HorizontalRule,
        NodeKind::CodeBlock,
        NodeKind::Blockquote,
        NodeKind::HardBreak,
        NodeKind::Image,
        NodeKind::Table,
        NodeKind::TableRow,
        NodeKind::TableHeader,
        NodeKind::TableCell,
        NodeKind::Text,
    ];

    /// Default type name of this kind
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Doc => DOC,
            NodeKind::Paragraph => PARAGRAPH,
            NodeKind::Heading => HEADING,
            NodeKind::BulletList => BULLET_LIST,
            NodeKind::OrderedList => ORDERED_LIST,
            NodeKind::ListItem => LIST_ITEM,
            NodeKind::HorizontalRule => HORIZONTAL_RULE,
            NodeKind::CodeBlock => CODE_BLOCK,
            NodeKind::Blockquote => BLOCKQUOTE,
            NodeKind::HardBreak => HARD_BREAK,
            NodeKind::Image => IMAGE,
            NodeKind::Table => TABLE,
            NodeKind::TableRow => TABLE_ROW,
            NodeKind::TableHeader => TABLE_HEADER,
            NodeKind::TableCell => TABLE_CELL,
            NodeKind::Text => TEXT,
        }
    }

    /// Structural group, used when building trees from HTML
    pub fn group(self) -> NodeGroup {
        match self {
            NodeKind::Paragraph | NodeKind::Heading | NodeKind::CodeBlock => NodeGroup::Textblock,
            NodeKind::HardBreak | NodeKind::Image | NodeKind::Text => NodeGroup::Inline,
            NodeKind::HorizontalRule => NodeGroup::Leaf,
            NodeKind::Doc
            | NodeKind::BulletList
            | NodeKind::OrderedList
            | NodeKind::ListItem
            | NodeKind::Blockquote
            | NodeKind::Table
            | NodeKind::TableRow
            | NodeKind::TableHeader
            | NodeKind::TableCell => NodeGroup::Container,
        }
    }

    pub fn is_table_cell(self) -> bool {
        matches!(self, NodeKind::TableHeader | NodeKind::TableCell)
    }
}

/// Where a node may appear and what it may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGroup {
    /// Block holding other blocks
    Container,
    /// Block holding inline content
    Textblock,
    /// Block without content
    Leaf,
    /// Inline content (text, breaks, images)
    Inline,
}

/// Render function for custom node types.
///
/// Receives the writer, the node, its parent and its index within the parent.
pub type RenderFn = Arc<dyn Fn(&mut MarkdownWriter<'_>, &Node, &Node, usize) -> Result<()> + Send + Sync>;

/// How a node type is rendered
#[derive(Clone)]
pub enum NodeRender {
    /// One of the well-known rules
    Builtin(NodeKind),
    /// A caller-supplied function
    Custom(RenderFn),
}

impl fmt::Debug for NodeRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRender::Builtin(kind) => f.debug_tuple("Builtin").field(kind).finish(),
            NodeRender::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Serialization rule and structural group of one node type
#[derive(Debug, Clone)]
pub struct NodeRule {
    pub render: NodeRender,
    pub group: NodeGroup,
}

impl NodeRule {
    pub fn builtin(kind: NodeKind) -> Self {
        Self {
            render: NodeRender::Builtin(kind),
            group: kind.group(),
        }
    }

    pub fn custom<F>(group: NodeGroup, render: F) -> Self
    where
        F: Fn(&mut MarkdownWriter<'_>, &Node, &Node, usize) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            render: NodeRender::Custom(Arc::new(render)),
            group,
        }
    }

    /// The built-in kind, if this is not a custom rule
    pub fn kind(&self) -> Option<NodeKind> {
        match self.render {
            NodeRender::Builtin(kind) => Some(kind),
            NodeRender::Custom(_) => None,
        }
    }
}

/// Built-in mark kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Strike,
    Link,
    Code,
}

impl MarkKind {
    /// Registration order of the default schema
    pub const ALL: [MarkKind; 5] = [
        MarkKind::Bold,
        MarkKind::Italic,
        MarkKind::Strike,
        MarkKind::Link,
        MarkKind::Code,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkKind::Bold => BOLD,
            MarkKind::Italic => ITALIC,
            MarkKind::Strike => STRIKE,
            MarkKind::Link => LINK,
            MarkKind::Code => CODE,
        }
    }
}

/// Serialization rule of one mark type
#[derive(Clone)]
pub struct MarkRule {
    pub delimiters: Arc<dyn ResolveDelimiter>,
    /// May interleave with other mixable marks without reopening
    pub mixable: bool,
    /// Leading and trailing whitespace is moved outside the delimiters
    pub expel_enclosing_whitespace: bool,
    /// Whether the covered text is escaped
    pub escape: bool,
}

impl MarkRule {
    pub fn builtin(kind: MarkKind) -> Self {
        let emphasis = matches!(kind, MarkKind::Bold | MarkKind::Italic | MarkKind::Strike);
        Self {
            delimiters: Arc::new(kind),
            mixable: emphasis,
            expel_enclosing_whitespace: emphasis,
            escape: kind != MarkKind::Code,
        }
    }

    /// A mark with fixed open and close strings
    pub fn new(open: &str, close: &str) -> Self {
        Self::with_delimiters(StaticDelimiters::new(open, close))
    }

    /// A mark whose delimiters depend on the surrounding siblings
    pub fn with_delimiters(delimiters: impl ResolveDelimiter + 'static) -> Self {
        Self {
            delimiters: Arc::new(delimiters),
            mixable: false,
            expel_enclosing_whitespace: false,
            escape: true,
        }
    }

    pub fn mixable(mut self, mixable: bool) -> Self {
        self.mixable = mixable;
        self
    }

    pub fn expel_enclosing_whitespace(mut self, expel: bool) -> Self {
        self.expel_enclosing_whitespace = expel;
        self
    }

    pub fn escape(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }
}

impl fmt::Debug for MarkRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkRule")
            .field("mixable", &self.mixable)
            .field("expel_enclosing_whitespace", &self.expel_enclosing_whitespace)
            .field("escape", &self.escape)
            .finish_non_exhaustive()
    }
}

/// Result of [`Schema::rule_for`]
#[derive(Debug, Clone, Copy)]
pub enum RuleRef<'a> {
    Node(&'a NodeRule),
    Mark(&'a MarkRule),
}

/// Ordered registry of node and mark rules
#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: IndexMap<String, NodeRule>,
    marks: IndexMap<String, MarkRule>,
}

impl Schema {
    /// An empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// The schema with every built-in node and mark kind under its default name
    pub fn markdown() -> Self {
        let mut schema = Self::new();
        for kind in NodeKind::ALL {
            schema.add_node(kind.name(), NodeRule::builtin(kind));
        }
        for kind in MarkKind::ALL {
            schema.add_mark(kind.name(), MarkRule::builtin(kind));
        }
        schema
    }

    /// Register or replace a node rule
    pub fn add_node(&mut self, name: &str, rule: NodeRule) -> &mut Self {
        self.nodes.insert(name.to_string(), rule);
        self
    }

    /// Register or replace a mark rule. New marks rank after existing ones.
    pub fn add_mark(&mut self, name: &str, rule: MarkRule) -> &mut Self {
        self.marks.insert(name.to_string(), rule);
        self
    }

    /// Remove a node type
    pub fn remove_node(&mut self, name: &str) -> &mut Self {
        self.nodes.shift_remove(name);
        self
    }

    /// Look up a node or mark rule by type name. Node types win on a clash.
    ///
    /// The combined lookup for callers that only hold a type name. Rendering
    /// already knows the category and goes through [`Schema::node_rule`] or
    /// [`Schema::mark_rule`].
    pub fn rule_for(&self, name: &str) -> Result<RuleRef<'_>> {
        if let Some(rule) = self.nodes.get(name) {
            return Ok(RuleRef::Node(rule));
        }
        if let Some(rule) = self.marks.get(name) {
            return Ok(RuleRef::Mark(rule));
        }
        Err(Error::UnknownType {
            category: TypeCategory::Any,
            name: name.to_string(),
        })
    }

    pub fn node_rule(&self, name: &str) -> Result<&NodeRule> {
        self.nodes.get(name).ok_or_else(|| Error::UnknownType {
            category: TypeCategory::Node,
            name: name.to_string(),
        })
    }

    pub fn mark_rule(&self, name: &str) -> Result<&MarkRule> {
        self.marks.get(name).ok_or_else(|| Error::UnknownType {
            category: TypeCategory::Mark,
            name: name.to_string(),
        })
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn has_mark(&self, name: &str) -> bool {
        self.marks.contains_key(name)
    }

    /// Built-in kind registered under `name`, if any
    pub fn node_kind(&self, name: &str) -> Option<NodeKind> {
        self.nodes.get(name).and_then(NodeRule::kind)
    }

    /// First type name registered for a built-in kind
    pub fn name_of(&self, kind: NodeKind) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, rule)| rule.kind() == Some(kind))
            .map(|(name, _)| name.as_str())
    }

    /// Position of a mark type in registration order
    pub fn mark_rank(&self, name: &str) -> Option<usize> {
        self.marks.get_index_of(name)
    }

    /// `marks` in registration order; unknown marks sort last
    pub fn sorted_marks(&self, marks: &[Mark]) -> Vec<Mark> {
        let mut sorted = marks.to_vec();
        sorted.sort_by_key(|m| self.mark_rank(&m.type_name).unwrap_or(usize::MAX));
        sorted
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn mark_names(&self) -> impl Iterator<Item = &str> {
        self.marks.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_schema_has_builtins() {
        let schema = Schema::markdown();
        for kind in NodeKind::ALL {
            assert_eq!(schema.node_kind(kind.name()), Some(kind));
        }
        assert_eq!(
            schema.mark_names().collect::<Vec<_>>(),
            ["bold", "italic", "strike", "link", "code"]
        );
    }

    #[test]
    fn test_unknown_type_lookup() {
        let schema = Schema::markdown();
        let err = schema.node_rule("video").unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownType { category: TypeCategory::Node, ref name } if name == "video"
        ));
        assert!(schema.mark_rule("underline").is_err());
        assert!(schema.rule_for("underline").is_err());
        assert!(matches!(schema.rule_for("bold"), Ok(RuleRef::Mark(_))));
        assert!(matches!(schema.rule_for("paragraph"), Ok(RuleRef::Node(_))));
    }

    #[test]
    fn test_sorted_marks_follow_registration() {
        let schema = Schema::markdown();
        let marks = vec![
            Mark::new("code"),
            Mark::new("mystery"),
            Mark::new("bold"),
            Mark::new("link").with_attr("href", "x"),
        ];
        let names: Vec<String> = schema
            .sorted_marks(&marks)
            .into_iter()
            .map(|m| m.type_name)
            .collect();
        assert_eq!(names, ["bold", "link", "code", "mystery"]);
    }

    #[test]
    fn test_builtin_mark_flags() {
        let bold = MarkRule::builtin(MarkKind::Bold);
        assert!(bold.mixable && bold.expel_enclosing_whitespace && bold.escape);

        let code = MarkRule::builtin(MarkKind::Code);
        assert!(!code.escape && !code.mixable);

        let link = MarkRule::builtin(MarkKind::Link);
        assert!(!link.mixable && link.escape);
    }

    #[test]
    fn test_custom_node_registration() {
        let mut schema = Schema::markdown();
        schema.add_node(
            "mention",
            NodeRule::custom(NodeGroup::Inline, |w, node, _, _| {
                w.write(&format!("@{}", node.attr_str("user").unwrap_or("")));
                Ok(())
            }),
        );
        assert!(schema.has_node("mention"));
        assert_eq!(schema.node_kind("mention"), None);
        assert_eq!(schema.name_of(NodeKind::HardBreak), Some("hard_break"));
    }
}
