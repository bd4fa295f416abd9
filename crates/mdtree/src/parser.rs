//! Schema-driven conversion of a DOM fragment into a document tree.
//!
//! Block elements become container, textblock or leaf nodes. Inline content
//! is collected into runs of text nodes carrying the marks of their enclosing
//! mark elements. Inline content that turns up directly in a container is
//! wrapped in an implicit paragraph.

use log::trace;
use mdtree_core::{Mark, Node, NodeGroup, NodeKind, Schema};
use serde::{Deserialize, Serialize};

use crate::node::{DomNode, DomNodeType};
use crate::rules::{ContentMode, Rule, Rules, Target};
use crate::utilities::collapse_whitespace;
use crate::{Error, Result};

/// What happens to elements no parse rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownElementPolicy {
    /// Drop the element itself and parse its children in its place
    #[default]
    Degrade,
    /// Fail the whole parse with [`Error::SchemaParse`]
    Reject,
}

/// Builds a document tree from a DOM fragment
pub struct TreeBuilder<'a> {
    schema: &'a Schema,
    rules: &'a Rules,
    policy: UnknownElementPolicy,
    paragraph: &'a str,
    hard_break: Option<&'a str>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(schema: &'a Schema, rules: &'a Rules, policy: UnknownElementPolicy) -> Result<Self> {
        let paragraph = schema.name_of(NodeKind::Paragraph).ok_or_else(|| Error::SchemaParse {
            element: "p".to_string(),
            reason: "the schema has no paragraph node".to_string(),
        })?;
        Ok(Self {
            schema,
            rules,
            policy,
            paragraph,
            hard_break: schema.name_of(NodeKind::HardBreak),
        })
    }

    /// Build the root node from the children of `fragment`
    pub fn build(&self, fragment: &DomNode) -> Result<Node> {
        let doc = self.schema.name_of(NodeKind::Doc).ok_or_else(|| Error::SchemaParse {
            element: fragment.node_name.clone(),
            reason: "the schema has no doc node".to_string(),
        })?;

        let mut sink = self.sink(false);
        self.walk(fragment, &mut sink, &[])?;
        Ok(Node::with_content(doc, sink.finish_blocks()))
    }

    fn sink(&self, textblock: bool) -> Sink<'a> {
        Sink {
            textblock,
            paragraph: self.paragraph,
            hard_break: self.hard_break,
            blocks: Vec::new(),
            inline: Vec::new(),
        }
    }

    fn walk(&self, parent: &DomNode, sink: &mut Sink<'_>, marks: &[Mark]) -> Result<()> {
        for child in parent.children() {
            match child.node_type {
                DomNodeType::Text => {
                    let text = child.node_value.as_deref().unwrap_or("");
                    sink.push_text(&collapse_whitespace(text), self.schema.sorted_marks(marks));
                }
                DomNodeType::Element => self.walk_element(child, sink, marks)?,
                DomNodeType::Comment | DomNodeType::DocumentFragment => {}
            }
        }
        Ok(())
    }

    fn walk_element(&self, element: &DomNode, sink: &mut Sink<'_>, marks: &[Mark]) -> Result<()> {
        if self.rules.should_ignore(element) {
            trace!("ignoring {}", snippet(element));
            return Ok(());
        }

        let Some(rule) = self.rules.for_element(element) else {
            return match self.policy {
                UnknownElementPolicy::Degrade => {
                    trace!("no rule for {}, parsing its children in place", snippet(element));
                    self.walk(element, sink, marks)
                }
                UnknownElementPolicy::Reject => Err(Error::SchemaParse {
                    element: element.tag_name().to_string(),
                    reason: format!("no parse rule matches {}", snippet(element)),
                }),
            };
        };

        match &rule.target {
            Target::Transparent => self.walk(element, sink, marks),
            Target::Mark(name) => {
                if !self.schema.has_mark(name) {
                    return Err(unknown_target(element, "mark", name));
                }
                let mark = Mark {
                    type_name: name.clone(),
                    attrs: rule.attrs(element),
                };
                let mut inner = marks.to_vec();
                if !mark.is_in_set(&inner) {
                    inner.push(mark);
                }
                self.walk(element, sink, &inner)
            }
            Target::Node(name) => {
                let group = match self.schema.node_rule(name) {
                    Ok(node_rule) => node_rule.group,
                    Err(_) => return Err(unknown_target(element, "node", name)),
                };
                self.build_node(element, rule, name, group, sink, marks)
            }
        }
    }

    fn build_node(
        &self,
        element: &DomNode,
        rule: &Rule,
        name: &str,
        group: NodeGroup,
        sink: &mut Sink<'_>,
        marks: &[Mark],
    ) -> Result<()> {
        let mut node = Node::new(name);
        node.attrs = rule.attrs(element);

        match group {
            NodeGroup::Inline => {
                node.marks = self.schema.sorted_marks(marks);
                sink.push_inline(node);
            }
            NodeGroup::Leaf => sink.push_block(node),
            NodeGroup::Textblock => {
                node.content = match rule.content {
                    ContentMode::RawText => raw_text(element),
                    ContentMode::Parse => {
                        let mut inner = self.sink(true);
                        self.walk(element, &mut inner, &[])?;
                        inner.finish_inline()
                    }
                };
                sink.push_block(node);
            }
            NodeGroup::Container => {
                let mut inner = self.sink(false);
                self.walk(element, &mut inner, &[])?;
                node.content = inner.finish_blocks();
                sink.push_block(node);
            }
        }
        Ok(())
    }
}

fn unknown_target(element: &DomNode, category: &str, name: &str) -> Error {
    Error::SchemaParse {
        element: element.tag_name().to_string(),
        reason: format!("rule targets {category} type `{name}` missing from the schema"),
    }
}

/// Leading part of the element's HTML for log lines and errors
fn snippet(element: &DomNode) -> String {
    const MAX_CHARS: usize = 80;
    let html = element.outer_html();
    match html.char_indices().nth(MAX_CHARS) {
        Some((end, _)) => format!("{}...", &html[..end]),
        None => html,
    }
}

/// Whitespace-preserving content of a code block, minus its final newline
fn raw_text(element: &DomNode) -> Vec<Node> {
    let text = element.text_content();
    let text = text.strip_suffix('\n').unwrap_or(&text);
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(text)]
    }
}

/// Collects the children of the node being built
struct Sink<'a> {
    /// Inside a textblock, where nested blocks are flattened to text
    textblock: bool,
    paragraph: &'a str,
    hard_break: Option<&'a str>,
    blocks: Vec<Node>,
    inline: Vec<Node>,
}

impl<'a> Sink<'a> {
    fn is_break(&self, node: &Node) -> bool {
        self.hard_break == Some(node.type_name.as_str())
    }

    /// Append collapsed text, merging with a preceding run of equal marks
    fn push_text(&mut self, text: &str, marks: Vec<Mark>) {
        let drop_leading = match self.inline.last() {
            None => true,
            Some(last) if last.is_text() => last.text_str().ends_with(' '),
            Some(last) => self.is_break(last),
        };
        let text = if drop_leading { text.trim_start_matches(' ') } else { text };
        if text.is_empty() {
            return;
        }

        if let Some(last) = self.inline.last_mut() {
            if last.is_text() && last.marks == marks {
                let merged = format!("{}{}", last.text_str(), text);
                last.text = Some(merged);
                return;
            }
        }
        self.inline.push(Node::marked_text(text, marks));
    }

    fn push_inline(&mut self, node: Node) {
        self.inline.push(node);
    }

    fn push_block(&mut self, node: Node) {
        if self.textblock {
            trace!("flattening `{}` inside a textblock", node.type_name);
            let text = collapse_whitespace(&node.text_content());
            self.push_text(&text, Vec::new());
            return;
        }
        self.flush_paragraph();
        self.blocks.push(node);
    }

    /// Wrap pending inline content in an implicit paragraph
    fn flush_paragraph(&mut self) {
        let inline = trim_line_ends(std::mem::take(&mut self.inline), self.hard_break);
        if !inline.is_empty() {
            self.blocks.push(Node::with_content(self.paragraph, inline));
        }
    }

    fn finish_inline(self) -> Vec<Node> {
        trim_line_ends(self.inline, self.hard_break)
    }

    fn finish_blocks(mut self) -> Vec<Node> {
        self.flush_paragraph();
        self.blocks
    }
}

/// Drop whitespace before hard breaks and at the end of the run
fn trim_line_ends(mut inline: Vec<Node>, hard_break: Option<&str>) -> Vec<Node> {
    for i in 0..inline.len() {
        let ends_line = match inline.get(i + 1) {
            None => true,
            Some(next) => hard_break == Some(next.type_name.as_str()),
        };
        if ends_line && inline[i].is_text() {
            let trimmed = inline[i].text_str().trim_end_matches(' ').to_string();
            inline[i].text = Some(trimmed);
        }
    }
    inline.retain(|n| !n.is_text() || !n.text_str().is_empty());
    inline
}
