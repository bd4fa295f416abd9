//! Tree to Markdown serialization
//!
//! [`MarkdownSerializer`] owns a schema and options and walks a tree with a
//! fresh [`MarkdownWriter`] per call. The built-in node rules live here.

use log::debug;
use regex::Regex;

use crate::escape::{longest_run, quote};
use crate::marks::link_destination;
use crate::model::Node;
use crate::options::{HeadingStyle, Options};
use crate::schema::{NodeGroup, NodeKind, Schema};
use crate::tables::TableMembership;
use crate::writer::MarkdownWriter;
use crate::{Error, Result};

/// Largest ordered-list start number CommonMark accepts
pub const MAX_LIST_START: i64 = 999_999_999;

/// Serializes document trees into Markdown text
#[derive(Debug)]
pub struct MarkdownSerializer {
    schema: Schema,
    options: Options,
    extra_escape: Option<Regex>,
}

impl Default for MarkdownSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownSerializer {
    /// Serializer for the default Markdown schema with default options
    pub fn new() -> Self {
        Self {
            schema: Schema::markdown(),
            options: Options::default(),
            extra_escape: None,
        }
    }

    pub fn with_options(options: Options) -> Result<Self> {
        Self::with_schema(Schema::markdown(), options)
    }

    pub fn with_schema(schema: Schema, options: Options) -> Result<Self> {
        let extra_escape = match &options.escape_extra_characters {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| Error::InvalidOption {
                name: "escape_extra_characters",
                reason: e.to_string(),
            })?),
            None => None,
        };
        Ok(Self {
            schema,
            options,
            extra_escape,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Mutable schema, for registering custom node and mark rules
    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Serialize `root` into Markdown
    pub fn serialize(&self, root: &Node) -> Result<String> {
        let tables = TableMembership::collect(root, &self.schema);
        self.serialize_with(root, &tables)
    }

    /// Serialize `root` using a caller-built table membership
    pub fn serialize_with(&self, root: &Node, tables: &TableMembership<'_>) -> Result<String> {
        let rule = self.schema.node_rule(&root.type_name)?;
        debug!(
            "serializing `{}` root with {} children, {} nodes in tables",
            root.type_name,
            root.child_count(),
            tables.len()
        );

        let mut writer = MarkdownWriter::new(&self.schema, &self.options, tables, self.extra_escape.as_ref());
        if rule.group == NodeGroup::Container {
            writer.render_content(root)?;
        } else {
            writer.render(root, root, 0)?;
        }
        Ok(writer.finish())
    }
}

/// Serialize `root` with the default schema and options
pub fn serialize(root: &Node) -> Result<String> {
    MarkdownSerializer::new().serialize(root)
}

pub(crate) fn render_builtin(
    w: &mut MarkdownWriter<'_>,
    kind: NodeKind,
    node: &Node,
    parent: &Node,
    index: usize,
) -> Result<()> {
    match kind {
        NodeKind::Doc | NodeKind::ListItem => w.render_content(node),
        NodeKind::Paragraph => {
            w.render_inline(node, true)?;
            w.close_block(node);
            Ok(())
        }
        NodeKind::Heading => render_heading(w, node),
        NodeKind::BulletList => {
            let marker = format!("{} ", w.options().bullet_list_marker);
            w.render_list(node, "  ", |_| marker.clone())
        }
        NodeKind::OrderedList => render_ordered_list(w, node),
        NodeKind::HorizontalRule => {
            let options = w.options();
            w.write(&options.hr);
            w.close_block(node);
            Ok(())
        }
        NodeKind::CodeBlock => {
            render_code_block(w, node);
            Ok(())
        }
        NodeKind::Blockquote => render_blockquote(w, node),
        NodeKind::HardBreak => {
            render_hard_break(w, node, parent, index);
            Ok(())
        }
        NodeKind::Image => {
            render_image(w, node);
            Ok(())
        }
        NodeKind::Table => render_table(w, node),
        NodeKind::TableRow | NodeKind::TableHeader | NodeKind::TableCell => w.render_content(node),
        NodeKind::Text => {
            let escape = !w.in_autolink();
            w.text(node.text_str(), escape);
            Ok(())
        }
    }
}

fn render_heading(w: &mut MarkdownWriter<'_>, node: &Node) -> Result<()> {
    let level = heading_level(node);

    match w.options().heading_style {
        HeadingStyle::Setext if level <= 2 && node.child_count() > 0 => {
            w.write("");
            let start = w.output().len();
            w.render_inline(node, true)?;
            let text_len = w.output()[start..].chars().count();
            let underline = if level == 1 { "=" } else { "-" };
            w.ensure_new_line();
            w.write(&underline.repeat(text_len.max(3)));
        }
        _ => {
            w.write(&format!("{} ", "#".repeat(level)));
            w.render_inline(node, false)?;
        }
    }

    w.close_block(node);
    Ok(())
}

fn heading_level(node: &Node) -> usize {
    match node.attr_i64("level") {
        None => 1,
        Some(level @ 1..=6) => level as usize,
        Some(level) => {
            let clamped = level.clamp(1, 6);
            debug!("clamping heading level {level} to {clamped}");
            clamped as usize
        }
    }
}

fn render_ordered_list(w: &mut MarkdownWriter<'_>, node: &Node) -> Result<()> {
    let start = list_start(node);
    let last = start + node.child_count().saturating_sub(1) as u64;
    let width = last.to_string().len();
    let delimiter = if node.attr_bool("parens").unwrap_or(false) {
        ')'
    } else {
        '.'
    };
    let indent = " ".repeat(width + 2);

    w.render_list(node, &indent, |i| {
        format!("{:>width$}{delimiter} ", start + i as u64)
    })
}

fn list_start(node: &Node) -> u64 {
    match node.attr_i64("start") {
        None => 1,
        Some(start @ 0..=MAX_LIST_START) => start as u64,
        Some(start) => {
            let clamped = start.clamp(0, MAX_LIST_START);
            debug!("clamping ordered list start {start} to {clamped}");
            clamped as u64
        }
    }
}

fn render_code_block(w: &mut MarkdownWriter<'_>, node: &Node) {
    let code = node.text_content();
    let fence = "`".repeat(longest_run(&code, '`').max(2) + 1);
    let language = node.attr_str("language").unwrap_or("");

    w.write(&format!("{fence}{language}\n"));
    if !code.is_empty() {
        w.text(&code, false);
        w.ensure_new_line();
    }
    w.write(&fence);
    w.close_block(node);
}

fn render_blockquote(w: &mut MarkdownWriter<'_>, node: &Node) -> Result<()> {
    if !node.attr_bool("multiline").unwrap_or(false) {
        return w.wrap_block("> ", None, node, |w| w.render_content(node));
    }

    w.write(">>>");
    w.ensure_new_line();
    w.render_content(node)?;
    w.flush_close(1);
    w.write(">>>");
    w.close_block(node);
    Ok(())
}

/// A hard break only renders when non-break content follows it
fn render_hard_break(w: &mut MarkdownWriter<'_>, node: &Node, parent: &Node, index: usize) {
    let continues = parent
        .content
        .iter()
        .skip(index + 1)
        .any(|sibling| sibling.type_name != node.type_name);
    if continues {
        let br = if w.is_in_table(parent) { "<br>" } else { "\\\n" };
        w.write(br);
    }
}

fn render_image(w: &mut MarkdownWriter<'_>, node: &Node) {
    let alt = w.esc(node.attr_str("alt").unwrap_or(""), false);
    let src = node
        .attr_str("canonical_src")
        .or_else(|| node.attr_str("src"))
        .unwrap_or("");

    let mut out = format!("![{alt}]({}", link_destination(src));
    if let Some(title) = node.attr_str("title") {
        out.push(' ');
        out.push_str(&quote(title));
    }
    out.push(')');
    w.write(&out);
}

/// GFM pipe table. The first row is the header row.
fn render_table(w: &mut MarkdownWriter<'_>, node: &Node) -> Result<()> {
    let columns = node.content.iter().map(Node::child_count).max().unwrap_or(0);
    if columns == 0 {
        return Ok(());
    }

    for (i, row) in node.content.iter().enumerate() {
        w.write("|");
        for column in 0..columns {
            w.write(" ");
            if let Some(cell) = row.child(column) {
                render_cell(w, cell)?;
            }
            w.write(" |");
        }
        w.ensure_new_line();

        if i == 0 {
            w.write("|");
            for _ in 0..columns {
                w.write(" --- |");
            }
            w.ensure_new_line();
        }
    }

    w.close_block(node);
    Ok(())
}

/// Cell content stays on one line; separate blocks are joined with `<br>`
fn render_cell(w: &mut MarkdownWriter<'_>, cell: &Node) -> Result<()> {
    let schema = w.schema();
    w.with_table_cell(|w| {
        let mut inline_only = true;
        for child in &cell.content {
            if schema.node_rule(&child.type_name)?.group != NodeGroup::Inline {
                inline_only = false;
            }
        }
        if inline_only {
            return w.render_inline(cell, false);
        }

        for (i, block) in cell.content.iter().enumerate() {
            if i > 0 {
                w.write("<br>");
            }
            if schema.node_rule(&block.type_name)?.group == NodeGroup::Textblock {
                w.render_inline(block, false)?;
            } else {
                let text = w.esc(&block.text_content().replace('\n', " "), false);
                w.write(&text);
            }
        }
        Ok(())
    })
}
