//! Serialization writer
//!
//! Accumulates Markdown output while tracking the line prefix of the
//! enclosing blocks, pending block separation, open inline marks, and the
//! tight-list state. Node rules drive it through [`MarkdownWriter::write`],
//! [`MarkdownWriter::text`], [`MarkdownWriter::wrap_block`] and friends.

use regex::Regex;

use crate::escape::{escape, EscapeContext};
use crate::marks::{SiblingContext, Side};
use crate::model::{Mark, Node};
use crate::options::Options;
use crate::schema::{NodeRender, Schema};
use crate::tables::TableMembership;
use crate::Result;

/// Stateful text accumulator used while walking a tree
pub struct MarkdownWriter<'a> {
    schema: &'a Schema,
    options: &'a Options,
    tables: &'a TableMembership<'a>,
    extra_escape: Option<&'a Regex>,
    out: String,
    /// Prefix written at the start of every line
    delim: String,
    /// Type of the last closed block whose separator is still pending
    closed: Option<String>,
    at_block_start: bool,
    in_tight_list: bool,
    in_autolink: bool,
    in_table_cell: bool,
}

/// Marks currently open while rendering one inline run
#[derive(Default)]
struct InlineState {
    active: Vec<Mark>,
    trailing: String,
}

impl<'a> MarkdownWriter<'a> {
    pub fn new(
        schema: &'a Schema,
        options: &'a Options,
        tables: &'a TableMembership<'a>,
        extra_escape: Option<&'a Regex>,
    ) -> Self {
        Self {
            schema,
            options,
            tables,
            extra_escape,
            out: String::with_capacity(4096),
            delim: String::new(),
            closed: None,
            at_block_start: false,
            in_tight_list: false,
            in_autolink: false,
            in_table_cell: false,
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn options(&self) -> &'a Options {
        self.options
    }

    /// Output written so far
    pub fn output(&self) -> &str {
        &self.out
    }

    /// Whether `node` was registered as being inside a table cell
    pub fn is_in_table(&self, node: &Node) -> bool {
        self.tables.contains(node)
    }

    /// Whether text is currently being written inside an autolink
    pub fn in_autolink(&self) -> bool {
        self.in_autolink
    }

    /// Finish the pass, dropping any pending block separator
    pub fn finish(self) -> String {
        let mut out = self.out;
        let trimmed_len = out.trim_end_matches('\n').len();
        out.truncate(trimmed_len);
        if self.options.trailing_newline && !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Emit the separator owed to the last closed block: a newline plus
    /// `size - 1` blank (prefix-only) lines.
    pub fn flush_close(&mut self, size: usize) {
        if self.closed.take().is_some() {
            if !self.at_blank() {
                self.out.push('\n');
            }
            if size > 1 {
                let delim_min = self.delim.trim_end().to_string();
                for _ in 1..size {
                    self.out.push_str(&delim_min);
                    self.out.push('\n');
                }
            }
        }
    }

    /// Append `content` verbatim, after any pending separator and the line prefix
    pub fn write(&mut self, content: &str) {
        self.flush_close(2);
        if !self.delim.is_empty() && self.at_blank() {
            self.out.push_str(&self.delim);
        }
        self.out.push_str(content);
    }

    /// Append text line by line, escaping it when `escape` is set
    pub fn text(&mut self, text: &str, escape: bool) {
        let lines: Vec<&str> = text.split('\n').collect();
        let last = lines.len().saturating_sub(1);

        for (i, line) in lines.iter().enumerate() {
            self.write("");

            // A raw `[` right after `!` would turn a link into an image
            if !escape && line.starts_with('[') && ends_with_unescaped_bang(&self.out) {
                self.out.pop();
                self.out.push_str("\\!");
            }

            if escape {
                let escaped = self.esc(line, self.at_block_start || i > 0);
                self.out.push_str(&escaped);
            } else {
                self.out.push_str(line);
            }

            if i != last {
                self.out.push('\n');
            }
        }
    }

    /// Escape `text` for the current context
    pub fn esc(&self, text: &str, start_of_line: bool) -> String {
        escape(
            text,
            EscapeContext {
                start_of_line,
                in_table: self.in_table_cell,
                extra: self.extra_escape,
            },
        )
    }

    /// Whether the output is empty or ends with a newline
    pub fn at_blank(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    pub fn ensure_new_line(&mut self) {
        if !self.at_blank() {
            self.out.push('\n');
        }
    }

    /// Mark `node` as closed; the separator is written lazily by the next write
    pub fn close_block(&mut self, node: &Node) {
        self.closed = Some(node.type_name.clone());
    }

    /// Render a block with `delim` prefixed to each of its lines. The first
    /// line gets `first_delim` instead when given.
    pub fn wrap_block<F>(&mut self, delim: &str, first_delim: Option<&str>, node: &Node, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let old = self.delim.clone();
        self.write(first_delim.unwrap_or(delim));
        self.delim.push_str(delim);
        let result = f(self);
        self.delim = old;
        result?;
        self.close_block(node);
        Ok(())
    }

    /// Render the items of a list. `marker(i)` is the first-line prefix of
    /// item `i`; continuation lines are indented with `delim`.
    pub fn render_list<F>(&mut self, node: &Node, delim: &str, marker: F) -> Result<()>
    where
        F: Fn(usize) -> String,
    {
        if self.closed.as_deref() == Some(node.type_name.as_str()) {
            self.flush_close(3);
        } else if self.in_tight_list {
            self.flush_close(1);
        }

        let is_tight = node.attr_bool("tight").unwrap_or(self.options.tight_lists);
        let prev_tight = std::mem::replace(&mut self.in_tight_list, is_tight);

        for (i, child) in node.content.iter().enumerate() {
            if i > 0 && is_tight {
                self.flush_close(1);
            }
            let first = marker(i);
            self.wrap_block(delim, Some(&first), node, |w| w.render(child, node, i))?;
        }

        self.in_tight_list = prev_tight;
        Ok(())
    }

    /// Render one node through its schema rule
    pub fn render(&mut self, node: &Node, parent: &Node, index: usize) -> Result<()> {
        let schema = self.schema;
        match &schema.node_rule(&node.type_name)?.render {
            NodeRender::Builtin(kind) => crate::serialize::render_builtin(self, *kind, node, parent, index),
            NodeRender::Custom(render) => render(self, node, parent, index),
        }
    }

    /// Render every child of `parent` as a block
    pub fn render_content(&mut self, parent: &Node) -> Result<()> {
        for (index, child) in parent.content.iter().enumerate() {
            self.render(child, parent, index)?;
        }
        Ok(())
    }

    /// Render the inline children of `parent`, opening and closing marks
    /// around runs of text that share them
    pub fn render_inline(&mut self, parent: &Node, from_block_start: bool) -> Result<()> {
        self.at_block_start = from_block_start;
        let mut state = InlineState::default();
        for index in 0..=parent.child_count() {
            self.progress(parent, index, &mut state)?;
        }
        self.at_block_start = false;
        Ok(())
    }

    /// Run `f` with table-cell escaping enabled
    pub(crate) fn with_table_cell<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let prev = std::mem::replace(&mut self.in_table_cell, true);
        let result = f(self);
        self.in_table_cell = prev;
        result
    }

    /// Process inline child `index`, or close everything when `index` is one
    /// past the last child
    fn progress(&mut self, parent: &Node, index: usize, state: &mut InlineState) -> Result<()> {
        let schema = self.schema;
        let original = parent.child(index);
        let mut node = original;
        let mut marks = original
            .map(|n| schema.sorted_marks(&n.marks))
            .unwrap_or_default();
        for mark in &marks {
            schema.mark_rule(&mark.type_name)?;
        }

        // Marks ending right after a hard break would close on the next line
        if original.is_some_and(|n| n.type_name == self.options.hard_break_node_name) {
            let next = parent.child(index + 1);
            marks.retain(|m| {
                next.is_some_and(|next| {
                    m.is_in_set(&next.marks)
                        && (!next.is_text() || next.text_str().chars().any(|c| !c.is_whitespace()))
                })
            });
        }

        let mut leading = std::mem::take(&mut state.trailing);
        let mut text = node.filter(|n| n.is_text()).map(|n| n.text_str().to_owned());

        if let Some((lead, rest)) = text.as_deref().map(split_leading) {
            if !lead.is_empty() && self.any_expelling(&marks, |m| !m.is_in_set(&state.active))? {
                leading.push_str(&lead);
                if rest.is_empty() {
                    node = None;
                    text = None;
                    marks = state.active.clone();
                } else {
                    text = Some(rest);
                }
            }
        }

        if let Some((rest, trail)) = text.as_deref().map(split_trailing) {
            let next_marks = parent.child(index + 1).map(|n| n.marks.as_slice());
            let expels = self.any_expelling(&marks, |m| next_marks.map_or(true, |next| !m.is_in_set(next)))?;
            if !trail.is_empty() && expels {
                state.trailing = trail;
                if rest.is_empty() {
                    node = None;
                    text = None;
                    marks = state.active.clone();
                } else {
                    text = Some(rest);
                }
            }
        }

        let inner = marks.last().cloned();
        let no_escape = match &inner {
            Some(mark) => !schema.mark_rule(&mark.type_name)?.escape,
            None => false,
        };
        let len = marks.len() - usize::from(no_escape);

        reorder_mixable(schema, &mut marks, &state.active, len)?;

        // Keep the prefix of open marks that is unchanged
        let mut keep = 0;
        while keep < state.active.len().min(len) && marks[keep] == state.active[keep] {
            keep += 1;
        }

        while keep < state.active.len() {
            if let Some(mark) = state.active.pop() {
                let close = self.mark_string(&mark, Side::Close, parent, index)?;
                self.text(&close, false);
            }
        }

        // Whitespace expelled from the previous run goes outside its marks
        if !leading.is_empty() {
            self.text(&leading, true);
        }

        if let Some(n) = node {
            while state.active.len() < len {
                let add = marks[state.active.len()].clone();
                let open = self.mark_string(&add, Side::Open, parent, index)?;
                state.active.push(add);
                self.text(&open, false);
                self.at_block_start = false;
            }

            let trimmed;
            let rendered = match &text {
                Some(t) if t != n.text_str() => {
                    trimmed = n.with_text(t);
                    &trimmed
                }
                _ => n,
            };

            match inner.as_ref().filter(|_| no_escape && rendered.is_text()) {
                Some(inner) => {
                    let mut raw = self.mark_string(inner, Side::Open, parent, index)?;
                    if self.in_table_cell {
                        // GFM strips the backslash again inside table code spans
                        raw.push_str(&rendered.text_str().replace('|', "\\|"));
                    } else {
                        raw.push_str(rendered.text_str());
                    }
                    raw.push_str(&self.mark_string(inner, Side::Close, parent, index + 1)?);
                    self.text(&raw, false);
                }
                None => self.render(rendered, parent, index)?,
            }
            self.at_block_start = false;
        }

        Ok(())
    }

    fn any_expelling<P>(&self, marks: &[Mark], pred: P) -> Result<bool>
    where
        P: Fn(&Mark) -> bool,
    {
        for mark in marks {
            if self.schema.mark_rule(&mark.type_name)?.expel_enclosing_whitespace && pred(mark) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn mark_string(&mut self, mark: &Mark, side: Side, parent: &Node, index: usize) -> Result<String> {
        let schema = self.schema;
        let rule = schema.mark_rule(&mark.type_name)?;
        let cx = SiblingContext {
            schema,
            mark,
            parent,
            index,
            side,
        };
        let delimiter = rule.delimiters.resolve_delimiter(&cx);
        if rule.delimiters.is_autolink(&cx) {
            self.in_autolink = side == Side::Open;
        }
        Ok(delimiter)
    }
}

/// Move mixable marks so their order matches the already open marks, which
/// lets `**a _b** c_` style overlaps continue without reopening.
fn reorder_mixable(schema: &Schema, marks: &mut Vec<Mark>, active: &[Mark], len: usize) -> Result<()> {
    'outer: for i in 0..len {
        let mark = marks[i].clone();
        if !schema.mark_rule(&mark.type_name)?.mixable {
            break;
        }
        for (j, other) in active.iter().enumerate() {
            if !schema.mark_rule(&other.type_name)?.mixable {
                break;
            }
            if mark != *other {
                continue;
            }
            if i > j {
                let mut reordered = marks[..j].to_vec();
                reordered.push(mark);
                reordered.extend_from_slice(&marks[j..i]);
                reordered.extend_from_slice(&marks[i + 1..len]);
                *marks = reordered;
            } else if j > i {
                let end = j.min(len);
                let mut reordered = marks[..i].to_vec();
                reordered.extend_from_slice(&marks[i + 1..end]);
                reordered.push(mark);
                reordered.extend_from_slice(&marks[end..len]);
                *marks = reordered;
            }
            continue 'outer;
        }
    }
    Ok(())
}

fn split_leading(text: &str) -> (String, String) {
    let rest = text.trim_start();
    let lead = &text[..text.len() - rest.len()];
    (lead.to_owned(), rest.to_owned())
}

fn split_trailing(text: &str) -> (String, String) {
    let rest = text.trim_end();
    (rest.to_owned(), text[rest.len()..].to_owned())
}

fn ends_with_unescaped_bang(out: &str) -> bool {
    let mut rev = out.chars().rev();
    rev.next() == Some('!') && rev.next() != Some('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_writer<F>(f: F) -> String
    where
        F: FnOnce(&mut MarkdownWriter<'_>),
    {
        let schema = Schema::markdown();
        let options = Options::default();
        let tables = TableMembership::new();
        let mut writer = MarkdownWriter::new(&schema, &options, &tables, None);
        f(&mut writer);
        writer.finish()
    }

    #[test]
    fn test_closed_blocks_get_blank_line() {
        let paragraph = Node::new("paragraph");
        let out = with_writer(|w| {
            w.write("one");
            w.close_block(&paragraph);
            w.write("two");
            w.close_block(&paragraph);
        });
        assert_eq!(out, "one\n\ntwo");
    }

    #[test]
    fn test_ensure_new_line_is_idempotent() {
        let out = with_writer(|w| {
            w.write("a");
            w.ensure_new_line();
            w.ensure_new_line();
            w.write("b");
        });
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn test_wrap_block_prefixes_every_line() {
        let quote = Node::new("blockquote");
        let out = with_writer(|w| {
            w.wrap_block("> ", None, &quote, |w| {
                w.text("first\nsecond", false);
                Ok(())
            })
            .unwrap();
        });
        assert_eq!(out, "> first\n> second");
    }

    #[test]
    fn test_text_escapes_at_block_start_only_when_asked() {
        let out = with_writer(|w| {
            w.text("# tag *x*", true);
        });
        assert_eq!(out, "# tag \\*x\\*");
    }

    #[test]
    fn test_bang_before_raw_bracket() {
        let out = with_writer(|w| {
            w.text("wow!", true);
            w.text("[", false);
        });
        assert_eq!(out, "wow\\![");
    }

    #[test]
    fn test_finish_trailing_newline_option() {
        let schema = Schema::markdown();
        let options = Options {
            trailing_newline: true,
            ..Options::default()
        };
        let tables = TableMembership::new();
        let mut writer = MarkdownWriter::new(&schema, &options, &tables, None);
        writer.write("text\n\n\n");
        assert_eq!(writer.finish(), "text\n");
    }

    #[test]
    fn test_reorder_mixable_matches_active() {
        let schema = Schema::markdown();
        let bold = Mark::new("bold");
        let italic = Mark::new("italic");
        let mut marks = vec![bold.clone(), italic.clone()];
        reorder_mixable(&schema, &mut marks, &[italic.clone()], 2).unwrap();
        assert_eq!(marks, vec![italic, bold]);
    }

    #[test]
    fn test_split_whitespace() {
        assert_eq!(split_leading("  a b "), ("  ".to_string(), "a b ".to_string()));
        assert_eq!(split_trailing("  a b "), ("  a b".to_string(), " ".to_string()));
        assert_eq!(split_leading("   "), ("   ".to_string(), String::new()));
    }
}
