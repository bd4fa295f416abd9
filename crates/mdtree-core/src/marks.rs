//! Mark delimiter resolution.
//!
//! Some delimiters depend on where the mark sits among its siblings: a link
//! renders as `<href>` only when it covers exactly its own URL, and inline
//! code sizes its back-tick fence to the covered text. Resolution therefore
//! receives a [`SiblingContext`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::escape::{longest_run, quote};
use crate::model::{Mark, Node};
use crate::schema::{MarkKind, Schema};

static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Which delimiter is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Opening delimiter; `index` is the first node of the marked run
    Open,
    /// Closing delimiter; `index` is the node just after the marked run
    Close,
}

/// Position of a mark occurrence among its siblings
#[derive(Debug, Clone, Copy)]
pub struct SiblingContext<'a> {
    pub schema: &'a Schema,
    pub mark: &'a Mark,
    pub parent: &'a Node,
    pub index: usize,
    pub side: Side,
}

impl<'a> SiblingContext<'a> {
    /// The node the delimiter is attached to: the run's first node when
    /// opening, its last node when closing
    pub fn content(&self) -> Option<&'a Node> {
        match self.side {
            Side::Open => self.parent.child(self.index),
            Side::Close => self.index.checked_sub(1).and_then(|i| self.parent.child(i)),
        }
    }

    /// The sibling just outside the run on this side
    pub fn outside(&self) -> Option<&'a Node> {
        match self.side {
            Side::Open => self.index.checked_add(1).and_then(|i| self.parent.child(i)),
            Side::Close => self.index.checked_sub(2).and_then(|i| self.parent.child(i)),
        }
    }
}

/// Resolves the open or close string of a mark
pub trait ResolveDelimiter: Send + Sync {
    fn resolve_delimiter(&self, cx: &SiblingContext<'_>) -> String;

    /// Whether this occurrence renders as an autolink, whose text must not be escaped
    fn is_autolink(&self, _cx: &SiblingContext<'_>) -> bool {
        false
    }
}

/// Fixed open and close strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDelimiters {
    pub open: String,
    pub close: String,
}

impl StaticDelimiters {
    pub fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

impl ResolveDelimiter for StaticDelimiters {
    fn resolve_delimiter(&self, cx: &SiblingContext<'_>) -> String {
        match cx.side {
            Side::Open => self.open.clone(),
            Side::Close => self.close.clone(),
        }
    }
}

impl ResolveDelimiter for MarkKind {
    fn resolve_delimiter(&self, cx: &SiblingContext<'_>) -> String {
        match self {
            MarkKind::Bold => "**".to_string(),
            MarkKind::Italic => "_".to_string(),
            MarkKind::Strike => "~~".to_string(),
            MarkKind::Code => backticks_for(cx.content(), cx.side),
            MarkKind::Link => match cx.side {
                Side::Open if is_plain_url(cx) => "<".to_string(),
                Side::Open => "[".to_string(),
                Side::Close if is_plain_url(cx) => ">".to_string(),
                Side::Close => link_target(cx.mark),
            },
        }
    }

    fn is_autolink(&self, cx: &SiblingContext<'_>) -> bool {
        *self == MarkKind::Link && is_plain_url(cx)
    }
}

/// Whether a link occurrence can be written as `<href>`.
///
/// True when the link has no title, its href has a URL scheme and no
/// characters an autolink cannot carry, the covered text equals the href, the
/// link is the innermost mark of that text, and the sibling outside the run on
/// `cx.side` does not continue the link.
pub fn is_plain_url(cx: &SiblingContext<'_>) -> bool {
    let link = cx.mark;
    let Some(href) = link.attr_str("href") else {
        return false;
    };
    if link.attr_str("title").is_some() || !URL_SCHEME.is_match(href) {
        return false;
    }
    if href.chars().any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>') {
        return false;
    }

    let Some(content) = cx.content() else {
        return false;
    };
    if !content.is_text() || content.text_str() != href {
        return false;
    }
    if cx.schema.sorted_marks(&content.marks).last() != Some(link) {
        return false;
    }

    match cx.outside() {
        None => true,
        Some(next) => !link.is_in_set(&next.marks),
    }
}

/// `](destination "title")` for a link mark. `canonical_src` wins over `href`.
fn link_target(mark: &Mark) -> String {
    let href = mark
        .attr_str("canonical_src")
        .or_else(|| mark.attr_str("href"))
        .unwrap_or("");

    let mut out = String::from("](");
    out.push_str(&link_destination(href));
    if let Some(title) = mark.attr_str("title") {
        out.push(' ');
        out.push_str(&quote(title));
    }
    out.push(')');
    out
}

/// Escape a link destination, switching to `<...>` form when it holds
/// whitespace or is empty
pub fn link_destination(href: &str) -> String {
    if href.is_empty() || href.chars().any(char::is_whitespace) {
        let inner = href.replace('<', "\\<").replace('>', "\\>");
        return format!("<{inner}>");
    }

    let mut out = String::with_capacity(href.len());
    for c in href.chars() {
        if matches!(c, '(' | ')' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Back-tick delimiter for inline code, one longer than the longest run
/// inside the text and padded with a space when the text has back-ticks
fn backticks_for(node: Option<&Node>, side: Side) -> String {
    let len = node
        .filter(|n| n.is_text())
        .map(|n| longest_run(n.text_str(), '`'))
        .unwrap_or(0);

    let mut result = String::with_capacity(len + 2);
    if len > 0 && side == Side::Close {
        result.push(' ');
    }
    result.push_str(&"`".repeat(len + 1));
    if len > 0 && side == Side::Open {
        result.push(' ');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: &str) -> Mark {
        Mark::new("link").with_attr("href", href)
    }

    fn resolve(schema: &Schema, kind: MarkKind, mark: &Mark, parent: &Node, index: usize, side: Side) -> String {
        kind.resolve_delimiter(&SiblingContext {
            schema,
            mark,
            parent,
            index,
            side,
        })
    }

    #[test]
    fn test_plain_url_both_sides() {
        let schema = Schema::markdown();
        let mark = link("https://x.io");
        let p = Node::with_content(
            "paragraph",
            vec![
                Node::text("see "),
                Node::marked_text("https://x.io", vec![mark.clone()]),
                Node::text(" now"),
            ],
        );
        assert_eq!(resolve(&schema, MarkKind::Link, &mark, &p, 1, Side::Open), "<");
        assert_eq!(resolve(&schema, MarkKind::Link, &mark, &p, 2, Side::Close), ">");
    }

    #[test]
    fn test_titled_link_is_not_plain() {
        let schema = Schema::markdown();
        let mark = link("https://x.io").with_attr("title", "title");
        let p = Node::with_content(
            "paragraph",
            vec![Node::marked_text("https://x.io", vec![mark.clone()])],
        );
        assert_eq!(resolve(&schema, MarkKind::Link, &mark, &p, 0, Side::Open), "[");
        assert_eq!(
            resolve(&schema, MarkKind::Link, &mark, &p, 1, Side::Close),
            "](https://x.io \"title\")"
        );
    }

    #[test]
    fn test_href_with_space_is_not_plain() {
        let schema = Schema::markdown();
        let mark = link("https://x.io/a b");
        let p = Node::with_content(
            "paragraph",
            vec![Node::marked_text("https://x.io/a b", vec![mark.clone()])],
        );
        assert_eq!(resolve(&schema, MarkKind::Link, &mark, &p, 0, Side::Open), "[");
        assert_eq!(
            resolve(&schema, MarkKind::Link, &mark, &p, 1, Side::Close),
            "](<https://x.io/a b>)"
        );

        let angled = link("https://x.io/<a>");
        let p = Node::with_content(
            "paragraph",
            vec![Node::marked_text("https://x.io/<a>", vec![angled.clone()])],
        );
        assert_eq!(resolve(&schema, MarkKind::Link, &angled, &p, 0, Side::Open), "[");
    }

    #[test]
    fn test_link_spanning_siblings_is_not_plain() {
        let schema = Schema::markdown();
        let mark = link("https://x.io");
        let p = Node::with_content(
            "paragraph",
            vec![
                Node::marked_text("https://x.io", vec![mark.clone()]),
                Node::marked_text(" docs", vec![mark.clone()]),
            ],
        );
        assert_eq!(resolve(&schema, MarkKind::Link, &mark, &p, 0, Side::Open), "[");
    }

    #[test]
    fn test_text_must_equal_href() {
        let schema = Schema::markdown();
        let mark = link("https://x.io");
        let p = Node::with_content("paragraph", vec![Node::marked_text("site", vec![mark.clone()])]);
        assert_eq!(resolve(&schema, MarkKind::Link, &mark, &p, 0, Side::Open), "[");
        assert_eq!(
            resolve(&schema, MarkKind::Link, &mark, &p, 1, Side::Close),
            "](https://x.io)"
        );
    }

    #[test]
    fn test_canonical_src_preferred_on_close() {
        let schema = Schema::markdown();
        let mark = link("/uploads/abc/file.png").with_attr("canonical_src", "file.png");
        let p = Node::with_content("paragraph", vec![Node::marked_text("file", vec![mark.clone()])]);
        assert_eq!(
            resolve(&schema, MarkKind::Link, &mark, &p, 1, Side::Close),
            "](file.png)"
        );
    }

    #[test]
    fn test_link_destination_escaping() {
        assert_eq!(link_destination("https://x.io/a_(b)"), "https://x.io/a_\\(b\\)");
        assert_eq!(link_destination("my file.md"), "<my file.md>");
        assert_eq!(link_destination(""), "<>");
    }

    #[test]
    fn test_code_backticks_grow_with_content() {
        let schema = Schema::markdown();
        let mark = Mark::new("code");
        let plain = Node::with_content("paragraph", vec![Node::marked_text("x", vec![mark.clone()])]);
        assert_eq!(resolve(&schema, MarkKind::Code, &mark, &plain, 0, Side::Open), "`");

        let ticks = Node::with_content("paragraph", vec![Node::marked_text("a``b", vec![mark.clone()])]);
        assert_eq!(resolve(&schema, MarkKind::Code, &mark, &ticks, 0, Side::Open), "``` ");
        assert_eq!(resolve(&schema, MarkKind::Code, &mark, &ticks, 1, Side::Close), " ```");
    }

    #[test]
    fn test_static_delimiters() {
        let schema = Schema::markdown();
        let mark = Mark::new("underline");
        let p = Node::new("paragraph");
        let d = StaticDelimiters::new("<u>", "</u>");
        let cx = |side| SiblingContext {
            schema: &schema,
            mark: &mark,
            parent: &p,
            index: 0,
            side,
        };
        assert_eq!(d.resolve_delimiter(&cx(Side::Open)), "<u>");
        assert_eq!(d.resolve_delimiter(&cx(Side::Close)), "</u>");
        assert!(!d.is_autolink(&cx(Side::Open)));
    }
}
