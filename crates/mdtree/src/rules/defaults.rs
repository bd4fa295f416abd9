//! Default rules mapping CommonMark/GFM HTML onto the Markdown schema.

use mdtree_core::schema::{
    BLOCKQUOTE, BOLD, BULLET_LIST, CODE, CODE_BLOCK, HARD_BREAK, HEADING, HORIZONTAL_RULE, IMAGE,
    ITALIC, LINK, LIST_ITEM, ORDERED_LIST, PARAGRAPH, STRIKE, TABLE, TABLE_CELL, TABLE_HEADER,
    TABLE_ROW,
};
use mdtree_core::Attrs;
use serde_json::Value;

use super::{Filter, Rule};
use crate::node::DomNode;
use crate::utilities::clean_attribute;

/// Create all default rules
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::node(Filter::tag("p"), PARAGRAPH),
        heading_rule(),
        Rule::node(Filter::tag("blockquote"), BLOCKQUOTE),
        bullet_list_rule(),
        ordered_list_rule(),
        Rule::node(Filter::tag("li"), LIST_ITEM),
        code_block_rule(),
        Rule::node(Filter::tag("hr"), HORIZONTAL_RULE),
        Rule::node(Filter::tag("br"), HARD_BREAK),
        image_rule(),
        Rule::node(Filter::tag("table"), TABLE),
        Rule::transparent(Filter::tags(&["thead", "tbody", "tfoot"])),
        Rule::node(Filter::tag("tr"), TABLE_ROW),
        Rule::node(Filter::tag("th"), TABLE_HEADER),
        Rule::node(Filter::tag("td"), TABLE_CELL),
        Rule::mark(Filter::tags(&["strong", "b"]), BOLD),
        Rule::mark(Filter::tags(&["em", "i"]), ITALIC),
        Rule::mark(Filter::tags(&["del", "s", "strike"]), STRIKE),
        Rule::mark(Filter::tag("code"), CODE),
        link_rule(),
    ]
}

fn heading_rule() -> Rule {
    Rule::node(Filter::tags(&["h1", "h2", "h3", "h4", "h5", "h6"]), HEADING).with_attrs(|node| {
        let level: u64 = node.tag_name()[1..].parse().unwrap_or(1);
        attrs([("level", Value::from(level))])
    })
}

fn bullet_list_rule() -> Rule {
    Rule::node(Filter::tag("ul"), BULLET_LIST).with_attrs(|node| attrs([("tight", Value::from(is_tight(node)))]))
}

fn ordered_list_rule() -> Rule {
    Rule::node(Filter::tag("ol"), ORDERED_LIST).with_attrs(|node| {
        let start = node
            .attr("start")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(1);
        attrs([
            ("start", Value::from(start)),
            ("tight", Value::from(is_tight(node))),
        ])
    })
}

/// Tight lists render their items without `<p>` wrappers
fn is_tight(list: &DomNode) -> bool {
    !list
        .element_children()
        .filter(|li| li.tag_name() == "li")
        .any(|li| li.element_children().any(|c| c.tag_name() == "p"))
}

fn code_block_rule() -> Rule {
    Rule::node(Filter::tag("pre"), CODE_BLOCK)
        .raw_text()
        .with_attrs(|node| {
            let language = node
                .element_children()
                .find(|c| c.tag_name() == "code")
                .and_then(|code| code.attr("class"))
                .and_then(|class| {
                    class
                        .split_whitespace()
                        .find_map(|c| c.strip_prefix("language-"))
                        .map(str::to_string)
                });
            match language {
                Some(language) => attrs([("language", Value::from(language))]),
                None => Attrs::new(),
            }
        })
}

fn image_rule() -> Rule {
    Rule::node(Filter::tag("img"), IMAGE).with_attrs(|node| {
        let mut out = attrs([
            ("src", Value::from(clean_attribute(node.attr("src")).unwrap_or_default())),
            ("alt", Value::from(node.attr("alt").unwrap_or(""))),
        ]);
        if let Some(title) = clean_attribute(node.attr("title")) {
            out.insert("title".to_string(), Value::from(title));
        }
        out
    })
}

fn link_rule() -> Rule {
    Rule::mark(
        Filter::predicate(|tag, node| tag == "a" && node.has_attr("href")),
        LINK,
    )
    .with_attrs(|node| {
        let mut out = attrs([(
            "href",
            Value::from(clean_attribute(node.attr("href")).unwrap_or_default()),
        )]);
        if let Some(title) = clean_attribute(node.attr("title")) {
            out.insert("title".to_string(), Value::from(title));
        }
        out
    })
}

fn attrs<const N: usize>(pairs: [(&str, Value); N]) -> Attrs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
