//! HTML fragment parsing.
//!
//! Parses an HTML string with scraper (html5ever) and converts it into the
//! [`DomNode`] structure used by the tree builder.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::DomNode;

/// Parse an HTML fragment into a document-fragment [`DomNode`].
///
/// # Example
///
/// ```rust
/// use mdtree::parse_html;
///
/// let fragment = parse_html("<h1>Hello <em>World</em></h1><!-- note -->");
/// assert_eq!(fragment.children.len(), 2);
/// assert_eq!(fragment.children[0].tag_name(), "h1");
/// assert!(fragment.children[1].is_comment());
/// ```
pub fn parse_html(html: &str) -> DomNode {
    let document = Html::parse_fragment(html);
    let mut fragment = DomNode::document_fragment();
    // parse_fragment wraps the content in a synthetic <html> element
    append_children(document.root_element(), &mut fragment);
    fragment
}

fn append_children(element: ElementRef, parent: &mut DomNode) {
    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => parent.add_child(DomNode::text(&text.text)),
            ScraperNode::Comment(comment) => parent.add_child(DomNode::comment(&comment.comment)),
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    parent.add_child(scraper_to_node(child_element));
                }
            }
            _ => {}
        }
    }
}

fn scraper_to_node(element: ElementRef) -> DomNode {
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    let mut node = DomNode::element_with_attrs(element.value().name(), attrs);
    append_children(element, &mut node);
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_html() {
        let fragment = parse_html("<p>Hello World</p>");
        assert!(!fragment.is_element());
        assert_eq!(fragment.children.len(), 1);
        assert_eq!(fragment.children[0].tag_name(), "p");
        assert_eq!(fragment.text_content(), "Hello World");
    }

    #[test]
    fn test_attributes_kept() {
        let fragment = parse_html(r#"<ol start="3"><li>x</li></ol>"#);
        let ol = &fragment.children[0];
        assert_eq!(ol.attr("start"), Some("3"));
        assert_eq!(ol.element_children().count(), 1);
    }

    #[test]
    fn test_comments_kept() {
        let fragment = parse_html("<p>a</p><!--source-->");
        let last = fragment.children.last().unwrap();
        assert!(last.is_comment());
        assert_eq!(last.node_value.as_deref(), Some("source"));
    }
}
