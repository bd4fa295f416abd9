//! CommonMark rendering of Markdown source into HTML, using comrak.

use comrak::{format_html, parse_document, Arena, Options};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// CommonMark extensions enabled while rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// GitHub Flavored Markdown tables
    pub tables: bool,
    /// `~~text~~` strikethrough
    pub strikethrough: bool,
    /// `>>>` fenced multiline blockquotes
    pub multiline_block_quotes: bool,
    /// Link bare URLs and emails found in text
    pub autolink: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            multiline_block_quotes: true,
            autolink: false,
        }
    }
}

impl MarkdownOptions {
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();

        options.extension.table = self.tables;
        options.extension.strikethrough = self.strikethrough;
        options.extension.multiline_block_quotes = self.multiline_block_quotes;
        options.extension.autolink = self.autolink;

        // Raw HTML passes through; the sanitizer decides what survives
        options.render.unsafe_ = true;

        options
    }
}

/// Render Markdown into an HTML fragment
pub fn render_html(markdown: &str, options: &MarkdownOptions) -> Result<String> {
    let arena = Arena::new();
    let comrak_options = options.to_comrak_options();
    let root = parse_document(&arena, markdown, &comrak_options);

    let mut html = Vec::with_capacity(markdown.len() * 2);
    format_html(root, &comrak_options, &mut html).map_err(|e| Error::MarkdownParse(e.to_string()))?;
    String::from_utf8(html).map_err(|e| Error::MarkdownParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        render_html(markdown, &MarkdownOptions::default()).unwrap()
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            render("**bold** and _em_"),
            "<p><strong>bold</strong> and <em>em</em></p>\n"
        );
    }

    #[test]
    fn test_strikethrough_enabled() {
        assert!(render("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn test_table_enabled() {
        let html = render("| a |\n| --- |\n| 1 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>a</th>"));
    }

    #[test]
    fn test_bare_urls_not_linked_by_default() {
        assert!(!render("see https://x.io").contains("<a"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        assert!(render("a <script>x</script>").contains("<script>"));
    }
}
