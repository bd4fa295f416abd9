//! Configuration options for Markdown serialization

use serde::{Deserialize, Serialize};

/// Heading style options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    /// Use ATX-style headings (prefixed with #)
    #[default]
    Atx,
    /// Use setext-style headings (underlined with = or -)
    /// Only works for h1 and h2, falls back to ATX for h3-h6
    Setext,
}

/// Options for Markdown serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Heading style (atx or setext)
    pub heading_style: HeadingStyle,

    /// Horizontal rule string
    pub hr: String,

    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Do not force a blank line between list items.
    /// A list's own `tight` attribute takes precedence.
    pub tight_lists: bool,

    /// Type name of the node treated as a hard line break
    pub hard_break_node_name: String,

    /// Regex of additional characters to backslash-escape in text
    pub escape_extra_characters: Option<String>,

    /// End the output with exactly one newline
    pub trailing_newline: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::Atx,
            hr: "---".to_string(),
            bullet_list_marker: '-',
            tight_lists: true,
            hard_break_node_name: crate::schema::HARD_BREAK.to_string(),
            escape_extra_characters: None,
            trailing_newline: false,
        }
    }
}
