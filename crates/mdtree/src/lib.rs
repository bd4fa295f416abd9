//! # mdtree
//!
//! Convert between schema-described document trees and Markdown.
//!
//! Serialization lives in [`mdtree_core`] and is re-exported here. This crate
//! adds the opposite direction:
//!
//! ```text
//! Markdown ──comrak──▶ HTML ──ammonia──▶ safe HTML ──scraper──▶ DOM ──rules──▶ tree
//! ```
//!
//! The sanitizer always runs, so raw HTML in the source never reaches the tree
//! unchecked.
//!
//! ## Example
//!
//! ```rust
//! use mdtree::{MarkdownDeserializer, MarkdownSerializer};
//!
//! let parsed = MarkdownDeserializer::new()
//!     .parse("**bold** and _em_ <script>alert(1)</script>")
//!     .unwrap()
//!     .unwrap();
//!
//! let markdown = MarkdownSerializer::new().serialize(&parsed.document).unwrap();
//! assert_eq!(markdown, "**bold** and _em_");
//! ```

mod deserializer;
pub mod html;
mod markdown;
pub mod node;
mod parser;
mod rules;
mod sanitize;
mod utilities;

pub use deserializer::{deserialize, DeserializeOptions, Deserialized, MarkdownDeserializer};
pub use html::parse_html;
pub use markdown::{render_html, MarkdownOptions};
pub use node::{DomNode, DomNodeType};
pub use parser::{TreeBuilder, UnknownElementPolicy};
pub use rules::{ContentMode, Filter, Rule, Rules, Target};
pub use sanitize::sanitize;
pub use utilities::{clean_attribute, collapse_whitespace};

pub use mdtree_core::{
    schema, serialize, HeadingStyle, Mark, MarkKind, MarkRule, MarkdownSerializer, MarkdownWriter, Node,
    NodeGroup, NodeKind, NodeRule, Options, Schema, TableMembership, TypeCategory,
};

/// Error type for deserialization
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("markdown rendering failed: {0}")]
    MarkdownParse(String),

    #[error("cannot map <{element}> into the schema: {reason}")]
    SchemaParse { element: String, reason: String },

    #[error(transparent)]
    Core(#[from] mdtree_core::Error),

    #[error("tree export failed: {0}")]
    Export(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
