//! mdtree-core - document tree model and Markdown serialization
//!
//! This crate provides the schema-described document tree and the
//! serializer that turns it into Markdown. The `mdtree` crate builds on it to
//! parse Markdown back into trees.
//!
//! # Architecture
//!
//! ```text
//!               ┌────────┐   ┌────────────────┐
//! Node tree ──▶ │ Schema │──▶│ MarkdownWriter │ ──▶ Markdown String
//!               └────────┘   └────────────────┘
//!             node + mark rules   prefixes, marks, escaping
//! ```
//!
//! # Example
//!
//! ```rust
//! use mdtree_core::{serialize, Mark, Node};
//!
//! let doc = Node::with_content(
//!     "doc",
//!     vec![
//!         Node::with_content("heading", vec![Node::text("Hello World")]).with_attr("level", 1),
//!         Node::with_content(
//!             "paragraph",
//!             vec![
//!                 Node::text("This is "),
//!                 Node::marked_text("bold", vec![Mark::new("bold")]),
//!                 Node::text(" text."),
//!             ],
//!         ),
//!     ],
//! );
//!
//! let markdown = serialize(&doc).unwrap();
//! assert_eq!(markdown, "# Hello World\n\nThis is **bold** text.");
//! ```

use std::fmt;

mod escape;
mod marks;
mod model;
mod options;
pub mod schema;
mod serialize;
mod tables;
mod writer;

pub use escape::{escape, quote, EscapeContext};
pub use marks::{is_plain_url, link_destination, ResolveDelimiter, Side, SiblingContext, StaticDelimiters};
pub use model::{Attrs, Descendants, Mark, Node};
pub use options::{HeadingStyle, Options};
pub use schema::{MarkKind, MarkRule, NodeGroup, NodeKind, NodeRender, NodeRule, RenderFn, RuleRef, Schema};
pub use serialize::{serialize, MarkdownSerializer, MAX_LIST_START};
pub use tables::TableMembership;
pub use writer::MarkdownWriter;

/// Which registry a type name was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Node,
    Mark,
    Any,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCategory::Node => f.write_str("node"),
            TypeCategory::Mark => f.write_str("mark"),
            TypeCategory::Any => f.write_str("node or mark"),
        }
    }
}

/// Error type for serialization
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown {category} type `{name}`")]
    UnknownType { category: TypeCategory, name: String },

    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
