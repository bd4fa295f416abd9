//! MarkdownDeserializer - the main entry point for Markdown to tree conversion.

use log::debug;
use mdtree_core::{MarkdownSerializer, Node, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::html::parse_html;
use crate::markdown::{render_html, MarkdownOptions};
use crate::node::DomNode;
use crate::parser::{TreeBuilder, UnknownElementPolicy};
use crate::rules::{Filter, Rule, Rules};
use crate::sanitize::sanitize;
use crate::Result;

/// Options for MarkdownDeserializer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeserializeOptions {
    /// CommonMark extensions used to render the source
    pub markdown: MarkdownOptions,

    /// Handling of HTML elements no parse rule matches
    pub unknown_elements: UnknownElementPolicy,
}

/// A parsed document together with the Markdown it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Deserialized {
    pub document: Node,
    /// The unsanitized source, read back from the marker comment
    pub source: Option<String>,
}

impl Deserialized {
    /// Canonical JSON export of the document
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.document)?)
    }

    /// Serialize the document back into Markdown
    pub fn to_markdown(&self, serializer: &MarkdownSerializer) -> Result<String> {
        Ok(serializer.serialize(&self.document)?)
    }
}

/// Converts Markdown text into document trees
pub struct MarkdownDeserializer {
    schema: Schema,
    options: DeserializeOptions,
    rules: Rules,
}

impl MarkdownDeserializer {
    /// Deserializer for the default Markdown schema with default options
    pub fn new() -> Self {
        Self::with_schema(Schema::markdown(), DeserializeOptions::default())
    }

    pub fn with_options(options: DeserializeOptions) -> Self {
        Self::with_schema(Schema::markdown(), options)
    }

    pub fn with_schema(schema: Schema, options: DeserializeOptions) -> Self {
        Self {
            schema,
            options,
            rules: Rules::new(),
        }
    }

    /// Add a custom parse rule, checked before the defaults
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Drop elements matching the filter together with their content
    pub fn ignore(&mut self, filter: Filter) -> &mut Self {
        self.rules.ignore(filter);
        self
    }

    /// Apply a plugin
    pub fn use_plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        plugin(self);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Mutable schema, for plugins that register node and mark types
    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn options(&self) -> &DeserializeOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DeserializeOptions {
        &mut self.options
    }

    /// Parse Markdown into a document tree.
    ///
    /// Returns `Ok(None)` when the input is blank or sanitization leaves
    /// nothing behind.
    pub fn parse(&self, markdown: &str) -> Result<Option<Deserialized>> {
        if markdown.trim().is_empty() {
            debug!("blank markdown input");
            return Ok(None);
        }

        let html = render_html(markdown, &self.options.markdown)?;
        debug!("rendered {} bytes of markdown into {} bytes of html", markdown.len(), html.len());

        let clean = sanitize(&html);
        debug!("sanitized html: {} -> {} bytes", html.len(), clean.len());
        if clean.trim().is_empty() {
            debug!("nothing left after sanitization");
            return Ok(None);
        }

        let mut fragment = parse_html(&clean);
        fragment.add_child(DomNode::comment(markdown));

        let builder = TreeBuilder::new(&self.schema, &self.rules, self.options.unknown_elements)?;
        let document = builder.build(&fragment)?;
        debug!("built `{}` tree with {} top-level nodes", document.type_name, document.child_count());

        let source = fragment
            .children()
            .last()
            .filter(|node| node.is_comment())
            .and_then(|node| node.node_value.clone());

        Ok(Some(Deserialized { document, source }))
    }

    /// Parse Markdown and return the canonical JSON export of the tree
    pub fn deserialize(&self, markdown: &str) -> Result<Option<Value>> {
        self.parse(markdown)?.map(|parsed| parsed.to_json()).transpose()
    }
}

impl Default for MarkdownDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Deserialize Markdown with the default schema and options
pub fn deserialize(markdown: &str) -> Result<Option<Value>> {
    MarkdownDeserializer::new().deserialize(markdown)
}
