//! Per-call record of which nodes sit inside a table cell.
//!
//! Membership is keyed by node address. The set borrows the tree for `'a`, so
//! the tree cannot move or change while the set is alive, and each
//! serialization call owns its own set.

use std::collections::HashSet;
use std::marker::PhantomData;

use crate::model::Node;
use crate::schema::Schema;

#[derive(Debug, Clone, Default)]
pub struct TableMembership<'a> {
    nodes: HashSet<usize>,
    tree: PhantomData<&'a Node>,
}

impl<'a> TableMembership<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every table cell under `root` together with all its descendants
    pub fn collect(root: &'a Node, schema: &Schema) -> Self {
        let mut membership = Self::new();
        for node in root.descendants() {
            let is_cell = schema
                .node_kind(&node.type_name)
                .is_some_and(|kind| kind.is_table_cell());
            if is_cell && !membership.contains(node) {
                for inner in node.descendants() {
                    membership.insert(inner);
                }
            }
        }
        membership
    }

    pub fn insert(&mut self, node: &'a Node) {
        self.nodes.insert(address(node));
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains(&address(node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn address(node: &Node) -> usize {
    node as *const Node as usize
}
