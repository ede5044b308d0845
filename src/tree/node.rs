//! Parse-time nodes and flattened items

use crate::types::{ItemKind, Order};
use serde::{Deserialize, Serialize};

/// Node in a parsed forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: ItemKind,
    /// Depth inferred from the line's indentation
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: ItemKind, depth: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            depth,
            children: Vec::new(),
        }
    }

    pub fn folder(name: impl Into<String>, depth: usize) -> Self {
        Self::new(name, ItemKind::Folder, depth)
    }

    pub fn file(name: impl Into<String>, depth: usize) -> Self {
        Self::new(name, ItemKind::File, depth)
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// A node with children is always a folder, whatever its name says.
    pub fn effective_kind(&self) -> ItemKind {
        if self.children.is_empty() {
            self.kind
        } else {
            ItemKind::Folder
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        preorder(std::slice::from_ref(self)).count()
    }
}

/// Flattened item: one row of the order-indexed sequence handed to storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatItem {
    pub name: String,
    pub kind: ItemKind,
    pub depth: usize,
    pub order: Order,
    pub parent_order: Option<Order>,
}

/// Depth-first pre-order walk over a forest, yielding each node with its
/// distance from the root it hangs under.
pub fn preorder(forest: &[Node]) -> PreOrder<'_> {
    PreOrder {
        pending: forest.iter().rev().map(|node| (node, 0)).collect(),
    }
}

pub struct PreOrder<'a> {
    pending: Vec<(&'a Node, usize)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.pending.pop()?;
        self.pending
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

/// Count of nodes across a whole forest.
pub fn forest_len(forest: &[Node]) -> usize {
    preorder(forest).count()
}
