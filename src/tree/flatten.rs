//! Flattening a forest into order-indexed items
//!
//! Orders are assigned in depth-first pre-order starting at zero. Item depth
//! is the structural distance from the item's root, so a parent is always
//! exactly one level shallower than its children.

use super::node::{preorder, FlatItem, Node};
use super::stack::DepthStack;
use crate::types::{ItemKind, Order};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How parent links are computed while flattening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStrategy {
    /// Parent order tracked during the traversal, O(n)
    #[default]
    SamePass,
    /// Parent inferred afterwards as the nearest earlier shallower folder
    PostHoc,
}

impl fmt::Display for LinkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStrategy::SamePass => f.write_str("same-pass"),
            LinkStrategy::PostHoc => f.write_str("post-hoc"),
        }
    }
}

impl FromStr for LinkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same-pass" => Ok(LinkStrategy::SamePass),
            "post-hoc" => Ok(LinkStrategy::PostHoc),
            other => Err(format!(
                "Invalid link strategy: {} (must be 'same-pass' or 'post-hoc')",
                other
            )),
        }
    }
}

/// Flatten a parsed forest.
pub fn flatten(forest: &[Node], strategy: LinkStrategy) -> Vec<FlatItem> {
    match strategy {
        LinkStrategy::SamePass => flatten_same_pass(forest),
        LinkStrategy::PostHoc => {
            let mut items = flatten_unlinked(forest);
            infer_parents(&mut items);
            items
        }
    }
}

fn flatten_same_pass(forest: &[Node]) -> Vec<FlatItem> {
    let mut items = Vec::new();
    let mut open_folders: DepthStack<Order> = DepthStack::new();

    for (node, depth) in preorder(forest) {
        let order = items.len() as Order;
        open_folders.unwind_to(depth);
        let parent_order = open_folders.top().map(|(parent, _)| *parent);
        let kind = node.effective_kind();

        items.push(FlatItem {
            name: node.name.clone(),
            kind,
            depth,
            order,
            parent_order,
        });
        if kind.is_folder() {
            open_folders.push(order, depth);
        }
    }
    items
}

fn flatten_unlinked(forest: &[Node]) -> Vec<FlatItem> {
    preorder(forest)
        .enumerate()
        .map(|(index, (node, depth))| FlatItem {
            name: node.name.clone(),
            kind: node.effective_kind(),
            depth,
            order: index as Order,
            parent_order: None,
        })
        .collect()
}

/// Assign `parent_order` to every item by scanning backwards for the nearest
/// earlier folder with a smaller depth. Items with no such folder are roots.
///
/// Quadratic in the worst case; kept for inputs that arrive already flat.
pub fn infer_parents(items: &mut [FlatItem]) {
    for index in 0..items.len() {
        let depth = items[index].depth;
        let parent_order = if depth == 0 {
            None
        } else {
            items[..index]
                .iter()
                .rev()
                .find(|candidate| candidate.depth < depth && candidate.kind.is_folder())
                .map(|parent| parent.order)
        };
        items[index].parent_order = parent_order;
    }
}

/// Turn an already-flat sequence of `(name, kind, depth)` entries into linked
/// items. Orders follow input position; depths are kept as given.
pub fn flatten_levelled<I, S>(entries: I) -> Vec<FlatItem>
where
    I: IntoIterator<Item = (S, ItemKind, usize)>,
    S: Into<String>,
{
    let mut items: Vec<FlatItem> = entries
        .into_iter()
        .enumerate()
        .map(|(index, (name, kind, depth))| FlatItem {
            name: name.into(),
            kind,
            depth,
            order: index as Order,
            parent_order: None,
        })
        .collect();
    infer_parents(&mut items);
    items
}
