//! Link validation and forest reconstruction from flat items

use super::node::{FlatItem, Node};
use crate::error::IngestError;
use crate::types::Order;
use std::collections::{HashMap, HashSet};

/// Check that every `parent_order` names an order emitted strictly earlier.
pub fn validate_links(items: &[FlatItem]) -> Result<(), IngestError> {
    let mut emitted: HashSet<Order> = HashSet::with_capacity(items.len());
    for item in items {
        if let Some(parent_order) = item.parent_order {
            if !emitted.contains(&parent_order) {
                return Err(IngestError::InconsistentForest {
                    order: item.order,
                    parent_order,
                });
            }
        }
        emitted.insert(item.order);
    }
    Ok(())
}

/// Rebuild a forest from items by following their `parent_order` links.
///
/// Sibling order follows item order. Node depth is taken from the items.
pub fn rebuild_forest(items: &[FlatItem]) -> Result<Vec<Node>, IngestError> {
    validate_links(items)?;

    let mut children_of: HashMap<Order, Vec<Order>> = HashMap::new();
    let mut roots = Vec::new();
    for item in items {
        match item.parent_order {
            Some(parent) => children_of.entry(parent).or_default().push(item.order),
            None => roots.push(item.order),
        }
    }

    // Children always come after their parent, so building in reverse order
    // finishes every subtree before the node that owns it.
    let mut built: HashMap<Order, Node> = HashMap::with_capacity(items.len());
    for item in items.iter().rev() {
        let children = children_of
            .remove(&item.order)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|child| built.remove(&child))
            .collect();
        let node = Node::new(item.name.clone(), item.kind, item.depth).with_children(children);
        built.insert(item.order, node);
    }

    Ok(roots
        .into_iter()
        .filter_map(|order| built.remove(&order))
        .collect())
}
