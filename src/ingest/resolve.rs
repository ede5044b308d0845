//! Phase two: turning parent orders into parent identities

use super::retry::{with_retry, RetryPolicy};
use crate::error::{IngestError, StorageError};
use crate::store::{ItemStore, ParentLink, PersistedItem};
use crate::types::{ForestId, ItemId, Order};
use std::future::Future;
use tracing::{debug, info};

/// Default number of parent links written per store call.
pub const DEFAULT_LINK_BATCH_SIZE: usize = 1000;

/// A stored item whose parent is known by order but not yet by identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedParent {
    pub child_order: Order,
    pub child_id: ItemId,
    pub parent_order: Order,
}

/// Outcome of a completed link pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Links written by this pass
    pub written: usize,
    /// Items that were already linked before this pass
    pub already_linked: usize,
}

/// Items that still need a parent identity.
pub fn unresolved_parents(items: &[PersistedItem]) -> Vec<UnresolvedParent> {
    items
        .iter()
        .filter(|item| item.parent_id.is_none())
        .filter_map(|item| {
            item.item.parent_order.map(|parent_order| UnresolvedParent {
                child_order: item.item.order,
                child_id: item.id,
                parent_order,
            })
        })
        .collect()
}

/// Read from the store under the retry policy. Once the policy gives up the
/// error still names the forest, so the caller keeps its continuation token.
pub(crate) async fn forest_read<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    forest_id: ForestId,
    read: F,
) -> Result<T, IngestError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    with_retry(policy, operation, read)
        .await
        .map_err(|exhausted| IngestError::ForestReadFailed {
            forest_id,
            operation,
            attempts: exhausted.attempts,
            source: exhausted.source,
        })
}

/// Completion barrier: every batch from 1 to the announced total must have
/// been received before links are resolved.
pub async fn ensure_complete(
    store: &dyn ItemStore,
    forest_id: ForestId,
    policy: &RetryPolicy,
) -> Result<usize, IngestError> {
    let forest = forest_read(policy, "get_forest", forest_id, |_| store.get_forest(forest_id))
        .await?
        .ok_or(IngestError::ForestNotFound(forest_id))?;
    let received = forest_read(policy, "received_batches", forest_id, |_| {
        store.received_batches(forest_id)
    })
    .await?;

    let Some(total_batches) = forest.total_batches else {
        return Err(IngestError::IncompleteUpload {
            forest_id,
            received: 0,
            total_batches: 0,
        });
    };
    let present = (1..=total_batches)
        .filter(|number| received.contains(number))
        .count();
    if present < total_batches {
        return Err(IngestError::IncompleteUpload {
            forest_id,
            received: present,
            total_batches,
        });
    }
    Ok(total_batches)
}

/// Run phase two for a forest whose batches have all arrived.
///
/// Links already written by an earlier pass are left alone, so a failed pass
/// can simply be run again. On failure the content rows stay in place, the
/// forest remains unlinked, and the error carries the forest id.
pub async fn resolve_links(
    store: &dyn ItemStore,
    forest_id: ForestId,
    link_batch_size: usize,
    policy: &RetryPolicy,
) -> Result<LinkReport, IngestError> {
    ensure_complete(store, forest_id, policy).await?;

    let items = forest_read(policy, "list_items", forest_id, |_| store.list_items(forest_id)).await?;
    let unresolved = unresolved_parents(&items);
    let already_linked = items
        .iter()
        .filter(|item| item.item.parent_order.is_some())
        .count()
        - unresolved.len();

    let mut parent_orders: Vec<Order> = unresolved.iter().map(|u| u.parent_order).collect();
    parent_orders.sort_unstable();
    parent_orders.dedup();
    let identities = forest_read(policy, "identities_for_orders", forest_id, |_| {
        store.identities_for_orders(forest_id, &parent_orders)
    })
    .await?;
    debug!(
        forest_id,
        unresolved = unresolved.len(),
        parents = parent_orders.len(),
        "Resolved parent identities"
    );

    let links = unresolved
        .iter()
        .map(|pending| {
            identities
                .get(&pending.parent_order)
                .map(|&parent_id| ParentLink {
                    child_order: pending.child_order,
                    child_id: pending.child_id,
                    parent_id,
                })
                .ok_or(IngestError::InconsistentForest {
                    order: pending.child_order,
                    parent_order: pending.parent_order,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut written = 0;
    for chunk in links.chunks(link_batch_size.max(1)) {
        with_retry(policy, "write_parent_links", |_| {
            store.write_parent_links(forest_id, chunk)
        })
        .await
        .map_err(|exhausted| IngestError::LinkResolutionFailed {
            forest_id,
            attempts: exhausted.attempts,
            resolved: written,
            pending: links.len() - written,
            source: exhausted.source,
        })?;
        written += chunk.len();
        debug!(forest_id, written, total = links.len(), "Parent link chunk stored");
    }

    with_retry(policy, "set_linked", |_| store.set_linked(forest_id, true))
        .await
        .map_err(|exhausted| IngestError::LinkResolutionFailed {
            forest_id,
            attempts: exhausted.attempts,
            resolved: written,
            pending: 0,
            source: exhausted.source,
        })?;
    info!(forest_id, written, already_linked, "Forest linked");
    Ok(LinkReport {
        written,
        already_linked,
    })
}
