//! In-memory item store
//!
//! Same semantics as the sled store without touching disk. Used for dry runs
//! and as the base of test doubles.

use super::{
    Batch, BatchReceipt, ForestRecord, ItemStore, ParentLink, PersistedItem, StoreCapabilities,
};
use crate::error::StorageError;
use crate::types::{ForestId, ItemId, Order};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct MemoryState {
    forests: BTreeMap<ForestId, ForestRecord>,
    items: BTreeMap<(ForestId, Order), PersistedItem>,
    batches: BTreeMap<ForestId, BTreeSet<usize>>,
}

/// Item store held entirely in memory
pub struct MemoryItemStore {
    state: RwLock<MemoryState>,
    next_id: AtomicU64,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            stable_parallel_identity: true,
        }
    }

    async fn create_forest(&self, name: &str) -> Result<ForestRecord, StorageError> {
        let now = Utc::now();
        let record = ForestRecord {
            id: self.allocate_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            total_batches: None,
            linked: false,
        };
        self.state.write().forests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_forest(&self, forest_id: ForestId) -> Result<Option<ForestRecord>, StorageError> {
        Ok(self.state.read().forests.get(&forest_id).cloned())
    }

    async fn list_forests(&self) -> Result<Vec<ForestRecord>, StorageError> {
        Ok(self.state.read().forests.values().cloned().collect())
    }

    async fn delete_forest(&self, forest_id: ForestId) -> Result<bool, StorageError> {
        let mut state = self.state.write();
        let existed = state.forests.remove(&forest_id).is_some();
        state.items.retain(|(forest, _), _| *forest != forest_id);
        state.batches.remove(&forest_id);
        Ok(existed)
    }

    async fn insert_batch(
        &self,
        forest_id: ForestId,
        batch: &Batch,
    ) -> Result<BatchReceipt, StorageError> {
        let mut state = self.state.write();
        if !state.forests.contains_key(&forest_id) {
            return Err(StorageError::ForestNotFound(forest_id));
        }

        let mut receipt = BatchReceipt::default();
        for item in &batch.items {
            let key = (forest_id, item.order);
            if state.items.contains_key(&key) {
                receipt.skipped += 1;
                continue;
            }
            let persisted = PersistedItem {
                id: self.allocate_id(),
                forest_id,
                item: item.clone(),
                parent_id: None,
            };
            state.items.insert(key, persisted);
            receipt.inserted += 1;
        }

        state
            .batches
            .entry(forest_id)
            .or_default()
            .insert(batch.batch_number);
        if let Some(forest) = state.forests.get_mut(&forest_id) {
            forest.total_batches = Some(batch.total_batches);
            forest.updated_at = Utc::now();
            if receipt.inserted > 0 {
                forest.linked = false;
            }
        }
        Ok(receipt)
    }

    async fn received_batches(&self, forest_id: ForestId) -> Result<BTreeSet<usize>, StorageError> {
        Ok(self
            .state
            .read()
            .batches
            .get(&forest_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn identities_for_orders(
        &self,
        forest_id: ForestId,
        orders: &[Order],
    ) -> Result<HashMap<Order, ItemId>, StorageError> {
        let state = self.state.read();
        Ok(orders
            .iter()
            .filter_map(|order| {
                state
                    .items
                    .get(&(forest_id, *order))
                    .map(|item| (*order, item.id))
            })
            .collect())
    }

    async fn write_parent_links(
        &self,
        forest_id: ForestId,
        links: &[ParentLink],
    ) -> Result<(), StorageError> {
        let mut state = self.state.write();
        for link in links {
            let item = state
                .items
                .get_mut(&(forest_id, link.child_order))
                .filter(|item| item.id == link.child_id)
                .ok_or(StorageError::ItemNotFound {
                    forest_id,
                    order: link.child_order,
                })?;
            item.parent_id = Some(link.parent_id);
        }
        Ok(())
    }

    async fn set_linked(&self, forest_id: ForestId, linked: bool) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let forest = state
            .forests
            .get_mut(&forest_id)
            .ok_or(StorageError::ForestNotFound(forest_id))?;
        forest.linked = linked;
        forest.updated_at = Utc::now();
        Ok(())
    }

    async fn list_items(&self, forest_id: ForestId) -> Result<Vec<PersistedItem>, StorageError> {
        let state = self.state.read();
        Ok(state
            .items
            .range((forest_id, Order::MIN)..=(forest_id, Order::MAX))
            .map(|(_, item)| item.clone())
            .collect())
    }
}
