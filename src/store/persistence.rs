//! Sled-backed item store
//!
//! Trees:
//! - `forests`: forest id (BE) -> bincode `ForestRecord`
//! - `items`: forest id (BE) ++ order (BE) -> bincode `PersistedItem`
//! - `batches`: forest id (BE) ++ batch number (BE) -> total batches (BE)
//!
//! Big-endian keys make a prefix scan over one forest yield items in order.

use super::{
    Batch, BatchReceipt, ForestRecord, ItemStore, ParentLink, PersistedItem, StoreCapabilities,
};
use crate::error::StorageError;
use crate::types::{ForestId, ItemId, Order};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

const FORESTS_TREE: &str = "forests";
const ITEMS_TREE: &str = "items";
const BATCHES_TREE: &str = "batches";

/// Item store persisted in a sled database
#[derive(Clone)]
pub struct SledItemStore {
    db: sled::Db,
    forests: sled::Tree,
    items: sled::Tree,
    batches: sled::Tree,
}

impl SledItemStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open a throwaway store that is removed when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            forests: db.open_tree(FORESTS_TREE)?,
            items: db.open_tree(ITEMS_TREE)?,
            batches: db.open_tree(BATCHES_TREE)?,
            db,
        })
    }

    fn load_forest(&self, forest_id: ForestId) -> Result<Option<ForestRecord>, StorageError> {
        match self.forests.get(forest_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_forest(&self, record: &ForestRecord) -> Result<(), StorageError> {
        self.forests
            .insert(record.id.to_be_bytes(), bincode::serialize(record)?)?;
        Ok(())
    }

    fn require_forest(&self, forest_id: ForestId) -> Result<ForestRecord, StorageError> {
        self.load_forest(forest_id)?
            .ok_or(StorageError::ForestNotFound(forest_id))
    }

    fn load_item(
        &self,
        forest_id: ForestId,
        order: Order,
    ) -> Result<Option<PersistedItem>, StorageError> {
        match self.items.get(pair_key(forest_id, order))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn flush(&self) -> Result<(), StorageError> {
        self.db.flush_async().await?;
        Ok(())
    }
}

fn pair_key(forest_id: ForestId, second: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&forest_id.to_be_bytes());
    key[8..].copy_from_slice(&second.to_be_bytes());
    key
}

fn key_suffix(key: &[u8]) -> Result<u64, StorageError> {
    let suffix: [u8; 8] = key
        .get(8..16)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| StorageError::InvalidPath(format!("malformed key of {} bytes", key.len())))?;
    Ok(u64::from_be_bytes(suffix))
}

fn remove_prefix(tree: &sled::Tree, prefix: [u8; 8]) -> Result<(), StorageError> {
    let mut batch = sled::Batch::default();
    for entry in tree.scan_prefix(prefix) {
        let (key, _) = entry?;
        batch.remove(key);
    }
    tree.apply_batch(batch)?;
    Ok(())
}

#[async_trait]
impl ItemStore for SledItemStore {
    fn capabilities(&self) -> StoreCapabilities {
        // Rows are keyed by (forest, order), so identities never depend on
        // the order in which batches land.
        StoreCapabilities {
            stable_parallel_identity: true,
        }
    }

    async fn create_forest(&self, name: &str) -> Result<ForestRecord, StorageError> {
        let now = Utc::now();
        let record = ForestRecord {
            id: self.db.generate_id()?,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            total_batches: None,
            linked: false,
        };
        self.save_forest(&record)?;
        self.flush().await?;
        Ok(record)
    }

    async fn get_forest(&self, forest_id: ForestId) -> Result<Option<ForestRecord>, StorageError> {
        self.load_forest(forest_id)
    }

    async fn list_forests(&self) -> Result<Vec<ForestRecord>, StorageError> {
        let mut forests = Vec::new();
        for entry in self.forests.iter() {
            let (_, bytes) = entry?;
            forests.push(bincode::deserialize(&bytes)?);
        }
        Ok(forests)
    }

    async fn delete_forest(&self, forest_id: ForestId) -> Result<bool, StorageError> {
        let prefix = forest_id.to_be_bytes();
        remove_prefix(&self.items, prefix)?;
        remove_prefix(&self.batches, prefix)?;
        let existed = self.forests.remove(prefix)?.is_some();
        self.flush().await?;
        Ok(existed)
    }

    async fn insert_batch(
        &self,
        forest_id: ForestId,
        batch: &Batch,
    ) -> Result<BatchReceipt, StorageError> {
        let mut forest = self.require_forest(forest_id)?;

        let mut receipt = BatchReceipt::default();
        let mut rows = sled::Batch::default();
        for item in &batch.items {
            let key = pair_key(forest_id, item.order);
            if self.items.contains_key(key)? {
                receipt.skipped += 1;
                continue;
            }
            let persisted = PersistedItem {
                id: self.db.generate_id()?,
                forest_id,
                item: item.clone(),
                parent_id: None,
            };
            rows.insert(&key[..], bincode::serialize(&persisted)?);
            receipt.inserted += 1;
        }
        self.items.apply_batch(rows)?;

        self.batches.insert(
            pair_key(forest_id, batch.batch_number as u64),
            &(batch.total_batches as u64).to_be_bytes()[..],
        )?;
        forest.total_batches = Some(batch.total_batches);
        forest.updated_at = Utc::now();
        if receipt.inserted > 0 {
            forest.linked = false;
        }
        self.save_forest(&forest)?;

        self.flush().await?;
        Ok(receipt)
    }

    async fn received_batches(&self, forest_id: ForestId) -> Result<BTreeSet<usize>, StorageError> {
        let mut received = BTreeSet::new();
        for entry in self.batches.scan_prefix(forest_id.to_be_bytes()) {
            let (key, _) = entry?;
            received.insert(key_suffix(&key)? as usize);
        }
        Ok(received)
    }

    async fn identities_for_orders(
        &self,
        forest_id: ForestId,
        orders: &[Order],
    ) -> Result<HashMap<Order, ItemId>, StorageError> {
        let mut identities = HashMap::with_capacity(orders.len());
        for &order in orders {
            if let Some(item) = self.load_item(forest_id, order)? {
                identities.insert(order, item.id);
            }
        }
        Ok(identities)
    }

    async fn write_parent_links(
        &self,
        forest_id: ForestId,
        links: &[ParentLink],
    ) -> Result<(), StorageError> {
        let mut rows = sled::Batch::default();
        for link in links {
            let mut item = self
                .load_item(forest_id, link.child_order)?
                .filter(|item| item.id == link.child_id)
                .ok_or(StorageError::ItemNotFound {
                    forest_id,
                    order: link.child_order,
                })?;
            item.parent_id = Some(link.parent_id);
            rows.insert(
                &pair_key(forest_id, link.child_order)[..],
                bincode::serialize(&item)?,
            );
        }
        self.items.apply_batch(rows)?;
        self.flush().await
    }

    async fn set_linked(&self, forest_id: ForestId, linked: bool) -> Result<(), StorageError> {
        let mut forest = self.require_forest(forest_id)?;
        forest.linked = linked;
        forest.updated_at = Utc::now();
        self.save_forest(&forest)?;
        self.flush().await
    }

    async fn list_items(&self, forest_id: ForestId) -> Result<Vec<PersistedItem>, StorageError> {
        let mut items = Vec::new();
        for entry in self.items.scan_prefix(forest_id.to_be_bytes()) {
            let (_, bytes) = entry?;
            items.push(bincode::deserialize(&bytes)?);
        }
        Ok(items)
    }
}
