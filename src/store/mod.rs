//! Item Store
//!
//! The storage collaborator for uploaded forests. Content rows are written
//! first and receive a stable identity; parent links are written afterwards
//! once every referenced parent has one.

pub mod memory;
pub mod persistence;

use crate::error::StorageError;
use crate::tree::FlatItem;
use crate::types::{ForestId, ItemId, Order};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub use memory::MemoryItemStore;
pub use persistence::SledItemStore;

/// One bounded slice of a flattened upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// 1-based position of this batch in the upload
    pub batch_number: usize,
    pub total_batches: usize,
    pub is_last_batch: bool,
    pub items: Vec<FlatItem>,
}

/// Metadata for one uploaded forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestRecord {
    pub id: ForestId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Batch count announced by the most recent upload, if any batch arrived
    pub total_batches: Option<usize>,
    /// True once every parent link has been written
    pub linked: bool,
}

/// A flattened item after phase one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedItem {
    pub id: ItemId,
    pub forest_id: ForestId,
    pub item: FlatItem,
    /// Set in phase two
    pub parent_id: Option<ItemId>,
}

impl PersistedItem {
    /// Has a parent reference that was never resolved to an identity.
    pub fn is_unlinked(&self) -> bool {
        self.item.parent_order.is_some() && self.parent_id.is_none()
    }
}

/// Parent link written in phase two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    pub child_order: Order,
    pub child_id: ItemId,
    pub parent_id: ItemId,
}

/// What a store guarantees about concurrent writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// Identities stay queryable by `(forest, order)` when batches are written
    /// concurrently, so phase one may run batches in parallel
    pub stable_parallel_identity: bool,
}

/// Result of writing one content batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReceipt {
    /// Rows created by this call
    pub inserted: usize,
    /// Rows that already existed for the same `(forest, order)`
    pub skipped: usize,
}

/// Storage collaborator interface
#[async_trait]
pub trait ItemStore: Send + Sync {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::default()
    }

    async fn create_forest(&self, name: &str) -> Result<ForestRecord, StorageError>;

    async fn get_forest(&self, forest_id: ForestId) -> Result<Option<ForestRecord>, StorageError>;

    async fn list_forests(&self) -> Result<Vec<ForestRecord>, StorageError>;

    /// Remove a forest with all its items. Returns false if it did not exist.
    async fn delete_forest(&self, forest_id: ForestId) -> Result<bool, StorageError>;

    /// Phase one: store content rows and record the batch as received.
    ///
    /// Writing an order that already exists for the forest keeps the existing
    /// row and identity, so retried or resumed batches are idempotent.
    /// A batch that inserts any new row clears the forest's `linked` flag.
    async fn insert_batch(
        &self,
        forest_id: ForestId,
        batch: &Batch,
    ) -> Result<BatchReceipt, StorageError>;

    /// Batch numbers acknowledged so far for a forest.
    async fn received_batches(&self, forest_id: ForestId) -> Result<BTreeSet<usize>, StorageError>;

    /// Identities assigned to the given orders. Unknown orders are absent.
    async fn identities_for_orders(
        &self,
        forest_id: ForestId,
        orders: &[Order],
    ) -> Result<HashMap<Order, ItemId>, StorageError>;

    /// Phase two: write parent identities.
    async fn write_parent_links(
        &self,
        forest_id: ForestId,
        links: &[ParentLink],
    ) -> Result<(), StorageError>;

    async fn set_linked(&self, forest_id: ForestId, linked: bool) -> Result<(), StorageError>;

    /// All items of a forest, ordered by `order` ascending.
    async fn list_items(&self, forest_id: ForestId) -> Result<Vec<PersistedItem>, StorageError>;
}

/// Items whose parent reference was never resolved.
pub fn find_unlinked(items: &[PersistedItem]) -> Vec<&PersistedItem> {
    items.iter().filter(|item| item.is_unlinked()).collect()
}
