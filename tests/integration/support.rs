//! Test doubles for store failure injection

use arbor::error::StorageError;
use arbor::store::{
    Batch, BatchReceipt, ForestRecord, ItemStore, MemoryItemStore, ParentLink, PersistedItem,
    StoreCapabilities,
};
use arbor::types::{ForestId, ItemId, Order};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

/// Memory store that fails selected writes a set number of times.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryItemStore,
    /// Remaining failures for `write_parent_links`
    pub link_failures: AtomicU32,
    /// Batch number whose insert fails, and how many more times
    pub failing_batch: Option<usize>,
    pub batch_failures: AtomicU32,
    /// Remaining failures for `identities_for_orders`
    pub identity_failures: AtomicU32,
    pub link_calls: AtomicU32,
}

impl FaultyStore {
    pub fn failing_links(times: u32) -> Self {
        Self {
            link_failures: AtomicU32::new(times),
            ..Self::default()
        }
    }

    pub fn failing_batch(batch_number: usize, times: u32) -> Self {
        Self {
            failing_batch: Some(batch_number),
            batch_failures: AtomicU32::new(times),
            ..Self::default()
        }
    }

    pub fn failing_identities(times: u32) -> Self {
        Self {
            identity_failures: AtomicU32::new(times),
            ..Self::default()
        }
    }

    pub fn link_calls(&self) -> u32 {
        self.link_calls.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ItemStore for FaultyStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.inner.capabilities()
    }

    async fn create_forest(&self, name: &str) -> Result<ForestRecord, StorageError> {
        self.inner.create_forest(name).await
    }

    async fn get_forest(&self, forest_id: ForestId) -> Result<Option<ForestRecord>, StorageError> {
        self.inner.get_forest(forest_id).await
    }

    async fn list_forests(&self) -> Result<Vec<ForestRecord>, StorageError> {
        self.inner.list_forests().await
    }

    async fn delete_forest(&self, forest_id: ForestId) -> Result<bool, StorageError> {
        self.inner.delete_forest(forest_id).await
    }

    async fn insert_batch(
        &self,
        forest_id: ForestId,
        batch: &Batch,
    ) -> Result<BatchReceipt, StorageError> {
        if self.failing_batch == Some(batch.batch_number) && Self::take_failure(&self.batch_failures)
        {
            return Err(StorageError::Unavailable(format!(
                "injected failure for batch {}",
                batch.batch_number
            )));
        }
        self.inner.insert_batch(forest_id, batch).await
    }

    async fn received_batches(&self, forest_id: ForestId) -> Result<BTreeSet<usize>, StorageError> {
        self.inner.received_batches(forest_id).await
    }

    async fn identities_for_orders(
        &self,
        forest_id: ForestId,
        orders: &[Order],
    ) -> Result<HashMap<Order, ItemId>, StorageError> {
        if Self::take_failure(&self.identity_failures) {
            return Err(StorageError::Unavailable("injected identity lookup failure".into()));
        }
        self.inner.identities_for_orders(forest_id, orders).await
    }

    async fn write_parent_links(
        &self,
        forest_id: ForestId,
        links: &[ParentLink],
    ) -> Result<(), StorageError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.link_failures) {
            return Err(StorageError::Unavailable("injected link failure".into()));
        }
        self.inner.write_parent_links(forest_id, links).await
    }

    async fn set_linked(&self, forest_id: ForestId, linked: bool) -> Result<(), StorageError> {
        self.inner.set_linked(forest_id, linked).await
    }

    async fn list_items(&self, forest_id: ForestId) -> Result<Vec<PersistedItem>, StorageError> {
        self.inner.list_items(forest_id).await
    }
}
