//! Store-side handling of the per-request batch protocol
//!
//! A client sends its batches one request at a time. The first request names
//! a new forest; later ones carry the forest id returned by the first. Once
//! every batch of the upload has arrived the links are resolved and the full
//! listing is returned with that acknowledgement.

use super::resolve::{ensure_complete, forest_read, resolve_links, DEFAULT_LINK_BATCH_SIZE};
use super::retry::{with_retry, RetryPolicy};
use crate::concurrency::ForestLockManager;
use crate::error::IngestError;
use crate::store::{Batch, BatchReceipt, ItemStore, PersistedItem};
use crate::types::ForestId;
use std::sync::Arc;
use tracing::{debug, info};

/// Which forest a batch belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestTarget {
    /// Start a new forest with this name
    New { name: String },
    /// Continue a forest created by an earlier batch
    Existing(ForestId),
}

/// One request of the batch protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEnvelope {
    pub target: ForestTarget,
    pub batch: Batch,
}

/// Response to one accepted batch
#[derive(Debug, Clone)]
pub struct BatchAck {
    pub forest_id: ForestId,
    pub batch_number: usize,
    pub total_batches: usize,
    pub receipt: BatchReceipt,
    /// Full linked listing, present once every batch has arrived
    pub items: Option<Vec<PersistedItem>>,
}

impl BatchAck {
    pub fn is_complete(&self) -> bool {
        self.items.is_some()
    }
}

pub struct BatchReceiver {
    store: Arc<dyn ItemStore>,
    locks: ForestLockManager,
    link_batch_size: usize,
    retry: RetryPolicy,
}

impl BatchReceiver {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            locks: ForestLockManager::new(),
            link_batch_size: DEFAULT_LINK_BATCH_SIZE,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_link_batch_size(mut self, link_batch_size: usize) -> Self {
        self.link_batch_size = link_batch_size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Accept one batch.
    ///
    /// Batches may arrive in any order. Links are resolved by whichever
    /// request completes the set, which need not be the one marked last.
    pub async fn accept(&self, envelope: BatchEnvelope) -> Result<BatchAck, IngestError> {
        let BatchEnvelope { target, batch } = envelope;
        validate_batch(&batch)?;

        let forest_id = match target {
            ForestTarget::New { name } => self.store.create_forest(&name).await?.id,
            ForestTarget::Existing(forest_id) => {
                self.store
                    .get_forest(forest_id)
                    .await?
                    .ok_or(IngestError::ForestNotFound(forest_id))?;
                forest_id
            }
        };

        let handle = self.locks.handle(forest_id);
        let _guard = handle.lock().await;
        self.accept_locked(forest_id, &batch).await
    }

    async fn accept_locked(&self, forest_id: ForestId, batch: &Batch) -> Result<BatchAck, IngestError> {
        let store = self.store.as_ref();
        let receipt = with_retry(&self.retry, "insert_batch", |_| {
            store.insert_batch(forest_id, batch)
        })
        .await
        .map_err(|exhausted| IngestError::BatchWriteFailed {
            forest_id,
            batch_number: batch.batch_number,
            total_batches: batch.total_batches,
            attempts: exhausted.attempts,
            source: exhausted.source,
        })?;
        info!(
            forest_id,
            batch_number = batch.batch_number,
            total_batches = batch.total_batches,
            inserted = receipt.inserted,
            "Batch received"
        );

        let mut ack = BatchAck {
            forest_id,
            batch_number: batch.batch_number,
            total_batches: batch.total_batches,
            receipt,
            items: None,
        };

        match ensure_complete(store, forest_id, &self.retry).await {
            Ok(_) => {}
            Err(IngestError::IncompleteUpload {
                received,
                total_batches,
                ..
            }) => {
                debug!(forest_id, received, total_batches, "Waiting for remaining batches");
                return Ok(ack);
            }
            Err(err) => return Err(err),
        }

        resolve_links(store, forest_id, self.link_batch_size, &self.retry).await?;
        ack.items = Some(
            forest_read(&self.retry, "list_items", forest_id, |_| store.list_items(forest_id)).await?,
        );
        Ok(ack)
    }
}

/// Check batch numbering before anything is written.
pub fn validate_batch(batch: &Batch) -> Result<(), IngestError> {
    if batch.total_batches == 0 {
        return Err(IngestError::InvalidBatch(
            "total_batches must be at least 1".to_string(),
        ));
    }
    if batch.batch_number == 0 || batch.batch_number > batch.total_batches {
        return Err(IngestError::InvalidBatch(format!(
            "batch_number {} is outside 1..={}",
            batch.batch_number, batch.total_batches
        )));
    }
    if batch.is_last_batch != (batch.batch_number == batch.total_batches) {
        return Err(IngestError::InvalidBatch(format!(
            "batch {}/{} has is_last_batch={}",
            batch.batch_number, batch.total_batches, batch.is_last_batch
        )));
    }
    Ok(())
}
