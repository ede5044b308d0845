//! Splitting flattened items into numbered batches

use crate::store::Batch;
use crate::tree::FlatItem;

/// Default number of items per content batch.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// The ordered batches of one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    batches: Vec<Batch>,
}

impl BatchPlan {
    /// Chunk `items` into batches of at most `batch_size` items.
    ///
    /// An empty item list still yields one empty batch marked last, so the
    /// receiving side always sees a terminating batch. A `batch_size` of zero
    /// is treated as one.
    pub fn new(items: Vec<FlatItem>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let total_batches = items.len().div_ceil(batch_size).max(1);

        let mut batches = Vec::with_capacity(total_batches);
        let mut items = items.into_iter().peekable();
        for batch_number in 1..=total_batches {
            let chunk: Vec<FlatItem> = items.by_ref().take(batch_size).collect();
            batches.push(Batch {
                batch_number,
                total_batches,
                is_last_batch: batch_number == total_batches,
                items: chunk,
            });
        }
        debug_assert!(items.peek().is_none());

        Self { batches }
    }

    pub fn total_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn item_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.items.len()).sum()
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<Batch> {
        self.batches
    }
}
