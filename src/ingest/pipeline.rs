//! End-to-end ingest: decode, parse, flatten, write content, link

use super::batch::{BatchPlan, DEFAULT_BATCH_SIZE};
use super::input::{decode_input, DEFAULT_MAX_INPUT_BYTES};
use super::resolve::{forest_read, resolve_links, LinkReport, DEFAULT_LINK_BATCH_SIZE};
use super::retry::{with_retry, RetryPolicy};
use crate::error::IngestError;
use crate::store::{Batch, BatchReceipt, ForestRecord, ItemStore};
use crate::tree::{
    flatten, validate_links, DirectoryParser, FlatItem, LinkStrategy, Node, ParseStats,
    ScanOptions,
};
use crate::types::ForestId;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Concurrent batch writes when parallel phase one is enabled.
const PARALLEL_WRITES: usize = 4;

/// Tunables for one ingest pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    pub max_input_bytes: usize,
    pub scan: ScanOptions,
    pub strategy: LinkStrategy,
    pub batch_size: usize,
    pub link_batch_size: usize,
    /// Allow concurrent phase-one writes when the store supports it
    pub parallel_batches: bool,
    pub retry: RetryPolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            scan: ScanOptions::default(),
            strategy: LinkStrategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            link_batch_size: DEFAULT_LINK_BATCH_SIZE,
            parallel_batches: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Parsed and flattened input, ready for upload
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub forest: Vec<Node>,
    pub items: Vec<FlatItem>,
    pub stats: ParseStats,
}

/// Where an upload goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub name: String,
    /// Continuation token from an earlier, interrupted upload
    pub resume: Option<ForestId>,
}

impl UploadRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resume: None,
        }
    }

    pub fn resuming(name: impl Into<String>, forest_id: ForestId) -> Self {
        Self {
            name: name.into(),
            resume: Some(forest_id),
        }
    }
}

/// Summary of a finished upload
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub forest: ForestRecord,
    pub batches: usize,
    pub receipt: BatchReceipt,
    pub links: LinkReport,
    pub stats: ParseStats,
}

/// Drives a listing from raw bytes into a linked forest in the store
pub struct IngestPipeline {
    store: Arc<dyn ItemStore>,
    options: IngestOptions,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn ItemStore>, options: IngestOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Decode, parse and flatten without touching the store.
    pub fn prepare(&self, bytes: &[u8]) -> Result<PreparedUpload, IngestError> {
        let text = decode_input(bytes, self.options.max_input_bytes)?;
        let (forest, stats) = DirectoryParser::new(self.options.scan).parse_with_stats(text);
        let items = flatten(&forest, self.options.strategy);
        validate_links(&items)?;
        debug!(
            lines = stats.lines,
            items = items.len(),
            max_depth = stats.max_depth,
            strategy = %self.options.strategy,
            "Prepared listing"
        );
        Ok(PreparedUpload {
            forest,
            items,
            stats,
        })
    }

    /// Upload a listing: phase one, completion barrier, phase two.
    ///
    /// Any failure after the forest is created leaves its content rows in the
    /// store; the returned error's `forest_id()` is the token to resume with.
    /// Store calls from then on go through the retry policy.
    #[instrument(skip(self, bytes, request), fields(name = %request.name, resume = ?request.resume))]
    pub async fn upload(
        &self,
        bytes: &[u8],
        request: UploadRequest,
    ) -> Result<UploadOutcome, IngestError> {
        let prepared = self.prepare(bytes)?;

        let forest = match request.resume {
            Some(forest_id) => self
                .store
                .get_forest(forest_id)
                .await?
                .ok_or(IngestError::ForestNotFound(forest_id))?,
            None => self.store.create_forest(&request.name).await?,
        };
        info!(forest_id = forest.id, items = prepared.items.len(), "Uploading forest");

        let plan = BatchPlan::new(prepared.items, self.options.batch_size);
        let receipt = self.write_batches(forest.id, &plan).await?;

        let links = resolve_links(
            self.store.as_ref(),
            forest.id,
            self.options.link_batch_size,
            &self.options.retry,
        )
        .await?;

        let store = self.store.as_ref();
        let forest_id = forest.id;
        let forest = forest_read(&self.options.retry, "get_forest", forest_id, |_| {
            store.get_forest(forest_id)
        })
        .await?
        .ok_or(IngestError::ForestNotFound(forest_id))?;
        Ok(UploadOutcome {
            forest,
            batches: plan.total_batches(),
            receipt,
            links,
            stats: prepared.stats,
        })
    }

    /// Phase one. Serial unless parallel writes are both enabled and safe for
    /// the store.
    async fn write_batches(
        &self,
        forest_id: ForestId,
        plan: &BatchPlan,
    ) -> Result<BatchReceipt, IngestError> {
        let parallel =
            self.options.parallel_batches && self.store.capabilities().stable_parallel_identity;
        debug!(forest_id, batches = plan.total_batches(), parallel, "Writing content batches");

        if parallel {
            stream::iter(plan.batches())
                .map(|batch| self.write_batch(forest_id, batch))
                .buffer_unordered(PARALLEL_WRITES)
                .try_fold(BatchReceipt::default(), |total, receipt| async move {
                    Ok::<_, IngestError>(merge_receipts(total, receipt))
                })
                .await
        } else {
            let mut total = BatchReceipt::default();
            for batch in plan.batches() {
                total = merge_receipts(total, self.write_batch(forest_id, batch).await?);
            }
            Ok(total)
        }
    }

    async fn write_batch(&self, forest_id: ForestId, batch: &Batch) -> Result<BatchReceipt, IngestError> {
        let store = self.store.as_ref();
        let receipt = with_retry(&self.options.retry, "insert_batch", |_| {
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
            skipped = receipt.skipped,
            "Batch stored"
        );
        Ok(receipt)
    }
}

fn merge_receipts(a: BatchReceipt, b: BatchReceipt) -> BatchReceipt {
    BatchReceipt {
        inserted: a.inserted + b.inserted,
        skipped: a.skipped + b.skipped,
    }
}
