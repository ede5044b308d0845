//! Ingest
//!
//! Moves a parsed listing into an item store in two phases. Phase one writes
//! content rows in numbered batches and lets the store assign identities.
//! Phase two runs once every batch has arrived and writes parent identities.

pub mod batch;
pub mod input;
pub mod pipeline;
pub mod receiver;
pub mod resolve;
pub mod retry;

pub use batch::{BatchPlan, DEFAULT_BATCH_SIZE};
pub use input::{decode_input, DEFAULT_MAX_INPUT_BYTES};
pub use pipeline::{IngestOptions, IngestPipeline, PreparedUpload, UploadOutcome, UploadRequest};
pub use receiver::{validate_batch, BatchAck, BatchEnvelope, BatchReceiver, ForestTarget};
pub use resolve::{
    ensure_complete, resolve_links, unresolved_parents, LinkReport, UnresolvedParent,
    DEFAULT_LINK_BATCH_SIZE,
};
pub use retry::{is_retryable, with_retry, RetryExhausted, RetryPolicy};
