//! Error types
//!
//! `StorageError` covers the persistence layer, `IngestError` covers the
//! parse/flatten/persist pipeline, and `ApiError` is what the CLI surfaces.

use crate::types::{ForestId, Order};
use thiserror::Error;

/// Errors raised by an item store implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Forest not found: {0}")]
    ForestNotFound(ForestId),

    #[error("No item at order {order} in forest {forest_id}")]
    ItemNotFound { forest_id: ForestId, order: Order },

    /// Injected or transient failure reported by a store backend.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while ingesting a directory listing.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Input is {size} bytes, exceeding the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },

    #[error("Input is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidEncoding { offset: usize },

    #[error("Batch {batch_number}/{total_batches} failed after {attempts} attempts: {source}")]
    BatchWriteFailed {
        forest_id: ForestId,
        batch_number: usize,
        total_batches: usize,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error(
        "Parent links for forest {forest_id} failed after {attempts} attempts \
         ({resolved} written, {pending} pending): {source}"
    )]
    LinkResolutionFailed {
        forest_id: ForestId,
        attempts: u32,
        resolved: usize,
        pending: usize,
        #[source]
        source: StorageError,
    },

    #[error("Reading forest {forest_id} failed after {attempts} attempts ({operation}): {source}")]
    ForestReadFailed {
        forest_id: ForestId,
        operation: &'static str,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("Item {order} references parent order {parent_order}, which was never emitted")]
    InconsistentForest { order: Order, parent_order: Order },

    #[error(
        "Forest {forest_id} has {received} of {total_batches} batches; links cannot be resolved yet"
    )]
    IncompleteUpload {
        forest_id: ForestId,
        received: usize,
        total_batches: usize,
    },

    #[error("Forest not found: {0}")]
    ForestNotFound(ForestId),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Returns the continuation token a caller can resume with, if any.
    pub fn forest_id(&self) -> Option<ForestId> {
        match self {
            IngestError::LinkResolutionFailed { forest_id, .. }
            | IngestError::IncompleteUpload { forest_id, .. }
            | IngestError::BatchWriteFailed { forest_id, .. }
            | IngestError::ForestReadFailed { forest_id, .. } => Some(*forest_id),
            _ => None,
        }
    }
}

/// Top-level error for CLI and configuration surfaces.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Forest not found: {0}")]
    ForestNotFound(ForestId),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
