//! Configuration
//!
//! Layered with the `config` crate. Lowest to highest precedence: built-in
//! defaults, `$XDG_CONFIG_HOME/arbor/config.toml`, `arbor.toml` in the
//! workspace, `ARBOR__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge {
    pub mod merge_policy;
    pub mod service;
}
pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}
#[path = "config/paths/xdg_root.rs"]
pub mod xdg;
pub mod workspace {
    pub mod storage_paths;
}

pub use facade::ConfigLoader;
pub use workspace::storage_paths::StorageConfig;

use crate::error::ApiError;
use crate::ingest::{
    IngestOptions, RetryPolicy, DEFAULT_BATCH_SIZE, DEFAULT_LINK_BATCH_SIZE,
    DEFAULT_MAX_INPUT_BYTES,
};
use crate::logging::LoggingConfig;
use crate::tree::{LinkStrategy, ScanOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete arbor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArborConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The `[ingest]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,

    /// Columns per level in space-indented listings
    #[serde(default = "default_indent_unit")]
    pub indent_unit: usize,

    /// Treat `├──` lines as children of the plain line above them
    #[serde(default = "default_true")]
    pub anchor_glyph_lines: bool,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_link_batch_size")]
    pub link_batch_size: usize,

    #[serde(default)]
    pub strategy: LinkStrategy,

    #[serde(default)]
    pub parallel_batches: bool,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// The `[ingest.retry]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_input_bytes() -> usize {
    DEFAULT_MAX_INPUT_BYTES
}

fn default_indent_unit() -> usize {
    ScanOptions::default().indent_unit
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_link_batch_size() -> usize {
    DEFAULT_LINK_BATCH_SIZE
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            indent_unit: default_indent_unit(),
            anchor_glyph_lines: default_true(),
            batch_size: default_batch_size(),
            link_batch_size: default_link_batch_size(),
            strategy: LinkStrategy::default(),
            parallel_batches: false,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        let positive = [
            ("ingest.max_input_bytes", self.max_input_bytes),
            ("ingest.indent_unit", self.indent_unit),
            ("ingest.batch_size", self.batch_size),
            ("ingest.link_batch_size", self.link_batch_size),
            ("ingest.retry.max_attempts", self.retry.max_attempts as usize),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ApiError::ConfigError(format!("{} must be at least 1", key)));
            }
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ApiError::ConfigError(format!(
                "ingest.retry.base_delay_ms ({}) exceeds ingest.retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Validated pipeline options for this section.
    pub fn to_options(&self) -> Result<IngestOptions, ApiError> {
        self.validate()?;
        Ok(IngestOptions {
            max_input_bytes: self.max_input_bytes,
            scan: ScanOptions {
                indent_unit: self.indent_unit,
                anchor_glyph_lines: self.anchor_glyph_lines,
            },
            strategy: self.strategy,
            batch_size: self.batch_size,
            link_batch_size: self.link_batch_size,
            parallel_batches: self.parallel_batches,
            retry: self.retry.to_policy(),
        })
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            ..RetryPolicy::default()
        }
    }
}
