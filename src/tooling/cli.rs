//! CLI Tooling
//!
//! Command-line interface over the ingest pipeline and the item store.

use super::format::{
    format_check_report, format_forest_table, format_parse_stats, format_upload_outcome,
    render_tree, CheckReport,
};
use crate::config::{ArborConfig, ConfigLoader};
use crate::error::{ApiError, IngestError, StorageError};
use crate::ingest::{resolve_links, IngestPipeline, UploadRequest};
use crate::logging::LoggingConfig;
use crate::store::{find_unlinked, ItemStore, MemoryItemStore, SledItemStore};
use crate::tree::{rebuild_forest, FlatItem, LinkStrategy};
use crate::types::ForestId;
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

/// Arbor - rebuild directory trees from exported listings
#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Parse plain-text directory listings and store them as linked trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where arbor.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log to stderr at debug level
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line logging flags on top of the configured section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            config.output = "stderr".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a listing and store it as a linked forest
    Import {
        /// Listing file
        file: PathBuf,
        /// Forest name (default: file name)
        #[arg(long)]
        name: Option<String>,
        /// Continue an interrupted upload of the same listing
        #[arg(long)]
        resume: Option<ForestId>,
        /// Items per content batch
        #[arg(long)]
        batch_size: Option<usize>,
        /// Parent link strategy (same-pass or post-hoc)
        #[arg(long)]
        strategy: Option<LinkStrategy>,
        /// Run against an in-memory store and discard the result
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Parse a listing and print the recovered tree without storing it
    Parse {
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print a stored forest
    Show {
        id: ForestId,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List stored forests
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Report missing batches and unlinked items for a forest
    Check {
        id: ForestId,
        /// Run the link pass again for items that are still unlinked
        #[arg(long)]
        repair: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete a stored forest and its items
    Delete { id: ForestId },
}

/// CLI context holding configuration, the store and the async runtime
pub struct CliContext {
    config: ArborConfig,
    workspace_root: PathBuf,
    store: Mutex<Option<Arc<dyn ItemStore>>>,
    runtime: Runtime,
}

impl CliContext {
    /// Load configuration. The store is opened on first use.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::with_config(workspace_root, config)
    }

    pub fn with_config(workspace_root: PathBuf, config: ArborConfig) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .build()
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
        Ok(Self {
            config,
            workspace_root,
            store: Mutex::new(None),
            runtime,
        })
    }

    /// Use an already-open store instead of the configured sled database.
    pub fn with_store(mut self, store: Arc<dyn ItemStore>) -> Self {
        self.store = Mutex::new(Some(store));
        self
    }

    pub fn config(&self) -> &ArborConfig {
        &self.config
    }

    fn store(&self) -> Result<Arc<dyn ItemStore>, ApiError> {
        let mut slot = self.store.lock();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }
        let path = self.config.storage.resolve_store_path(&self.workspace_root)?;
        info!(store_path = %path.display(), "Opening item store");
        let store: Arc<dyn ItemStore> = Arc::new(SledItemStore::open(&path)?);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Import {
                file,
                name,
                resume,
                batch_size,
                strategy,
                dry_run,
                format,
            } => {
                let mut options = self.config.ingest.to_options()?;
                if let Some(batch_size) = batch_size {
                    options.batch_size = (*batch_size).max(1);
                }
                if let Some(strategy) = strategy {
                    options.strategy = *strategy;
                }
                let store: Arc<dyn ItemStore> = if *dry_run {
                    Arc::new(MemoryItemStore::new())
                } else {
                    self.store()?
                };
                let bytes = read_listing(file)?;
                let name = name.clone().unwrap_or_else(|| default_forest_name(file));
                let request = match resume {
                    Some(forest_id) => UploadRequest::resuming(name, *forest_id),
                    None => UploadRequest::new(name),
                };

                let pipeline = IngestPipeline::new(store, options);
                let outcome = self.runtime.block_on(pipeline.upload(&bytes, request))?;
                if format == "json" {
                    to_json(&json!({
                        "forest": outcome.forest,
                        "dry_run": dry_run,
                        "batches": outcome.batches,
                        "inserted": outcome.receipt.inserted,
                        "skipped": outcome.receipt.skipped,
                        "links_written": outcome.links.written,
                        "stats": outcome.stats,
                    }))
                } else {
                    Ok(format_upload_outcome(&outcome, *dry_run))
                }
            }
            Commands::Parse { file, format } => {
                let options = self.config.ingest.to_options()?;
                let bytes = read_listing(file)?;
                let pipeline = IngestPipeline::new(Arc::new(MemoryItemStore::new()), options);
                let prepared = pipeline.prepare(&bytes)?;
                if format == "json" {
                    to_json(&json!({
                        "forest": prepared.forest,
                        "items": prepared.items,
                        "stats": prepared.stats,
                    }))
                } else {
                    Ok(format!(
                        "{}\n{}",
                        render_tree(&prepared.forest),
                        format_parse_stats(&prepared.stats, prepared.items.len())
                    ))
                }
            }
            Commands::Show { id, format } => {
                let store = self.store()?;
                let (forest, items) = self.runtime.block_on(async {
                    let forest = store.get_forest(*id).await?;
                    let items = store.list_items(*id).await?;
                    Ok::<_, StorageError>((forest, items))
                })?;
                let forest = forest.ok_or(ApiError::ForestNotFound(*id))?;
                if format == "json" {
                    return to_json(&json!({ "forest": forest, "items": items }));
                }
                let flat: Vec<FlatItem> = items.into_iter().map(|item| item.item).collect();
                Ok(render_tree(&rebuild_forest(&flat)?))
            }
            Commands::List { format } => {
                let store = self.store()?;
                let forests = self.runtime.block_on(store.list_forests())?;
                if format == "json" {
                    to_json(&forests)
                } else {
                    Ok(format_forest_table(&forests))
                }
            }
            Commands::Check { id, repair, format } => self.check(*id, *repair, format),
            Commands::Delete { id } => {
                let store = self.store()?;
                if self.runtime.block_on(store.delete_forest(*id))? {
                    Ok(format!("Deleted forest {}", id))
                } else {
                    Err(ApiError::ForestNotFound(*id))
                }
            }
        }
    }

    fn check(&self, id: ForestId, repair: bool, format: &str) -> Result<String, ApiError> {
        let store = self.store()?;
        let options = self.config.ingest.to_options()?;

        let (forest, received, items) = self.runtime.block_on(async {
            if repair {
                match resolve_links(store.as_ref(), id, options.link_batch_size, &options.retry).await {
                    // Nothing to repair until every batch is in.
                    Ok(_) | Err(IngestError::IncompleteUpload { .. }) => {}
                    Err(err) => return Err(ApiError::from(err)),
                }
            }
            let forest = store.get_forest(id).await?;
            let received = store.received_batches(id).await?;
            let items = store.list_items(id).await?;
            Ok((forest, received, items))
        })?;
        let forest = forest.ok_or(ApiError::ForestNotFound(id))?;

        let missing_batches: Vec<usize> = (1..=forest.total_batches.unwrap_or(0))
            .filter(|number| !received.contains(number))
            .collect();
        let report = CheckReport {
            forest: &forest,
            missing_batches,
            items: items.len(),
            unlinked: find_unlinked(&items),
        };

        if format == "json" {
            to_json(&json!({
                "forest": report.forest,
                "items": report.items,
                "missing_batches": report.missing_batches,
                "unlinked": report.unlinked,
            }))
        } else {
            Ok(format_check_report(&report))
        }
    }
}

fn read_listing(path: &Path) -> Result<Vec<u8>, ApiError> {
    std::fs::read(path).map_err(|e| ApiError::StorageError(StorageError::IoError(e)))
}

fn default_forest_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "listing".to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}
