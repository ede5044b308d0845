//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::ArborConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the standard files and the environment.
    pub fn load(workspace_root: &Path) -> Result<ArborConfig, ApiError> {
        let config = MergeService::load(workspace_root)?;
        config.ingest.validate()?;
        Ok(config)
    }

    /// Load configuration from one explicit file plus the environment.
    pub fn load_from_file(path: &Path) -> Result<ArborConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.ingest.validate()?;
        Ok(config)
    }
}
