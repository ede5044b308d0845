//! StorageConfig and store path resolution.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The `[storage]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory. Relative paths are taken from the workspace
    /// root; unset means `$XDG_DATA_HOME/arbor/store`.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_store_path(&self, workspace_root: &Path) -> Result<PathBuf, ApiError> {
        match &self.store_path {
            Some(path) if path.as_os_str().is_empty() => Err(ApiError::ConfigError(
                "storage.store_path must not be empty".to_string(),
            )),
            Some(path) => Ok(workspace_root.join(path)),
            None => Ok(xdg::data_dir()?.join("store")),
        }
    }
}
