//! StorageConfig and resolve_path for the repository database.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_REPOSITORY_PATH: &str = ".gitstore/repository";

fn default_repository_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPOSITORY_PATH)
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the repository database (relative to workspace root)
    #[serde(default = "default_repository_path")]
    pub repository_path: PathBuf,
}

impl StorageConfig {
    /// Resolve the repository database location.
    ///
    /// The default path lives in the XDG data directory for the workspace;
    /// any other path is taken relative to the workspace root.
    pub fn resolve_path(&self, workspace_root: &Path) -> Result<PathBuf, ApiError> {
        if self.repository_path == Path::new(DEFAULT_REPOSITORY_PATH) {
            let data_dir = xdg::workspace_data_dir(workspace_root)?;
            return Ok(data_dir.join("repository"));
        }
        Ok(workspace_root.join(&self.repository_path))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            repository_path: default_repository_path(),
        }
    }
}
