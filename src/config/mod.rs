//! Configuration
//!
//! Layered configuration built with the `config` crate: built-in defaults,
//! the global file, the workspace file, then `GITSTORE__*` environment
//! variables, each overriding the previous layer.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::StorageConfig;

use crate::logging::LoggingConfig;
use crate::object::Identity;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_REFERENCE_NAME: &str = "refs/heads/master";
pub(crate) const DEFAULT_INITIAL_COMMIT_MESSAGE: &str = "Initial commit by Git Storage";
pub(crate) const DEFAULT_SAVE_MESSAGE: &str = "Saved by Git Storage";
pub(crate) const DEFAULT_DELETE_MESSAGE: &str = "Deleted by Git Storage";

fn default_reference_name() -> String {
    DEFAULT_REFERENCE_NAME.to_string()
}

fn default_initial_commit_message() -> String {
    DEFAULT_INITIAL_COMMIT_MESSAGE.to_string()
}

fn default_save_message() -> String {
    DEFAULT_SAVE_MESSAGE.to_string()
}

fn default_delete_message() -> String {
    DEFAULT_DELETE_MESSAGE.to_string()
}

/// Repository behaviour: which reference is published and how commits are signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// The single reference reads and writes go through
    #[serde(default = "default_reference_name")]
    pub reference_name: String,

    #[serde(default = "default_initial_commit_message")]
    pub initial_commit_message: String,

    #[serde(default = "default_save_message")]
    pub save_message: String,

    #[serde(default = "default_delete_message")]
    pub delete_message: String,

    /// Default author of commits, unless a request supplies its own
    #[serde(default)]
    pub author: Identity,

    /// Committer of every commit
    #[serde(default)]
    pub committer: Identity,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            reference_name: default_reference_name(),
            initial_commit_message: default_initial_commit_message(),
            save_message: default_save_message(),
            delete_message: default_delete_message(),
            author: Identity::default(),
            committer: Identity::default(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitStoreConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
