//! Built-in defaults forming the lowest configuration layer.

use crate::config::{
    DEFAULT_DELETE_MESSAGE, DEFAULT_INITIAL_COMMIT_MESSAGE, DEFAULT_REFERENCE_NAME,
    DEFAULT_SAVE_MESSAGE,
};
use crate::config::workspace::storage_paths::DEFAULT_REPOSITORY_PATH;
use crate::object::Identity;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with default values, so file and environment layers only
/// need to name the keys they override.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let default_identity = Identity::default();
    Config::builder()
        .set_default("storage.repository_path", DEFAULT_REPOSITORY_PATH)?
        .set_default("repository.reference_name", DEFAULT_REFERENCE_NAME)?
        .set_default("repository.initial_commit_message", DEFAULT_INITIAL_COMMIT_MESSAGE)?
        .set_default("repository.save_message", DEFAULT_SAVE_MESSAGE)?
        .set_default("repository.delete_message", DEFAULT_DELETE_MESSAGE)?
        .set_default("repository.author.name", default_identity.name.as_str())?
        .set_default("repository.author.email", default_identity.email.as_str())?
        .set_default("repository.committer.name", default_identity.name.as_str())?
        .set_default("repository.committer.email", default_identity.email.as_str())
}
