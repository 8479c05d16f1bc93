//! Global config file source: $XDG_CONFIG_HOME/gitstore/config.toml

use crate::config::xdg;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;

/// Add the global config file when it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::global_config_path() {
        Ok(path) => Ok(builder.add_source(File::from(path).required(false))),
        Err(e) => {
            tracing::debug!("Skipping global config file: {}", e);
            Ok(builder)
        }
    }
}
