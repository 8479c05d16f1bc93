//! Environment variable source: GITSTORE_ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub(crate) const ENV_PREFIX: &str = "GITSTORE";

/// Add environment variable overlay to builder.
/// Uses GITSTORE prefix and __ as separator for nested keys, for example
/// `GITSTORE__REPOSITORY__REFERENCE_NAME`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
