//! Environment variable source: ARBOR prefix with __ separator

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

/// Overlay `ARBOR__SECTION__KEY` variables, e.g. `ARBOR__INGEST__BATCH_SIZE=100`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("ARBOR")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
