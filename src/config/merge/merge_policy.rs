//! Base layer for every merge: the serialized defaults.

use crate::config::ArborConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with `ArborConfig::default()`, so later sources only need
/// to name the keys they change.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&ArborConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
