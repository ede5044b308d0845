//! Per-user config file under the XDG config home.

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::config_file() {
        Ok(path) => Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(false))),
        // No HOME: nothing to layer.
        Err(_) => Ok(builder),
    }
}
