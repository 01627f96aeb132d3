//! `.fliessend.toml` at the outline root

use crate::config::paths::workspace_config_path;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        File::from(workspace_config_path(root))
            .format(FileFormat::Toml)
            .required(false),
    ))
}
