//! MergeService: orchestrates sources, applies precedence, deserializes to OutlineConfig.

use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::OutlineConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Builder seeded with `OutlineConfig::default()` so every key has a value
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&OutlineConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> workspace file -> environment (highest).
    pub fn load(root: &Path) -> Result<OutlineConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, root)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Load a specific file with the environment overlay; the file must exist.
    pub fn load_from_file(path: &Path) -> Result<OutlineConfig, ConfigError> {
        let builder = builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}
