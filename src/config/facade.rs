//! ConfigLoader facade delegating to the merge service.

use super::merge::MergeService;
use super::OutlineConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration for the outline rooted at `root`.
    pub fn load(root: &Path) -> Result<OutlineConfig, ApiError> {
        let config = MergeService::load(root).map_err(|e| ApiError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<OutlineConfig, ApiError> {
        let config = MergeService::load_from_file(path)
            .map_err(|e| ApiError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> OutlineConfig {
        OutlineConfig::default()
    }
}
