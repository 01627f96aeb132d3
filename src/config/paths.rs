//! Platform locations for configuration and state.

use crate::error::ApiError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Per-root override file; hidden so it never shows up in the outline
pub const WORKSPACE_FILE_NAME: &str = ".fliessend.toml";

pub fn project_dirs() -> Result<ProjectDirs, ApiError> {
    ProjectDirs::from("", "fliessend", "fliessend").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform directories (HOME not set)".to_string())
    })
}

/// `<config dir>/config.toml`, or None when no home directory is known
pub fn global_config_path() -> Option<PathBuf> {
    project_dirs()
        .ok()
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn workspace_config_path(root: &Path) -> PathBuf {
    root.join(WORKSPACE_FILE_NAME)
}
