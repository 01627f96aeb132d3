//! Configuration
//!
//! `OutlineConfig` is assembled by `ConfigLoader` from built-in defaults, the
//! global config file, the root's `.fliessend.toml` and `FLIESSEND__*`
//! environment variables, in that order of increasing precedence.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::render::diff::DiffStrategy;
use crate::tree::path::is_hidden;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlineConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OutlineConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.editor.validate()?;
        self.render.validate()?;
        crate::logging::validate(&self.logging)
    }
}

/// Structural edit settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Per-folder metadata file holding id and display name
    pub sidecar_file_name: String,
    /// Base physical name for blank folders
    pub blank_folder_base: String,
    /// Characters of a display name used to derive the physical name
    pub display_name_max_chars: usize,
    /// Leave dot-entries out of the outline
    pub skip_hidden: bool,
    /// Undo already-applied steps when a multi-step edit fails
    pub compensate_on_failure: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            sidecar_file_name: ".metadata.json".to_string(),
            blank_folder_base: "new-folder".to_string(),
            display_name_max_chars: 32,
            skip_hidden: true,
            compensate_on_failure: true,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.blank_folder_base.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "editor.blank_folder_base must not be empty".to_string(),
            ));
        }
        if self.blank_folder_base.contains(['/', '\\']) {
            return Err(ApiError::ConfigError(format!(
                "editor.blank_folder_base must be a plain name, got {}",
                self.blank_folder_base
            )));
        }
        if self.display_name_max_chars == 0 {
            return Err(ApiError::ConfigError(
                "editor.display_name_max_chars must be at least 1".to_string(),
            ));
        }
        if !is_hidden(&self.sidecar_file_name) || self.sidecar_file_name.contains(['/', '\\']) {
            return Err(ApiError::ConfigError(format!(
                "editor.sidecar_file_name must be a hidden file name, got {}",
                self.sidecar_file_name
            )));
        }
        Ok(())
    }
}

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub strategy: DiffStrategy,
    /// Horizontal indent per depth level
    pub indent_px: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            strategy: DiffStrategy::Keyed,
            indent_px: 20,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.indent_px > 200 {
            return Err(ApiError::ConfigError(format!(
                "render.indent_px must be at most 200, got {}",
                self.indent_px
            )));
        }
        Ok(())
    }
}
