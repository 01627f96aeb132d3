//! CLI Tooling
//!
//! Each invocation opens the root, runs one command against it and prints a
//! status line, followed by the resulting outline for structural edits.

use crate::config::{ConfigLoader, OutlineConfig};
use crate::edit::{OutlineEditor, Outcome};
use crate::error::ApiError;
use crate::feedback::status_for_outcome;
use crate::fs::TokioFsBackend;
use crate::logging::{LogFormat, LogOutput};
use crate::store::OutlineState;
use crate::tooling::format::{
    format_audit_report, format_outline_html, format_outline_json, format_outline_text,
    format_section_heading,
};
use crate::tree::audit::audit;
use crate::types::{NodeId, NodeKind};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

/// Fliessend - edit a directory as an outline
#[derive(Parser, Debug)]
#[command(name = "fliessend")]
#[command(about = "Edit a directory hierarchy as an outline, keeping tree and filesystem in sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory of the outline
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<LogOutput>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Show the outline
    Tree {
        /// Expand every folder
        #[arg(long)]
        all: bool,
        /// Output format (text, json or html)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a file or folder; without --name a blank folder is made
    Create {
        /// Parent folder, relative to the root (default: the root)
        parent: Option<PathBuf>,
        /// Physical name of the new entry
        #[arg(long)]
        name: Option<String>,
        /// Entry kind (file or folder)
        #[arg(long, default_value = "folder")]
        kind: NodeKind,
    },
    /// Delete an entry and everything below it
    Delete {
        path: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Change an entry's physical name
    Rename { path: PathBuf, new_name: String },
    /// Change an entry's display name (and derive its physical name from it)
    Label { path: PathBuf, display_name: String },
    /// Move an entry into its preceding sibling folder
    Indent { path: PathBuf },
    /// Move an entry out of its parent folder
    Outdent { path: PathBuf },
    /// Fold the SOURCE folder into TARGET
    Merge { source: PathBuf, target: PathBuf },
    /// Open an entry with the platform's default application
    Open { path: PathBuf },
    /// Compare the outline against the filesystem
    Validate,
    /// Print the effective configuration
    Config,
}

/// CLI context for one root
pub struct CliContext {
    root: PathBuf,
    config: OutlineConfig,
    runtime: Runtime,
    editor: OutlineEditor,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let root = dunce::canonicalize(&root).map_err(|e| {
            ApiError::ConfigError(format!("Failed to resolve root {}: {}", root.display(), e))
        })?;
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&root)?,
        };
        Self::with_config(root, config)
    }

    /// Create a context with an already loaded configuration
    pub fn with_config(root: PathBuf, config: OutlineConfig) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to start runtime: {}", e)))?;
        let editor = OutlineEditor::new(Arc::new(TokioFsBackend::new()), config.editor.clone());
        Ok(Self {
            root,
            config,
            runtime,
            editor,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn editor(&self) -> &OutlineEditor {
        &self.editor
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Config => self.handle_config(),
            Commands::Tree { all, format } => {
                self.open()?;
                self.handle_tree(*all, format)
            }
            Commands::Validate => {
                self.open()?;
                self.handle_validate()
            }
            Commands::Delete { path, yes } => {
                self.open()?;
                self.handle_delete(path, *yes)
            }
            edit => {
                self.open()?;
                let outcome = self.runtime.block_on(self.run_edit(edit))?;
                info!(operation = %outcome.operation, changed = outcome.changed, "Command finished");
                self.report(&outcome)
            }
        }
    }

    fn open(&self) -> Result<Outcome, ApiError> {
        self.runtime.block_on(self.editor.open(&self.root))
    }

    fn resolve(&self, path: &Path) -> Result<NodeId, ApiError> {
        self.editor.find(path)
    }

    async fn run_edit(&self, command: &Commands) -> Result<Outcome, ApiError> {
        match command {
            Commands::Create { parent, name, kind } => {
                let parent = self.resolve(parent.as_deref().unwrap_or(Path::new("")))?;
                self.editor.create(&parent, name.as_deref(), *kind).await
            }
            Commands::Rename { path, new_name } => {
                let id = self.resolve(path)?;
                self.editor.rename(&id, new_name).await
            }
            Commands::Label { path, display_name } => {
                let id = self.resolve(path)?;
                self.editor.update_display_name(&id, display_name).await
            }
            Commands::Indent { path } => {
                let id = self.resolve(path)?;
                self.editor.indent(&id).await
            }
            Commands::Outdent { path } => {
                let id = self.resolve(path)?;
                self.editor.outdent(&id).await
            }
            Commands::Merge { source, target } => {
                let source = self.resolve(source)?;
                let target = self.resolve(target)?;
                self.editor.merge(&source, &target).await
            }
            Commands::Open { path } => {
                let id = self.resolve(path)?;
                self.editor.open_externally(&id).await
            }
            other => Err(ApiError::ConfigError(format!(
                "{:?} is not a structural edit",
                other
            ))),
        }
    }

    /// Status line plus the outline as it stands after the edit
    fn report(&self, outcome: &Outcome) -> Result<String, ApiError> {
        let status = status_for_outcome(outcome);
        if !outcome.changed {
            return Ok(status);
        }
        let state = self.editor.snapshot();
        Ok(format!("{}\n\n{}", status, format_outline_text(&state)?))
    }

    fn handle_tree(&self, all: bool, format: &str) -> Result<String, ApiError> {
        let snapshot = self.editor.snapshot();
        let state = if all {
            expand_all(&snapshot)?
        } else {
            OutlineState::clone(&snapshot)
        };
        match format {
            "json" => format_outline_json(&state),
            "html" => Ok(format_outline_html(&state, &self.config.render)),
            "text" => Ok(format!(
                "{}\n\n{}",
                format_section_heading(&self.root.display().to_string()),
                format_outline_text(&state)?
            )),
            other => Err(ApiError::ConfigError(format!(
                "Invalid format: {} (must be 'text', 'json' or 'html')",
                other
            ))),
        }
    }

    fn handle_delete(&self, path: &Path, yes: bool) -> Result<String, ApiError> {
        let id = self.resolve(path)?;
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!("Delete '{}' and everything inside it?", path.display()))
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Deletion cancelled".to_string());
            }
        }
        let outcome = self.runtime.block_on(self.editor.delete(&id))?;
        self.report(&outcome)
    }

    fn handle_validate(&self) -> Result<String, ApiError> {
        let snapshot = self.editor.snapshot();
        let settings = &self.config.editor;
        let report = audit(
            snapshot.tree()?,
            settings.skip_hidden,
            &settings.sidecar_file_name,
        )?;
        Ok(format_audit_report(&report))
    }

    fn handle_config(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(&self.config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

fn expand_all(state: &OutlineState) -> Result<OutlineState, ApiError> {
    let mut expanded = state.clone();
    expanded.expanded = state
        .tree()?
        .walk()
        .into_iter()
        .filter(|node| node.is_folder())
        .map(|node| node.id.clone())
        .collect();
    Ok(expanded)
}
