//! Structural Edit Protocol
//!
//! Each operation reads the current snapshot, performs its filesystem calls
//! through `OutlineFs`, and only then folds an `Edit` into the store. A failed
//! filesystem step leaves the snapshot untouched. Multi-step operations keep a
//! `Journal` and undo applied steps when `compensate_on_failure` is set.

mod create;
mod delete;
mod merge;
mod movement;
mod rename;

use crate::config::EditorConfig;
use crate::error::ApiError;
use crate::fs::{FsBackend, Journal, OutlineFs};
use crate::store::{Action, Edit, OutlineState, StateStore};
use crate::tree::node::Node;
use crate::types::NodeId;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Which operation produced an `Outcome`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Create,
    Delete,
    Rename,
    Relabel,
    Indent,
    Outdent,
    Merge,
    OpenExternally,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Rename => "rename",
            Operation::Relabel => "relabel",
            Operation::Indent => "indent",
            Operation::Outdent => "outdent",
            Operation::Merge => "merge",
            Operation::OpenExternally => "open-externally",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub operation: Operation,
    /// The node the operation was about (the merge target for merges)
    pub node: NodeId,
    /// Its label once the operation finished
    pub label: String,
    /// Its path once the operation finished
    pub path: PathBuf,
    /// False when the request matched the current state and nothing was done
    pub changed: bool,
}

impl Outcome {
    fn of(operation: Operation, node: &Node) -> Self {
        Self {
            operation,
            node: node.id.clone(),
            label: node.label().to_string(),
            path: node.path.clone(),
            changed: true,
        }
    }

    fn unchanged(operation: Operation, node: &Node) -> Self {
        Self {
            changed: false,
            ..Self::of(operation, node)
        }
    }
}

/// Drives structural edits for one opened root
pub struct OutlineEditor {
    backend: Arc<dyn FsBackend>,
    store: Arc<StateStore>,
    config: EditorConfig,
}

impl OutlineEditor {
    pub fn new(backend: Arc<dyn FsBackend>, config: EditorConfig) -> Self {
        Self::with_store(backend, Arc::new(StateStore::default()), config)
    }

    /// Drive an existing store, e.g. one a renderer is already attached to
    pub fn with_store(
        backend: Arc<dyn FsBackend>,
        store: Arc<StateStore>,
        config: EditorConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<OutlineState> {
        self.store.snapshot()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn outline_fs(&self, root: impl Into<PathBuf>) -> OutlineFs {
        OutlineFs::new(self.backend.clone(), root, self.config.clone())
    }

    /// Current snapshot plus an adapter bound to its root
    fn session(&self) -> Result<(Arc<OutlineState>, OutlineFs), ApiError> {
        let snapshot = self.store.snapshot();
        let root = snapshot.root_path().ok_or(ApiError::NoTreeLoaded)?.to_path_buf();
        Ok((snapshot, self.outline_fs(root)))
    }

    fn commit(&self, edit: Edit) -> Result<Arc<OutlineState>, ApiError> {
        self.store.dispatch(Action::Apply(edit))
    }

    /// Resolve the outcome for `id` in a freshly committed snapshot
    fn outcome(
        &self,
        operation: Operation,
        state: &OutlineState,
        id: &NodeId,
    ) -> Result<Outcome, ApiError> {
        let outcome = Outcome::of(operation, state.tree()?.node(id)?);
        info!(
            operation = %operation,
            node = %outcome.node.short(),
            path = %outcome.path.display(),
            "Structural edit applied"
        );
        Ok(outcome)
    }

    /// Resolve a failed multi-step operation: undo what the journal recorded
    /// when compensation is enabled, and report if even that failed.
    async fn settle(&self, fs: &OutlineFs, journal: Journal, err: ApiError) -> ApiError {
        if journal.is_empty() {
            return err;
        }
        if !self.config.compensate_on_failure {
            warn!(steps = journal.len(), error = %err, "Leaving partially applied edit in place");
            return err;
        }
        let failures = fs.compensate(journal).await;
        if failures.is_empty() {
            err
        } else {
            error!(failures = failures.len(), error = %err, "Edit could not be rolled back");
            ApiError::Inconsistent {
                cause: Box::new(err),
                compensation_failures: failures,
            }
        }
    }

    /// Build the outline for `root` and make it the current tree
    pub async fn open(&self, root: impl AsRef<Path>) -> Result<Outcome, ApiError> {
        let fs = self.outline_fs(root.as_ref());
        let tree = fs.build_tree().await?;
        let nodes = tree.len();
        let state = self.store.dispatch(Action::Load(tree))?;
        let tree = state.tree()?;
        info!(root = %root.as_ref().display(), nodes, "Opened outline");
        Ok(Outcome::of(Operation::Open, tree.root()))
    }

    /// Rebuild the current root from disk
    pub async fn reload(&self) -> Result<Outcome, ApiError> {
        let (_, fs) = self.session()?;
        self.open(fs.root()).await
    }

    /// Hand the node's path to the platform opener. The tree is not touched.
    pub async fn open_externally(&self, id: &NodeId) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let node = snapshot.tree()?.node(id)?;
        fs.open_externally(&node.path).await?;
        info!(path = %node.path.display(), "Opened externally");
        Ok(Outcome::unchanged(Operation::OpenExternally, node))
    }

    pub fn select(&self, id: &NodeId) -> Result<Arc<OutlineState>, ApiError> {
        self.store.dispatch(Action::Select(id.clone()))
    }

    pub fn toggle_expanded(&self, id: &NodeId) -> Result<Arc<OutlineState>, ApiError> {
        self.store.dispatch(Action::ToggleExpanded(id.clone()))
    }

    pub fn navigate_up(&self) -> Result<Arc<OutlineState>, ApiError> {
        self.store.dispatch(Action::NavigateUp)
    }

    pub fn navigate_down(&self) -> Result<Arc<OutlineState>, ApiError> {
        self.store.dispatch(Action::NavigateDown)
    }

    /// Look a node up by its path relative to the root
    pub fn find(&self, relative: impl AsRef<Path>) -> Result<NodeId, ApiError> {
        let snapshot = self.store.snapshot();
        let tree = snapshot.tree()?;
        tree.find_by_path(relative.as_ref())
            .map(|node| node.id.clone())
            .ok_or_else(|| ApiError::NodeNotFound(NodeId::new(relative.as_ref().to_string_lossy())))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::fs::{FsOp, MemoryFsBackend};

    #[tokio::test]
    async fn open_selects_and_expands_root() {
        let (_, editor) = opened(MemoryFsBackend::new().with_file("/r/A/b.txt", "")).await;
        let state = editor.snapshot();
        let root = state.tree().unwrap().root_id().clone();
        assert_eq!(state.selected, Some(root.clone()));
        assert!(state.is_expanded(&root));
        assert_eq!(state.tree().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn edits_need_an_open_tree() {
        let (_, editor) = editor(MemoryFsBackend::new());
        let err = editor.delete(&NodeId::new("x")).await.unwrap_err();
        assert!(matches!(err, ApiError::NoTreeLoaded));
    }

    #[tokio::test]
    async fn open_externally_leaves_tree_alone() {
        let (backend, editor) = opened(MemoryFsBackend::new().with_file("/r/a.txt", "")).await;
        let before = editor.snapshot();
        let a = id(&editor, "a.txt");
        let outcome = editor.open_externally(&a).await.unwrap();
        assert!(!outcome.changed);
        assert_eq!(backend.opened(), vec![PathBuf::from("/r/a.txt")]);

        backend.fail_on(FsOp::Open, "/r/a.txt");
        let err = editor.open_externally(&a).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));
    }

    #[tokio::test]
    async fn navigation_follows_visible_order() {
        let (_, editor) = opened(
            MemoryFsBackend::new()
                .with_file("/r/A/b.txt", "")
                .with_file("/r/c.txt", ""),
        )
        .await;
        let a = id(&editor, "A");
        editor.navigate_down().unwrap();
        assert_eq!(editor.snapshot().selected, Some(a.clone()));
        editor.toggle_expanded(&a).unwrap();
        editor.navigate_down().unwrap();
        assert_eq!(editor.snapshot().selected, Some(id(&editor, "A/b.txt")));
        editor.navigate_up().unwrap();
        editor.navigate_up().unwrap();
        assert_eq!(
            editor.snapshot().selected.as_ref(),
            Some(editor.snapshot().tree().unwrap().root_id())
        );
    }

    #[tokio::test]
    async fn reload_picks_up_outside_changes() {
        let (backend, editor) = opened(MemoryFsBackend::new().with_dir("/r/A")).await;
        backend.create_file(Path::new("/r/A/new.txt")).await.unwrap();
        editor.reload().await.unwrap();
        assert!(editor.find("A/new.txt").is_ok());
    }
}
