//! State Store
//!
//! Holds the current `OutlineState` snapshot and notifies subscribers after
//! each change. State only changes through `Action`s folded in by the pure
//! `reduce` function, so a test can drive the store from hand-made snapshots.
//!
//! Edits are applied to whatever snapshot is current when they are
//! dispatched, so concurrent operations land in completion order.

use crate::error::ApiError;
use crate::tree::model::{OutlineTree, Position};
use crate::tree::node::Node;
use crate::types::NodeId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Tree plus the view state around it
#[derive(Debug, Clone, Default)]
pub struct OutlineState {
    pub tree: Option<Arc<OutlineTree>>,
    pub expanded: HashSet<NodeId>,
    pub selected: Option<NodeId>,
}

impl OutlineState {
    pub fn tree(&self) -> Result<&OutlineTree, ApiError> {
        self.tree.as_deref().ok_or(ApiError::NoTreeLoaded)
    }

    pub fn root_path(&self) -> Option<&std::path::Path> {
        self.tree.as_deref().map(|t| t.root().path.as_path())
    }

    pub fn selected_node(&self) -> Option<&Node> {
        let id = self.selected.as_ref()?;
        self.tree.as_deref()?.get(id)
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    /// Visible nodes in display order
    pub fn visible(&self) -> Vec<&Node> {
        self.tree
            .as_deref()
            .map(|t| t.visible(&self.expanded))
            .unwrap_or_default()
    }
}

/// A completed structural change, described after the filesystem succeeded
#[derive(Debug, Clone)]
pub enum Edit {
    Inserted {
        parent: NodeId,
        node: Node,
    },
    Removed {
        id: NodeId,
    },
    /// Physical rename; descendants follow
    Renamed {
        id: NodeId,
        path: PathBuf,
    },
    Relabeled {
        id: NodeId,
        display_name: Option<String>,
        path: PathBuf,
    },
    Moved {
        id: NodeId,
        new_parent: NodeId,
        position: Position,
        path: PathBuf,
    },
    Merged {
        source: NodeId,
        target: NodeId,
        display_name: Option<String>,
        target_path: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Replace the tree; the root becomes selected and expanded
    Load(OutlineTree),
    Select(NodeId),
    ToggleExpanded(NodeId),
    Expand(NodeId),
    NavigateUp,
    NavigateDown,
    Apply(Edit),
}

/// Fold `action` into `state`, producing the next snapshot
pub fn reduce(state: &OutlineState, action: Action) -> Result<OutlineState, ApiError> {
    let mut next = state.clone();
    match action {
        Action::Load(tree) => {
            let root = tree.root_id().clone();
            next.expanded = HashSet::from([root.clone()]);
            next.selected = Some(root);
            next.tree = Some(Arc::new(tree));
        }
        Action::Select(id) => {
            next.tree()?.node(&id)?;
            next.selected = Some(id);
        }
        Action::ToggleExpanded(id) => {
            if next.tree()?.node(&id)?.is_folder() && !next.expanded.remove(&id) {
                next.expanded.insert(id);
            }
        }
        Action::Expand(id) => {
            if next.tree()?.node(&id)?.is_folder() {
                next.expanded.insert(id);
            }
        }
        Action::NavigateUp => navigate(&mut next, -1)?,
        Action::NavigateDown => navigate(&mut next, 1)?,
        Action::Apply(edit) => apply_edit(&mut next, edit)?,
    }
    Ok(next)
}

fn navigate(state: &mut OutlineState, step: isize) -> Result<(), ApiError> {
    let target = {
        let visible = state.tree()?.visible(&state.expanded);
        let current = state
            .selected
            .as_ref()
            .and_then(|id| visible.iter().position(|n| n.id == *id));
        match current {
            None => visible.first().map(|n| n.id.clone()),
            Some(index) => index
                .checked_add_signed(step)
                .and_then(|i| visible.get(i))
                .map(|n| n.id.clone()),
        }
    };
    if let Some(id) = target {
        state.selected = Some(id);
    }
    Ok(())
}

fn apply_edit(state: &mut OutlineState, edit: Edit) -> Result<(), ApiError> {
    let tree_arc = state.tree.as_mut().ok_or(ApiError::NoTreeLoaded)?;
    let tree = Arc::make_mut(tree_arc);
    match edit {
        Edit::Inserted { parent, node } => {
            let id = node.id.clone();
            tree.insert_child(&parent, node, Position::End)?;
            state.expanded.insert(parent);
            state.selected = Some(id);
        }
        Edit::Removed { id } => {
            let parent = tree.parent(&id).map(|p| p.id.clone());
            let removed = tree.remove_subtree(&id)?;
            for gone in &removed {
                state.expanded.remove(gone);
            }
            if parent.is_some() {
                state.selected = parent;
            }
        }
        Edit::Renamed { id, path } => {
            tree.rebase(&id, path)?;
            state.selected = Some(id);
        }
        Edit::Relabeled {
            id,
            display_name,
            path,
        } => {
            tree.rebase(&id, path)?;
            tree.set_display_name(&id, display_name)?;
            state.selected = Some(id);
        }
        Edit::Moved {
            id,
            new_parent,
            position,
            path,
        } => {
            tree.relocate(&id, &new_parent, position, path)?;
            state.expanded.insert(new_parent);
            state.selected = Some(id);
        }
        Edit::Merged {
            source,
            target,
            display_name,
            target_path,
        } => {
            tree.absorb(&source, &target)?;
            tree.rebase(&target, target_path)?;
            tree.set_display_name(&target, display_name)?;
            state.expanded.remove(&source);
            state.expanded.insert(target.clone());
            state.selected = Some(target);
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Arc<OutlineState>) + Send + Sync>;

/// Owned state cell with subscribers
pub struct StateStore {
    state: RwLock<Arc<OutlineState>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: Mutex<u64>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(OutlineState::default())
    }
}

impl StateStore {
    pub fn new(initial: OutlineState) -> Self {
        Self {
            state: RwLock::new(Arc::new(initial)),
            listeners: Mutex::new(Vec::new()),
            next_id: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Arc<OutlineState> {
        self.state.read().clone()
    }

    /// Reduce `action` into the current snapshot and notify subscribers.
    /// On error the snapshot is unchanged and nobody is notified.
    pub fn dispatch(&self, action: Action) -> Result<Arc<OutlineState>, ApiError> {
        let next = {
            let mut guard = self.state.write();
            let next = Arc::new(reduce(&guard, action)?);
            *guard = next.clone();
            next
        };
        self.notify(&next);
        Ok(next)
    }

    /// Install a snapshot directly
    pub fn replace(&self, state: OutlineState) -> Arc<OutlineState> {
        let next = Arc::new(state);
        *self.state.write() = next.clone();
        self.notify(&next);
        next
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Arc<OutlineState>) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            SubscriptionId(*next)
        };
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, state: &Arc<OutlineState>) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        debug!(listeners = listeners.len(), "Publishing outline snapshot");
        for listener in listeners {
            listener(state);
        }
    }
}
