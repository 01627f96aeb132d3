//! Outline tree: arena of nodes keyed by id, with ordered child lists and
//! parent back-references.
//!
//! All mutation goes through methods that keep the invariants below; callers
//! never edit `children`/`parent_id` directly.
//!
//! 1. exactly one root, without a parent
//! 2. ids are unique
//! 3. a non-root node's path is its parent's path joined with its name
//! 4. moving or renaming a folder re-derives every descendant path
//! 5. sibling names are unique
//! 6. files have no children

use crate::error::{ApiError, InvalidOperation, StorageError};
use crate::tree::node::{base_name, Node};
use crate::types::NodeId;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Where a node is placed among its new siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    End,
    At(usize),
    /// Directly after the given sibling; appended if it is not a sibling
    After(NodeId),
}

#[derive(Debug, Clone)]
pub struct OutlineTree {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
}

impl OutlineTree {
    pub fn new(mut root: Node) -> Self {
        root.parent_id = None;
        root.children.clear();
        let id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(id.clone(), root);
        Self { root: id, nodes }
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn is_root(&self, id: &NodeId) -> bool {
        *id == self.root
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a node or fail with `NodeNotFound`
    pub fn node(&self, id: &NodeId) -> Result<&Node, ApiError> {
        self.nodes
            .get(id)
            .ok_or_else(|| ApiError::NodeNotFound(id.clone()))
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, ApiError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| ApiError::NodeNotFound(id.clone()))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: &NodeId) -> Option<&Node> {
        self.nodes
            .get(id)?
            .parent_id
            .as_ref()
            .and_then(|p| self.nodes.get(p))
    }

    pub fn children(&self, id: &NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |c| self.nodes.get(c))
    }

    /// Position of `id` among its siblings
    pub fn index_in_parent(&self, id: &NodeId) -> Option<usize> {
        self.parent(id)?.children.iter().position(|c| c == id)
    }

    /// Sibling immediately before `id`, if any
    pub fn previous_sibling(&self, id: &NodeId) -> Option<&Node> {
        let parent = self.parent(id)?;
        let index = parent.children.iter().position(|c| c == id)?;
        if index == 0 {
            return None;
        }
        self.nodes.get(&parent.children[index - 1])
    }

    pub fn depth(&self, id: &NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(node) = current {
            depth += 1;
            current = self.parent(&node.id);
        }
        depth
    }

    pub fn is_ancestor_of(&self, ancestor: &NodeId, descendant: &NodeId) -> bool {
        let mut current = self.parent(descendant);
        while let Some(node) = current {
            if node.id == *ancestor {
                return true;
            }
            current = self.parent(&node.id);
        }
        false
    }

    /// Pre-order list of `id` and everything below it
    pub fn subtree(&self, id: &NodeId) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                out.push(node);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Pre-order walk of the whole tree
    pub fn walk(&self) -> Vec<&Node> {
        self.subtree(&self.root)
    }

    /// Nodes the user can see: pre-order, descending only into expanded folders
    pub fn visible(&self, expanded: &HashSet<NodeId>) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                out.push(node);
                if node.is_folder() && expanded.contains(&node.id) {
                    stack.extend(node.children.iter().rev());
                }
            }
        }
        out
    }

    /// Find a node by absolute path or by path relative to the root
    pub fn find_by_path(&self, path: &Path) -> Option<&Node> {
        let root = self.root();
        let relative = if path.is_absolute() {
            path.strip_prefix(&root.path).ok()?
        } else {
            path
        };

        let mut current = root;
        for component in relative.components() {
            match component {
                std::path::Component::CurDir => continue,
                std::path::Component::Normal(part) => {
                    let part = part.to_string_lossy();
                    current = self.children(&current.id).find(|c| c.name == part)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Insert `node` (without children) under `parent`. Its path is derived
    /// from the parent path and the node's name.
    pub fn insert_child(
        &mut self,
        parent: &NodeId,
        mut node: Node,
        position: Position,
    ) -> Result<(), ApiError> {
        if self.nodes.contains_key(&node.id) {
            return Err(InvalidOperation::DuplicateId.into());
        }
        let parent_node = self.node(parent)?;
        if !parent_node.is_folder() {
            return Err(InvalidOperation::TargetIsFile.into());
        }
        let path = parent_node.path.join(&node.name);
        if self.children(parent).any(|c| c.name == node.name) {
            return Err(StorageError::AlreadyExists { path }.into());
        }

        node.children.clear();
        node.parent_id = Some(parent.clone());
        node.set_path(path);
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.attach(parent, id, position)
    }

    fn attach(&mut self, parent: &NodeId, id: NodeId, position: Position) -> Result<(), ApiError> {
        let parent_node = self.node_mut(parent)?;
        let index = match position {
            Position::End => parent_node.children.len(),
            Position::At(i) => i.min(parent_node.children.len()),
            Position::After(sibling) => parent_node
                .children
                .iter()
                .position(|c| *c == sibling)
                .map(|i| i + 1)
                .unwrap_or(parent_node.children.len()),
        };
        parent_node.children.insert(index, id);
        Ok(())
    }

    fn detach(&mut self, id: &NodeId) -> Result<(), ApiError> {
        let parent_id = self
            .node(id)?
            .parent_id
            .clone()
            .ok_or(InvalidOperation::RootImmutable)?;
        let parent = self.node_mut(&parent_id)?;
        parent.children.retain(|c| c != id);
        Ok(())
    }

    /// Remove `id` and its descendants. Returns every removed id.
    pub fn remove_subtree(&mut self, id: &NodeId) -> Result<Vec<NodeId>, ApiError> {
        if self.is_root(id) {
            return Err(InvalidOperation::RootImmutable.into());
        }
        self.detach(id)?;
        let removed: Vec<NodeId> = self.subtree(id).into_iter().map(|n| n.id.clone()).collect();
        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }
        Ok(removed)
    }

    /// Move `id` under `new_parent` at `position`, now living at `new_path`.
    /// Descendant paths follow.
    pub fn relocate(
        &mut self,
        id: &NodeId,
        new_parent: &NodeId,
        position: Position,
        new_path: PathBuf,
    ) -> Result<(), ApiError> {
        if self.is_root(id) {
            return Err(InvalidOperation::RootImmutable.into());
        }
        if id == new_parent || self.is_ancestor_of(id, new_parent) {
            return Err(InvalidOperation::MergeIntoDescendant.into());
        }
        let target = self.node(new_parent)?;
        if !target.is_folder() {
            return Err(InvalidOperation::TargetIsFile.into());
        }
        let name = base_name(&new_path);
        if target.path.join(&name) != new_path {
            return Err(StorageError::TraversalRejected {
                path: new_path,
                boundary: target.path.clone(),
            }
            .into());
        }
        if self.children(new_parent).any(|c| c.name == name && c.id != *id) {
            return Err(StorageError::AlreadyExists { path: new_path }.into());
        }

        self.detach(id)?;
        self.node_mut(id)?.parent_id = Some(new_parent.clone());
        self.attach(new_parent, id.clone(), position)?;
        self.rebase(id, new_path)
    }

    /// Give `id` a new path and re-derive the paths of all its descendants
    pub fn rebase(&mut self, id: &NodeId, new_path: PathBuf) -> Result<(), ApiError> {
        if let Some(parent) = self.parent(id) {
            let name = base_name(&new_path);
            if self.children(&parent.id).any(|c| c.name == name && c.id != *id) {
                return Err(StorageError::AlreadyExists { path: new_path }.into());
            }
        }
        self.node_mut(id)?.set_path(new_path);

        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let (parent_path, children) = {
                let node = self.node(&current)?;
                (node.path.clone(), node.children.clone())
            };
            for child in children {
                let child_node = self.node_mut(&child)?;
                let path = parent_path.join(&child_node.name);
                child_node.set_path(path);
                stack.push(child);
            }
        }
        Ok(())
    }

    pub fn set_display_name(
        &mut self,
        id: &NodeId,
        display_name: Option<String>,
    ) -> Result<(), ApiError> {
        self.node_mut(id)?.display_name = display_name;
        Ok(())
    }

    /// Fold `source` into `target`: source children are appended to target's
    /// children in order and `source` leaves the tree.
    pub fn absorb(&mut self, source: &NodeId, target: &NodeId) -> Result<(), ApiError> {
        if source == target {
            return Err(InvalidOperation::MergeIntoSelf.into());
        }
        if self.is_root(source) || self.is_root(target) {
            return Err(InvalidOperation::RootImmutable.into());
        }
        if self.is_ancestor_of(source, target) {
            return Err(InvalidOperation::MergeIntoDescendant.into());
        }
        if !self.node(target)?.is_folder() {
            return Err(InvalidOperation::NotAFolder.into());
        }
        let moved = self.node(source)?.children.clone();
        for child in &moved {
            let name = &self.node(child)?.name;
            if self.children(target).any(|c| c.name == *name) {
                let path = self.node(target)?.path.join(name);
                return Err(StorageError::AlreadyExists { path }.into());
            }
        }

        self.detach(source)?;
        for child in &moved {
            self.node_mut(child)?.parent_id = Some(target.clone());
        }
        self.node_mut(target)?.children.extend(moved);
        self.nodes.remove(source);

        let target_path = self.node(target)?.path.clone();
        self.rebase(target, target_path)
    }

    /// Check invariants 1-6; returns every violation found
    pub fn check_invariants(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        let root = self.root();
        if root.parent_id.is_some() {
            violations.push("root has a parent".to_string());
        }

        let mut seen = HashSet::new();
        let mut stack = vec![&self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                violations.push(format!("node {} reachable twice", id));
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                violations.push(format!("dangling child id {}", id));
                continue;
            };
            if node.id != *id {
                violations.push(format!("node stored under {} has id {}", id, node.id));
            }
            if node.name != base_name(&node.path) {
                violations.push(format!("{} name {} does not match path", id, node.name));
            }
            if node.kind.is_file() && !node.children.is_empty() {
                violations.push(format!("file {} has children", node.path.display()));
            }
            let mut names = HashSet::new();
            for child_id in &node.children {
                let Some(child) = self.nodes.get(child_id) else {
                    continue;
                };
                if child.parent_id.as_ref() != Some(id) {
                    violations.push(format!("{} has wrong parent back-reference", child.path.display()));
                }
                if child.path != node.path.join(&child.name) {
                    violations.push(format!(
                        "{} is not under {}",
                        child.path.display(),
                        node.path.display()
                    ));
                }
                if !names.insert(child.name.as_str()) {
                    violations.push(format!("duplicate name {} under {}", child.name, node.path.display()));
                }
            }
            stack.extend(node.children.iter());
        }
        if seen.len() != self.nodes.len() {
            violations.push(format!(
                "{} nodes stored but {} reachable",
                self.nodes.len(),
                seen.len()
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
