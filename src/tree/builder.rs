//! Tree Builder: reads a directory hierarchy into an `OutlineTree`.
//!
//! Hidden entries are skipped, folders sort before files and names compare
//! case- and accent-insensitively. A folder that cannot be listed keeps an
//! empty child list instead of failing the whole build.

use crate::error::StorageError;
use crate::fs::contract::{EntryStat, FsBackend};
use crate::fs::sidecar::read_sidecar;
use crate::tree::hasher::mint_node_id;
use crate::tree::model::{OutlineTree, Position};
use crate::tree::node::{Node, NodeStats};
use crate::tree::path::{compare_names, is_hidden};
use crate::types::{NodeId, NodeKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_SIDECAR_NAME: &str = ".metadata.json";

pub struct TreeBuilder<'a> {
    backend: &'a dyn FsBackend,
    root: PathBuf,
    skip_hidden: bool,
    sidecar_name: String,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(backend: &'a dyn FsBackend, root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            root: root.into(),
            skip_hidden: true,
            sidecar_name: DEFAULT_SIDECAR_NAME.to_string(),
        }
    }

    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    pub fn sidecar_name(mut self, name: impl Into<String>) -> Self {
        self.sidecar_name = name.into();
        self
    }

    /// Build the full tree. Only a failure to stat the root is fatal.
    pub async fn build(&self) -> Result<OutlineTree, StorageError> {
        let stat = self
            .backend
            .stat(&self.root)
            .await
            .map_err(|err| StorageError::io("stat", &self.root, err))?;

        let mut seen = HashSet::new();
        let root = self.make_node(self.root.clone(), stat, &mut seen).await;
        let mut tree = OutlineTree::new(root);

        let mut pending = Vec::new();
        if tree.root().is_folder() {
            pending.push(tree.root_id().clone());
        }
        while let Some(folder_id) = pending.pop() {
            let folder_path = match tree.get(&folder_id) {
                Some(node) => node.path.clone(),
                None => continue,
            };
            for child in self.read_children(&folder_path, &mut seen).await {
                let child_id = child.id.clone();
                let is_folder = child.is_folder();
                if let Err(err) = tree.insert_child(&folder_id, child, Position::End) {
                    warn!(folder = %folder_path.display(), error = %err, "Skipping entry");
                    continue;
                }
                if is_folder {
                    pending.push(child_id);
                }
            }
        }

        debug!(root = %self.root.display(), nodes = tree.len(), "Built outline tree");
        Ok(tree)
    }

    async fn read_children(&self, folder: &Path, seen: &mut HashSet<NodeId>) -> Vec<Node> {
        let names = match self.backend.read_dir(folder).await {
            Ok(names) => names,
            Err(err) => {
                warn!(folder = %folder.display(), error = %err, "Cannot list folder");
                return Vec::new();
            }
        };

        let mut children = Vec::with_capacity(names.len());
        for name in names {
            if name == self.sidecar_name || (self.skip_hidden && is_hidden(&name)) {
                continue;
            }
            let path = folder.join(&name);
            let stat = match self.backend.stat(&path).await {
                Ok(stat) => stat,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Cannot stat entry");
                    continue;
                }
            };
            children.push(self.make_node(path, stat, seen).await);
        }

        children.sort_by(|a, b| {
            b.is_folder()
                .cmp(&a.is_folder())
                .then_with(|| compare_names(&a.name, &b.name))
        });
        children
    }

    async fn make_node(&self, path: PathBuf, stat: EntryStat, seen: &mut HashSet<NodeId>) -> Node {
        let mut id = None;
        let mut display_name = None;

        if stat.kind == NodeKind::Folder {
            match read_sidecar(self.backend, &path, &self.sidecar_name).await {
                Ok(Some(metadata)) => {
                    if seen.contains(&metadata.id) || metadata.id.as_str().is_empty() {
                        warn!(folder = %path.display(), id = %metadata.id, "Duplicate sidecar id, minting a fresh one");
                    } else {
                        id = Some(metadata.id);
                    }
                    display_name = Some(metadata.display_name);
                }
                Ok(None) => {}
                Err(err) => warn!(folder = %path.display(), error = %err, "Ignoring unreadable sidecar"),
            }
        }

        let id = id.unwrap_or_else(|| mint_node_id(&path));
        seen.insert(id.clone());
        let stats = NodeStats {
            size: stat.size,
            created: stat.created,
            modified: stat.modified,
            read_only: stat.read_only,
        };
        Node::new(id, path, stat.kind, stats).with_display_name(display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::{FsOp, MemoryFsBackend};

    fn names(tree: &OutlineTree, id: &NodeId) -> Vec<String> {
        tree.children(id).map(|n| n.name.clone()).collect()
    }

    #[tokio::test]
    async fn folders_first_then_collated_names() {
        let fs = MemoryFsBackend::new()
            .with_file("/r/zeta.txt", "")
            .with_file("/r/Alpha.txt", "")
            .with_dir("/r/beta")
            .with_dir("/r/Ähre")
            .with_file("/r/.hidden", "");
        let tree = TreeBuilder::new(&fs, "/r").build().await.unwrap();
        assert_eq!(
            names(&tree, tree.root_id()),
            vec!["Ähre", "beta", "Alpha.txt", "zeta.txt"]
        );
        assert!(tree.check_invariants().is_ok());
    }

    #[tokio::test]
    async fn hidden_entries_can_be_included_but_sidecar_never_is() {
        let fs = MemoryFsBackend::new()
            .with_file("/r/.hidden", "")
            .with_file("/r/.metadata.json", r#"{"id":"root-id","displayName":"Home"}"#);
        let tree = TreeBuilder::new(&fs, "/r")
            .skip_hidden(false)
            .build()
            .await
            .unwrap();
        assert_eq!(names(&tree, tree.root_id()), vec![".hidden"]);
        assert_eq!(tree.root_id(), &NodeId::new("root-id"));
        assert_eq!(tree.root().label(), "Home");
    }

    #[tokio::test]
    async fn sidecar_ids_are_deduplicated() {
        let sidecar = r#"{"id":"same","displayName":""}"#;
        let fs = MemoryFsBackend::new()
            .with_file("/r/a/.metadata.json", sidecar)
            .with_file("/r/b/.metadata.json", sidecar);
        let tree = TreeBuilder::new(&fs, "/r").build().await.unwrap();
        let ids: Vec<_> = tree.children(tree.root_id()).map(|n| n.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(ids.contains(&NodeId::new("same")));
        assert!(tree.children(tree.root_id()).all(|n| n.display_name.as_deref() == Some("")));
    }

    #[tokio::test]
    async fn unlistable_folder_has_no_children() {
        let fs = MemoryFsBackend::new().with_file("/r/locked/secret.txt", "");
        fs.fail_on(FsOp::ReadDir, "/r/locked");
        let tree = TreeBuilder::new(&fs, "/r").build().await.unwrap();
        let locked = tree.find_by_path(Path::new("locked")).unwrap();
        assert!(locked.children.is_empty());
    }

    #[tokio::test]
    async fn malformed_sidecar_is_ignored() {
        let fs = MemoryFsBackend::new().with_file("/r/a/.metadata.json", "not json");
        let tree = TreeBuilder::new(&fs, "/r").build().await.unwrap();
        let a = tree.find_by_path(Path::new("a")).unwrap();
        assert_eq!(a.display_name, None);
    }

    #[tokio::test]
    async fn missing_root_is_an_io_error() {
        let fs = MemoryFsBackend::new();
        let err = TreeBuilder::new(&fs, "/nope").build().await.unwrap_err();
        assert!(matches!(err, StorageError::Io { op: "stat", .. }));
    }
}
