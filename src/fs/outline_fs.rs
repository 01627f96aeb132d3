//! Filesystem Adapter for one opened root.
//!
//! Every path handed in must lie inside the root; every destination is
//! checked for collisions before the backend is asked to change anything.

use crate::config::EditorConfig;
use crate::error::{ApiError, InvalidOperation, StorageError};
use crate::fs::contract::FsBackend;
use crate::fs::journal::{Compensation, Journal};
use crate::fs::sidecar::{sidecar_path, upsert_display_name, write_sidecar, SidecarMetadata};
use crate::tree::builder::TreeBuilder;
use crate::tree::hasher::mint_node_id;
use crate::tree::model::OutlineTree;
use crate::tree::node::{base_name, Node, NodeStats};
use crate::tree::path::{
    child_path, ensure_within, is_within, numbered_candidates, sanitize_display_name,
    split_extension,
};
use crate::types::{NodeId, NodeKind};
use futures::future::try_join_all;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on `name (n)` probing before giving up with `AlreadyExists`
const MAX_PROBES: usize = 10_000;

fn map_io(op: &'static str, path: &Path, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::AlreadyExists {
        StorageError::AlreadyExists {
            path: path.to_path_buf(),
        }
    } else {
        StorageError::io(op, path, err)
    }
}

#[derive(Clone)]
pub struct OutlineFs {
    backend: Arc<dyn FsBackend>,
    root: PathBuf,
    settings: EditorConfig,
}

impl OutlineFs {
    pub fn new(backend: Arc<dyn FsBackend>, root: impl Into<PathBuf>, settings: EditorConfig) -> Self {
        Self {
            backend,
            root: root.into(),
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backend(&self) -> &dyn FsBackend {
        self.backend.as_ref()
    }

    pub fn settings(&self) -> &EditorConfig {
        &self.settings
    }

    /// Strictly below the root; the root itself is never a valid target
    fn ensure_inside(&self, path: &Path) -> Result<(), StorageError> {
        ensure_within(path, &self.root)?;
        if path == self.root {
            return Err(StorageError::TraversalRejected {
                path: path.to_path_buf(),
                boundary: self.root.clone(),
            });
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        self.backend
            .exists(path)
            .await
            .map_err(|err| StorageError::io("exists", path, err))
    }

    async fn stats(&self, path: &Path) -> NodeStats {
        match self.backend.stat(path).await {
            Ok(stat) => NodeStats {
                size: stat.size,
                created: stat.created,
                modified: stat.modified,
                read_only: stat.read_only,
            },
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Stat after create failed");
                NodeStats::default()
            }
        }
    }

    pub async fn build_tree(&self) -> Result<OutlineTree, StorageError> {
        TreeBuilder::new(self.backend.as_ref(), self.root.clone())
            .skip_hidden(self.settings.skip_hidden)
            .sidecar_name(self.settings.sidecar_file_name.clone())
            .build()
            .await
    }

    /// Create an entry under `parent`. Without a name a blank folder is made:
    /// the first free `new-folder`, `new-folder (1)`, ... plus a sidecar with a
    /// fresh id and an empty display name.
    pub async fn create(
        &self,
        parent: &Path,
        name: Option<&str>,
        kind: NodeKind,
    ) -> Result<Node, ApiError> {
        ensure_within(parent, &self.root)?;
        match name {
            Some(name) => Ok(self.create_named(parent, name, kind).await?),
            None if kind.is_file() => Err(InvalidOperation::BlankFileUnsupported.into()),
            None => Ok(self.create_blank(parent).await?),
        }
    }

    async fn create_named(
        &self,
        parent: &Path,
        name: &str,
        kind: NodeKind,
    ) -> Result<Node, StorageError> {
        let path = child_path(parent, name)?;
        if self.exists(&path).await? {
            return Err(StorageError::AlreadyExists { path });
        }
        let created = match kind {
            NodeKind::Folder => self.backend.create_dir(&path).await,
            NodeKind::File => self.backend.create_file(&path).await,
        };
        created.map_err(|err| map_io("create", &path, err))?;

        let stats = self.stats(&path).await;
        Ok(Node::new(mint_node_id(&path), path, kind, stats))
    }

    async fn create_blank(&self, parent: &Path) -> Result<Node, StorageError> {
        let base = &self.settings.blank_folder_base;
        let mut chosen = None;
        for candidate in numbered_candidates(base, None).take(MAX_PROBES) {
            let path = child_path(parent, &candidate)?;
            if !self.exists(&path).await? {
                chosen = Some(path);
                break;
            }
            debug!(candidate = %candidate, "Blank name taken");
        }
        let path = chosen.ok_or_else(|| StorageError::AlreadyExists {
            path: parent.join(base),
        })?;

        self.backend
            .create_dir(&path)
            .await
            .map_err(|err| map_io("create", &path, err))?;

        let id = mint_node_id(&path);
        let metadata = SidecarMetadata {
            id: id.clone(),
            display_name: String::new(),
        };
        let sidecar = self.settings.sidecar_file_name.as_str();
        if let Err(err) = write_sidecar(self.backend.as_ref(), &path, sidecar, &metadata).await {
            if let Err(cleanup) = self.backend.remove(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Could not remove half-created folder");
            }
            return Err(err);
        }

        let stats = self.stats(&path).await;
        Ok(Node::new(id, path, NodeKind::Folder, stats).with_display_name(Some(String::new())))
    }

    /// Recursive, forced removal
    pub async fn remove(&self, path: &Path) -> Result<(), StorageError> {
        self.ensure_inside(path)?;
        self.backend
            .remove(path)
            .await
            .map_err(|err| StorageError::io("remove", path, err))
    }

    /// Rename `old` to `new` without overwriting anything
    pub async fn rename(&self, old: &Path, new: &Path) -> Result<PathBuf, StorageError> {
        self.ensure_inside(old)?;
        self.ensure_inside(new)?;
        if self.exists(new).await? {
            return Err(StorageError::AlreadyExists {
                path: new.to_path_buf(),
            });
        }
        self.backend
            .rename(old, new)
            .await
            .map_err(|err| map_io("rename", new, err))?;
        Ok(new.to_path_buf())
    }

    /// Move `source` into `dest_parent`, keeping its name
    pub async fn move_entry(&self, source: &Path, dest_parent: &Path) -> Result<PathBuf, StorageError> {
        self.ensure_inside(source)?;
        ensure_within(dest_parent, &self.root)?;
        if is_within(dest_parent, source) {
            return Err(StorageError::TraversalRejected {
                path: dest_parent.to_path_buf(),
                boundary: source.to_path_buf(),
            });
        }
        let dest = child_path(dest_parent, &base_name(source))?;
        if self.exists(&dest).await? {
            return Err(StorageError::AlreadyExists { path: dest });
        }
        self.backend
            .rename(source, &dest)
            .await
            .map_err(|err| map_io("move", &dest, err))?;
        Ok(dest)
    }

    /// Record `display_name` for the entry at `path` and rename it to a
    /// physical name derived from the label. Folders keep the label in their
    /// sidecar; files keep their extension. Every applied step is journaled.
    ///
    /// Returns the entry's path afterwards, unchanged when the label yields no
    /// usable name or the current name already matches.
    pub async fn update_display_name(
        &self,
        path: &Path,
        kind: NodeKind,
        id: &NodeId,
        display_name: &str,
        journal: &mut Journal,
    ) -> Result<PathBuf, StorageError> {
        self.ensure_inside(path)?;

        if kind.is_folder() {
            let sidecar = self.settings.sidecar_file_name.as_str();
            let previous =
                upsert_display_name(self.backend.as_ref(), path, sidecar, id, display_name).await?;
            journal.record(Compensation::RestoreFile {
                path: sidecar_path(path, sidecar),
                contents: previous,
            });
        }

        let stem = sanitize_display_name(display_name, self.settings.display_name_max_chars);
        if stem.is_empty() {
            return Ok(path.to_path_buf());
        }
        let current = base_name(path);
        let extension = match kind {
            NodeKind::File => split_extension(&current).1,
            NodeKind::Folder => None,
        };
        let parent = path.parent().unwrap_or(&self.root);

        for candidate in numbered_candidates(&stem, extension).take(MAX_PROBES) {
            if candidate == current {
                return Ok(path.to_path_buf());
            }
            let destination = child_path(parent, &candidate)?;
            if self.exists(&destination).await? {
                continue;
            }
            self.backend
                .rename(path, &destination)
                .await
                .map_err(|err| map_io("rename", &destination, err))?;
            journal.record(Compensation::Rename {
                from: path.to_path_buf(),
                to: destination.clone(),
            });
            return Ok(destination);
        }
        Err(StorageError::AlreadyExists {
            path: parent.join(stem),
        })
    }

    /// Move every entry of `source` except its sidecar into `target`, then
    /// remove `source`. Collisions are checked before anything moves.
    ///
    /// Returns the moved entry names in the order they were moved.
    pub async fn merge_directories(
        &self,
        source: &Path,
        target: &Path,
        journal: &mut Journal,
    ) -> Result<Vec<String>, StorageError> {
        self.ensure_inside(source)?;
        self.ensure_inside(target)?;
        if is_within(target, source) {
            return Err(StorageError::TraversalRejected {
                path: target.to_path_buf(),
                boundary: source.to_path_buf(),
            });
        }

        let sidecar = self.settings.sidecar_file_name.as_str();
        let mut names = self
            .backend
            .read_dir(source)
            .await
            .map_err(|err| StorageError::io("read_dir", source, err))?;
        names.retain(|name| name != sidecar);
        names.sort();

        let destinations = names
            .iter()
            .map(|name| child_path(target, name))
            .collect::<Result<Vec<_>, _>>()?;
        let taken = try_join_all(destinations.iter().map(|path| self.exists(path))).await?;
        if let Some((path, _)) = destinations.into_iter().zip(taken).find(|(_, taken)| *taken) {
            return Err(StorageError::AlreadyExists { path });
        }

        for name in &names {
            let from = source.join(name);
            let to = target.join(name);
            self.backend
                .rename(&from, &to)
                .await
                .map_err(|err| map_io("move", &to, err))?;
            journal.record(Compensation::Rename { from, to });
        }

        let sidecar_contents = self
            .backend
            .read_file(&sidecar_path(source, sidecar))
            .await
            .ok();
        self.backend
            .remove(source)
            .await
            .map_err(|err| StorageError::io("remove", source, err))?;
        // Replayed newest-first: the directory comes back before its sidecar.
        if let Some(contents) = sidecar_contents {
            journal.record(Compensation::RestoreFile {
                path: sidecar_path(source, sidecar),
                contents: Some(contents),
            });
        }
        journal.record(Compensation::RecreateDir {
            path: source.to_path_buf(),
        });

        debug!(source = %source.display(), target = %target.display(), moved = names.len(), "Merged directories");
        Ok(names)
    }

    pub async fn open_externally(&self, path: &Path) -> Result<(), StorageError> {
        ensure_within(path, &self.root)?;
        self.backend
            .open(path)
            .await
            .map_err(|err| StorageError::io("open", path, err))
    }

    /// Undo `journal`. Returns the failed compensations.
    pub async fn compensate(&self, journal: Journal) -> Vec<String> {
        journal.compensate(self.backend.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::{FsOp, MemoryFsBackend};

    fn adapter(backend: MemoryFsBackend) -> (Arc<MemoryFsBackend>, OutlineFs) {
        let backend = Arc::new(backend);
        let fs = OutlineFs::new(backend.clone(), "/r", EditorConfig::default());
        (backend, fs)
    }

    #[tokio::test]
    async fn blank_create_probes_numbered_names() {
        let (backend, fs) = adapter(
            MemoryFsBackend::new()
                .with_dir("/r/new-folder")
                .with_dir("/r/new-folder (1)"),
        );
        let node = fs.create(Path::new("/r"), None, NodeKind::Folder).await.unwrap();
        assert_eq!(node.name, "new-folder (2)");
        assert_eq!(node.display_name.as_deref(), Some(""));
        let raw: serde_json::Value = serde_json::from_slice(
            &backend.contents("/r/new-folder (2)/.metadata.json").unwrap(),
        )
        .unwrap();
        assert_eq!(raw["id"], node.id.as_str());
        assert_eq!(raw["displayName"], "");
    }

    #[tokio::test]
    async fn blank_file_is_refused() {
        let (_, fs) = adapter(MemoryFsBackend::new().with_dir("/r"));
        let err = fs.create(Path::new("/r"), None, NodeKind::File).await.unwrap_err();
        assert_eq!(err.invalid_reason(), Some(InvalidOperation::BlankFileUnsupported));
    }

    #[tokio::test]
    async fn named_create_refuses_existing() {
        let (backend, fs) = adapter(MemoryFsBackend::new().with_file("/r/a.txt", "keep"));
        let err = fs
            .create(Path::new("/r"), Some("a.txt"), NodeKind::File)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AlreadyExists);
        assert_eq!(backend.contents("/r/a.txt").unwrap(), b"keep");
    }

    #[tokio::test]
    async fn move_rejects_escape_and_cycles() {
        let (_, fs) = adapter(MemoryFsBackend::new().with_dir("/r/a/b").with_dir("/elsewhere"));
        let err = fs
            .move_entry(Path::new("/r/a"), Path::new("/elsewhere"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::TraversalRejected { .. }));
        let err = fs
            .move_entry(Path::new("/r/a"), Path::new("/r/a/b"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::TraversalRejected { .. }));
        let err = fs.remove(Path::new("/r")).await.unwrap_err();
        assert!(matches!(err, StorageError::TraversalRejected { .. }));
    }

    #[tokio::test]
    async fn display_name_renames_folder_and_writes_sidecar() {
        let (backend, fs) = adapter(MemoryFsBackend::new().with_dir("/r/new-folder").with_dir("/r/Plans"));
        let mut journal = Journal::new();
        let path = fs
            .update_display_name(
                Path::new("/r/new-folder"),
                NodeKind::Folder,
                &NodeId::new("n1"),
                "Plans!",
                &mut journal,
            )
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("/r/Plans (1)"));
        let raw: serde_json::Value =
            serde_json::from_slice(&backend.contents("/r/Plans (1)/.metadata.json").unwrap()).unwrap();
        assert_eq!(raw["displayName"], "Plans!");
        assert_eq!(journal.len(), 2);
    }

    #[tokio::test]
    async fn display_name_keeps_file_extension() {
        let (backend, fs) = adapter(MemoryFsBackend::new().with_file("/r/notes.md", ""));
        let mut journal = Journal::new();
        let path = fs
            .update_display_name(
                Path::new("/r/notes.md"),
                NodeKind::File,
                &NodeId::new("n1"),
                "Meeting notes",
                &mut journal,
            )
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("/r/Meeting-notes.md"));
        assert!(backend.contains("/r/Meeting-notes.md"));
        assert!(!backend.contains("/r/notes.md/.metadata.json"));
    }

    #[tokio::test]
    async fn merge_moves_everything_but_the_sidecar() {
        let (backend, fs) = adapter(
            MemoryFsBackend::new()
                .with_file("/r/a/x.txt", "x")
                .with_file("/r/a/.metadata.json", r#"{"id":"a","displayName":"A"}"#)
                .with_dir("/r/b"),
        );
        let mut journal = Journal::new();
        let moved = fs
            .merge_directories(Path::new("/r/a"), Path::new("/r/b"), &mut journal)
            .await
            .unwrap();
        assert_eq!(moved, vec!["x.txt"]);
        assert!(backend.contains("/r/b/x.txt"));
        assert!(!backend.contains("/r/a"));
        assert!(!backend.contains("/r/b/.metadata.json"));

        let failures = fs.compensate(journal).await;
        assert!(failures.is_empty());
        assert!(backend.contains("/r/a/x.txt"));
        assert!(backend.contains("/r/a/.metadata.json"));
    }

    #[tokio::test]
    async fn merge_checks_collisions_before_moving() {
        let (backend, fs) = adapter(
            MemoryFsBackend::new()
                .with_file("/r/a/1.txt", "")
                .with_file("/r/a/2.txt", "")
                .with_file("/r/b/2.txt", ""),
        );
        let mut journal = Journal::new();
        let err = fs
            .merge_directories(Path::new("/r/a"), Path::new("/r/b"), &mut journal)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
        assert!(journal.is_empty());
        assert!(backend.contains("/r/a/1.txt"));
    }

    #[tokio::test]
    async fn open_externally_reports_backend_failures() {
        let (backend, fs) = adapter(MemoryFsBackend::new().with_file("/r/a.txt", ""));
        fs.open_externally(Path::new("/r/a.txt")).await.unwrap();
        assert_eq!(backend.opened(), vec![PathBuf::from("/r/a.txt")]);

        backend.fail_on(FsOp::Open, "/r/a.txt");
        let err = fs.open_externally(Path::new("/r/a.txt")).await.unwrap_err();
        assert!(matches!(err, StorageError::Io { op: "open", .. }));
    }
}
