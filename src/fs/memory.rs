//! In-memory `FsBackend`.
//!
//! Holds a flat map from absolute path to entry. Supports fault injection so
//! tests can fail a specific operation on a specific path, and records every
//! call for assertions about what reached the filesystem.

use crate::fs::contract::{EntryStat, FsBackend};
use crate::types::NodeKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// Backend operation, used for fault injection and the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    Stat,
    ReadDir,
    Exists,
    Rename,
    CreateDir,
    CreateFile,
    ReadFile,
    WriteFile,
    Remove,
    Open,
}

impl FsOp {
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            FsOp::Rename | FsOp::CreateDir | FsOp::CreateFile | FsOp::WriteFile | FsOp::Remove
        )
    }
}

#[derive(Debug, Clone)]
enum MemEntry {
    Dir {
        created: DateTime<Utc>,
    },
    File {
        contents: Vec<u8>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    },
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<PathBuf, MemEntry>,
    faults: HashSet<(FsOp, PathBuf)>,
    calls: Vec<(FsOp, PathBuf)>,
    opened: Vec<PathBuf>,
}

impl Inner {
    fn enter(&mut self, op: FsOp, path: &Path) -> io::Result<()> {
        self.calls.push((op, path.to_path_buf()));
        if self.faults.contains(&(op, path.to_path_buf())) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected {:?} failure at {}", op, path.display()),
            ));
        }
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.get(path), Some(MemEntry::Dir { .. }))
    }

    fn require_parent_dir(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if self.is_dir(parent) => Ok(()),
            _ => Err(not_found(path.parent().unwrap_or(path))),
        }
    }

    fn subtree_keys(&self, path: &Path) -> Vec<PathBuf> {
        self.entries
            .range(path.to_path_buf()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(path))
            .cloned()
            .collect()
    }

    fn mkdir_all(&mut self, path: &Path) {
        let now = Utc::now();
        for ancestor in path.ancestors().collect::<Vec<_>>().into_iter().rev() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.entries
                .entry(ancestor.to_path_buf())
                .or_insert(MemEntry::Dir { created: now });
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", path.display()),
    )
}

#[derive(Debug, Default)]
pub struct MemoryFsBackend {
    inner: Mutex<Inner>,
}

impl MemoryFsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory, creating missing ancestors
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.inner.lock().mkdir_all(path.as_ref());
        self
    }

    /// Add a file, creating missing ancestors
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.as_ref();
        {
            let mut inner = self.inner.lock();
            if let Some(parent) = path.parent() {
                inner.mkdir_all(parent);
            }
            let now = Utc::now();
            inner.entries.insert(
                path.to_path_buf(),
                MemEntry::File {
                    contents: contents.into(),
                    created: now,
                    modified: now,
                },
            );
        }
        self
    }

    /// Make every future `op` on exactly `path` fail with `PermissionDenied`
    pub fn fail_on(&self, op: FsOp, path: impl AsRef<Path>) {
        self.inner
            .lock()
            .faults
            .insert((op, path.as_ref().to_path_buf()));
    }

    pub fn clear_faults(&self) {
        self.inner.lock().faults.clear();
    }

    pub fn calls(&self) -> Vec<(FsOp, PathBuf)> {
        self.inner.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<(FsOp, PathBuf)> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|(op, _)| op.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.inner.lock().opened.clone()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.inner.lock().entries.contains_key(path.as_ref())
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.inner.lock().is_dir(path.as_ref())
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.inner.lock().entries.get(path.as_ref()) {
            Some(MemEntry::File { contents, .. }) => Some(contents.clone()),
            _ => None,
        }
    }

    /// Every path at or below `root`, sorted
    pub fn paths_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        self.inner.lock().subtree_keys(root.as_ref())
    }
}

#[async_trait]
impl FsBackend for MemoryFsBackend {
    async fn stat(&self, path: &Path) -> io::Result<EntryStat> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::Stat, path)?;
        match inner.entries.get(path) {
            Some(MemEntry::Dir { created }) => Ok(EntryStat {
                kind: NodeKind::Folder,
                size: 0,
                created: Some(*created),
                modified: Some(*created),
                read_only: false,
            }),
            Some(MemEntry::File {
                contents,
                created,
                modified,
            }) => Ok(EntryStat {
                kind: NodeKind::File,
                size: contents.len() as u64,
                created: Some(*created),
                modified: Some(*modified),
                read_only: false,
            }),
            None => Err(not_found(path)),
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::ReadDir, path)?;
        match inner.entries.get(path) {
            Some(MemEntry::Dir { .. }) => {}
            Some(MemEntry::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is not a directory", path.display()),
                ))
            }
            None => return Err(not_found(path)),
        }
        Ok(inner
            .entries
            .keys()
            .filter(|k| k.parent() == Some(path))
            .filter_map(|k| k.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect())
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::Exists, path)?;
        Ok(inner.entries.contains_key(path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::Rename, from)?;
        if !inner.entries.contains_key(from) {
            return Err(not_found(from));
        }
        if inner.entries.contains_key(to) {
            return Err(already_exists(to));
        }
        if to.starts_with(from) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }
        inner.require_parent_dir(to)?;

        for key in inner.subtree_keys(from) {
            if let Some(entry) = inner.entries.remove(&key) {
                let suffix = key.strip_prefix(from).unwrap_or(Path::new(""));
                let moved = if suffix.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(suffix)
                };
                inner.entries.insert(moved, entry);
            }
        }
        Ok(())
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::CreateDir, path)?;
        if inner.entries.contains_key(path) {
            return Err(already_exists(path));
        }
        inner.require_parent_dir(path)?;
        inner
            .entries
            .insert(path.to_path_buf(), MemEntry::Dir { created: Utc::now() });
        Ok(())
    }

    async fn create_file(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::CreateFile, path)?;
        if inner.entries.contains_key(path) {
            return Err(already_exists(path));
        }
        inner.require_parent_dir(path)?;
        let now = Utc::now();
        inner.entries.insert(
            path.to_path_buf(),
            MemEntry::File {
                contents: Vec::new(),
                created: now,
                modified: now,
            },
        );
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::ReadFile, path)?;
        match inner.entries.get(path) {
            Some(MemEntry::File { contents, .. }) => Ok(contents.clone()),
            Some(MemEntry::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::WriteFile, path)?;
        inner.require_parent_dir(path)?;
        let now = Utc::now();
        match inner.entries.get_mut(path) {
            Some(MemEntry::File {
                contents: existing,
                modified,
                ..
            }) => {
                *existing = contents.to_vec();
                *modified = now;
            }
            Some(MemEntry::Dir { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is a directory", path.display()),
                ))
            }
            None => {
                inner.entries.insert(
                    path.to_path_buf(),
                    MemEntry::File {
                        contents: contents.to_vec(),
                        created: now,
                        modified: now,
                    },
                );
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::Remove, path)?;
        for key in inner.subtree_keys(path) {
            inner.entries.remove(&key);
        }
        Ok(())
    }

    async fn open(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        inner.enter(FsOp::Open, path)?;
        if !inner.entries.contains_key(path) {
            return Err(not_found(path));
        }
        inner.opened.push(path.to_path_buf());
        Ok(())
    }
}
