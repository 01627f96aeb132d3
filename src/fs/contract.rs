//! Filesystem backend contract.
//!
//! The outline adapter talks to disk only through this trait so the same
//! protocol runs against the real filesystem and the in-memory backend used
//! by tests and benchmarks. Backends speak `std::io`; the adapter attaches
//! operation names and paths when turning failures into `StorageError`.

use crate::types::NodeKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::Path;

/// Metadata for a single directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStat {
    pub kind: NodeKind,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub read_only: bool,
}

/// Operations the outline adapter needs from a filesystem.
///
/// `rename` must fail with `io::ErrorKind::AlreadyExists` rather than
/// overwrite an existing destination.
#[async_trait]
pub trait FsBackend: Send + Sync {
    async fn stat(&self, path: &Path) -> io::Result<EntryStat>;

    /// Entry names (not paths) directly under `path`, in no particular order
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a single directory; fails if it already exists
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Create a new empty file; fails if it already exists
    async fn create_file(&self, path: &Path) -> io::Result<()>;

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or replace a file with `contents`
    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Recursive, forced removal. A missing path is not an error.
    async fn remove(&self, path: &Path) -> io::Result<()>;

    /// Hand `path` to the platform's default application
    async fn open(&self, path: &Path) -> io::Result<()>;
}
