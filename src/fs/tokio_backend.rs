//! `FsBackend` over the real filesystem using `tokio::fs`.

use crate::fs::contract::{EntryStat, FsBackend};
use crate::types::NodeKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFsBackend;

impl TokioFsBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsBackend for TokioFsBackend {
    async fn stat(&self, path: &Path) -> io::Result<EntryStat> {
        let metadata = tokio::fs::metadata(path).await?;
        let kind = if metadata.is_dir() {
            NodeKind::Folder
        } else {
            NodeKind::File
        };
        Ok(EntryStat {
            kind,
            size: metadata.len(),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            read_only: metadata.permissions().readonly(),
        })
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        // Case-only renames on case-insensitive volumes report the
        // destination as existing; let those through.
        if tokio::fs::try_exists(to).await? && !same_entry(from, to).await {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        tokio::fs::rename(from, to).await
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir(path).await
    }

    async fn create_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map(|_| ())
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let metadata = match tokio::fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        let result = if metadata.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        };
        match result {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    async fn open(&self, path: &Path) -> io::Result<()> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || opener::open(&path))
            .await
            .map_err(io::Error::other)?
            .map_err(io::Error::other)
    }
}

async fn same_entry(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
