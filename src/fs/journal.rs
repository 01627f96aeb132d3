//! Compensating actions for multi-step filesystem operations.
//!
//! Each applied step pushes the action that undoes it. On failure the journal
//! is replayed newest-first; every compensation is attempted even if an
//! earlier one fails.

use crate::fs::contract::FsBackend;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Undo a rename or move by renaming `to` back to `from`
    Rename { from: PathBuf, to: PathBuf },
    /// Restore a file's earlier contents, or delete it if it did not exist
    RestoreFile {
        path: PathBuf,
        contents: Option<Vec<u8>>,
    },
    /// Recreate a directory that a step removed
    RecreateDir { path: PathBuf },
}

impl Compensation {
    async fn run(&self, backend: &dyn FsBackend) -> std::io::Result<()> {
        match self {
            Compensation::Rename { from, to } => backend.rename(to, from).await,
            Compensation::RestoreFile {
                path,
                contents: Some(contents),
            } => backend.write_file(path, contents).await,
            Compensation::RestoreFile {
                path,
                contents: None,
            } => backend.remove(path).await,
            Compensation::RecreateDir { path } => backend.create_dir(path).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            Compensation::Rename { from, to } => {
                format!("move {} back to {}", to.display(), from.display())
            }
            Compensation::RestoreFile { path, .. } => format!("restore {}", path.display()),
            Compensation::RecreateDir { path } => format!("recreate {}", path.display()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Journal {
    steps: Vec<Compensation>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, compensation: Compensation) {
        self.steps.push(compensation);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Compensation] {
        &self.steps
    }

    /// Take over another journal's steps, applied after ours
    pub fn extend(&mut self, other: Journal) {
        self.steps.extend(other.steps);
    }

    /// Undo every recorded step newest-first. Returns a description of each
    /// compensation that failed; empty means the rollback was complete.
    pub async fn compensate(self, backend: &dyn FsBackend) -> Vec<String> {
        let mut failures = Vec::new();
        for step in self.steps.into_iter().rev() {
            match step.run(backend).await {
                Ok(()) => debug!(action = %step.describe(), "Compensated"),
                Err(err) => {
                    error!(action = %step.describe(), error = %err, "Compensation failed");
                    failures.push(format!("{}: {}", step.describe(), err));
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::{FsOp, MemoryFsBackend};
    use std::path::Path;

    #[tokio::test]
    async fn compensates_newest_first() {
        let fs = MemoryFsBackend::new()
            .with_dir("/r/a")
            .with_dir("/r/b")
            .with_file("/r/a/x", "x");
        fs.rename(Path::new("/r/a/x"), Path::new("/r/b/x")).await.unwrap();
        fs.rename(Path::new("/r/b/x"), Path::new("/r/b/y")).await.unwrap();

        let mut journal = Journal::new();
        journal.record(Compensation::Rename {
            from: "/r/a/x".into(),
            to: "/r/b/x".into(),
        });
        journal.record(Compensation::Rename {
            from: "/r/b/x".into(),
            to: "/r/b/y".into(),
        });

        let failures = journal.compensate(&fs).await;
        assert!(failures.is_empty());
        assert_eq!(fs.contents("/r/a/x").unwrap(), b"x");
    }

    #[tokio::test]
    async fn reports_each_failed_compensation() {
        let fs = MemoryFsBackend::new().with_dir("/r/b").with_file("/r/b/x", "");
        fs.fail_on(FsOp::Rename, "/r/b/x");

        let mut journal = Journal::new();
        journal.record(Compensation::RecreateDir { path: "/r/a".into() });
        journal.record(Compensation::Rename {
            from: "/r/a/x".into(),
            to: "/r/b/x".into(),
        });

        let failures = journal.compensate(&fs).await;
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("/r/b/x"));
        assert!(fs.is_dir("/r/a"));
    }
}
