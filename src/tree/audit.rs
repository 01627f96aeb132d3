//! Integrity audit: compares an `OutlineTree` against what is on disk.

use crate::error::StorageError;
use crate::tree::model::OutlineTree;
use crate::tree::path::is_hidden;
use crate::types::NodeKind;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// On disk, absent from the tree
    MissingFromTree(PathBuf),
    /// In the tree, absent from disk
    MissingOnDisk(PathBuf),
    KindMismatch {
        path: PathBuf,
        tree: NodeKind,
        disk: NodeKind,
    },
    /// Structural invariant violated inside the tree itself
    Invariant(String),
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::MissingFromTree(path) => write!(f, "not in outline: {}", path.display()),
            Discrepancy::MissingOnDisk(path) => write!(f, "missing on disk: {}", path.display()),
            Discrepancy::KindMismatch { path, tree, disk } => write!(
                f,
                "{} is a {} in the outline but a {} on disk",
                path.display(),
                tree,
                disk
            ),
            Discrepancy::Invariant(message) => write!(f, "invariant: {}", message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub disk_entries: usize,
    pub tree_nodes: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Walk the tree's root on the real filesystem and report every difference
pub fn audit(
    tree: &OutlineTree,
    skip_hidden: bool,
    sidecar_name: &str,
) -> Result<AuditReport, StorageError> {
    let root = tree.root().path.clone();
    let mut on_disk = HashMap::new();

    let walker = walkdir::WalkDir::new(&root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            name != sidecar_name && !(skip_hidden && is_hidden(&name))
        });
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().map(PathBuf::from).unwrap_or_else(|| root.clone());
            StorageError::io("walk", path, err.into())
        })?;
        let kind = if entry.file_type().is_dir() {
            NodeKind::Folder
        } else {
            NodeKind::File
        };
        on_disk.insert(entry.into_path(), kind);
    }

    let mut report = AuditReport {
        disk_entries: on_disk.len(),
        tree_nodes: tree.len().saturating_sub(1),
        discrepancies: Vec::new(),
    };

    if let Err(violations) = tree.check_invariants() {
        report
            .discrepancies
            .extend(violations.into_iter().map(Discrepancy::Invariant));
    }

    for node in tree.walk().into_iter().skip(1) {
        match on_disk.remove(&node.path) {
            None => report
                .discrepancies
                .push(Discrepancy::MissingOnDisk(node.path.clone())),
            Some(disk) if disk != node.kind => report.discrepancies.push(Discrepancy::KindMismatch {
                path: node.path.clone(),
                tree: node.kind,
                disk,
            }),
            Some(_) => {}
        }
    }

    let mut extra: Vec<_> = on_disk.into_keys().collect();
    extra.sort();
    report
        .discrepancies
        .extend(extra.into_iter().map(Discrepancy::MissingFromTree));
    Ok(report)
}
