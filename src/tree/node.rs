//! Outline node representation

use crate::types::{NodeId, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Snapshot metadata taken when the entry was read. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub read_only: bool,
}

/// One filesystem entry mapped to one outline item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    /// Physical base name, always the last segment of `path`
    pub name: String,
    /// User-facing label. `Some("")` is a blank label, `None` means `name` is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Ordered child ids, empty for files
    pub children: Vec<NodeId>,
    pub parent_id: Option<NodeId>,
    pub stats: NodeStats,
}

impl Node {
    pub fn new(id: NodeId, path: PathBuf, kind: NodeKind, stats: NodeStats) -> Self {
        let name = base_name(&path);
        Self {
            id,
            name,
            display_name: None,
            path,
            kind,
            children: Vec::new(),
            parent_id: None,
            stats,
        }
    }

    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// The label the user sees: the display name when present, else the name
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Point this node at a new physical path, keeping `name` derived from it
    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.name = base_name(&path);
        self.path = path;
    }
}

/// Last path segment as a string; falls back to the full path for roots like `/`
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_follows_path() {
        let mut node = Node::new(
            NodeId::new("a"),
            PathBuf::from("/root/notes"),
            NodeKind::Folder,
            NodeStats::default(),
        );
        assert_eq!(node.name, "notes");
        node.set_path(PathBuf::from("/root/ideas"));
        assert_eq!(node.name, "ideas");
    }

    #[test]
    fn label_prefers_display_name() {
        let node = Node::new(
            NodeId::new("a"),
            PathBuf::from("/root/new-folder"),
            NodeKind::Folder,
            NodeStats::default(),
        );
        assert_eq!(node.label(), "new-folder");
        let node = node.with_display_name(Some(String::new()));
        assert_eq!(node.label(), "");
    }

    #[test]
    fn serializes_type_field() {
        let node = Node::new(
            NodeId::new("a"),
            PathBuf::from("/root/b.txt"),
            NodeKind::File,
            NodeStats::default(),
        );
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "file");
        assert_eq!(value["parentId"], serde_json::Value::Null);
        assert!(value.get("displayName").is_none());
    }
}
