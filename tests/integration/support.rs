use fliessend::config::EditorConfig;
use fliessend::fs::{MemoryFsBackend, TokioFsBackend};
use fliessend::tree::audit::audit;
use fliessend::{NodeId, OutlineEditor};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Lay out `entries` under a fresh temp dir; names ending in `/` are folders
pub fn disk_layout(entries: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for entry in entries {
        let path = temp.path().join(entry.trim_end_matches('/'));
        if entry.ends_with('/') {
            fs::create_dir_all(&path).unwrap();
        } else {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, entry.as_bytes()).unwrap();
        }
    }
    temp
}

pub async fn disk_editor(root: &Path) -> OutlineEditor {
    let editor = OutlineEditor::new(Arc::new(TokioFsBackend::new()), EditorConfig::default());
    editor.open(root).await.unwrap();
    editor
}

pub async fn memory_editor(backend: MemoryFsBackend) -> (Arc<MemoryFsBackend>, OutlineEditor) {
    let backend = Arc::new(backend);
    let editor = OutlineEditor::new(backend.clone(), EditorConfig::default());
    editor.open("/r").await.unwrap();
    (backend, editor)
}

pub fn id(editor: &OutlineEditor, relative: &str) -> NodeId {
    editor
        .find(relative)
        .unwrap_or_else(|_| panic!("no node at {}", relative))
}

pub fn child_names(editor: &OutlineEditor, relative: &str) -> Vec<String> {
    let parent = id(editor, relative);
    let state = editor.snapshot();
    let tree = state.tree().unwrap();
    tree.children(&parent).map(|n| n.name.clone()).collect()
}

/// Tree invariants hold and the tree matches the disk exactly
pub fn assert_in_sync(editor: &OutlineEditor) {
    let state = editor.snapshot();
    let tree = state.tree().unwrap();
    if let Err(violations) = tree.check_invariants() {
        panic!("invariants violated: {:?}", violations);
    }
    let config = editor.config();
    let report = audit(tree, config.skip_hidden, &config.sidecar_file_name).unwrap();
    assert!(report.is_clean(), "audit: {:?}", report.discrepancies);
}
