use crate::integration::support::*;
use fliessend::error::ErrorKind;
use fliessend::fs::TokioFsBackend;
use fliessend::tree::TreeBuilder;
use fliessend::NodeKind;
use std::fs;
use std::path::Path;

#[tokio::test]
async fn builds_sorted_tree_without_hidden_entries() {
    let temp = disk_layout(&[
        "zeta.txt",
        "Alpha.txt",
        "émile.md",
        "docs/",
        "docs/readme.md",
        "Beta/",
        ".git/",
        ".git/HEAD",
        ".hidden.txt",
    ]);
    let backend = TokioFsBackend::new();
    let tree = TreeBuilder::new(&backend, temp.path()).build().await.unwrap();

    let names: Vec<_> = tree.children(tree.root_id()).map(|n| n.name.clone()).collect();
    assert_eq!(names, vec!["Beta", "docs", "Alpha.txt", "émile.md", "zeta.txt"]);
    assert_eq!(tree.len(), 7);

    let docs = tree.find_by_path(Path::new("docs")).unwrap();
    assert_eq!(docs.kind, NodeKind::Folder);
    let readme = tree.find_by_path(Path::new("docs/readme.md")).unwrap();
    assert_eq!(readme.path, temp.path().join("docs/readme.md"));
    assert_eq!(readme.parent_id.as_ref(), Some(&docs.id));
    assert_eq!(readme.stats.size, "docs/readme.md".len() as u64);
    assert!(tree.check_invariants().is_ok());
}

#[tokio::test]
async fn sidecars_supply_ids_and_labels() {
    let temp = disk_layout(&["plans/", "copy/"]);
    let sidecar = r#"{"id":"fixed-id","displayName":"Quarterly plans","color":"red"}"#;
    fs::write(temp.path().join("plans/.metadata.json"), sidecar).unwrap();
    fs::write(temp.path().join("copy/.metadata.json"), sidecar).unwrap();

    let editor = disk_editor(temp.path()).await;
    let state = editor.snapshot();
    let tree = state.tree().unwrap();
    let copy = tree.find_by_path(Path::new("copy")).unwrap();
    let plans = tree.find_by_path(Path::new("plans")).unwrap();

    // one folder keeps the shared id, the other gets a fresh one
    let claimed = [copy, plans]
        .iter()
        .filter(|n| n.id.as_str() == "fixed-id")
        .count();
    assert_eq!(claimed, 1);
    assert_ne!(plans.id, copy.id);
    assert_eq!(plans.label(), "Quarterly plans");
    assert_eq!(copy.label(), "Quarterly plans");
}

#[tokio::test]
async fn missing_root_is_an_io_error() {
    let temp = disk_layout(&[]);
    let backend = TokioFsBackend::new();
    let err = TreeBuilder::new(&backend, temp.path().join("nope"))
        .build()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[tokio::test]
async fn a_file_can_be_opened_as_root() {
    let temp = disk_layout(&["single.txt"]);
    let backend = TokioFsBackend::new();
    let tree = TreeBuilder::new(&backend, temp.path().join("single.txt"))
        .build()
        .await
        .unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root().kind, NodeKind::File);
}
