use crate::integration::support::*;
use fliessend::config::EditorConfig;
use fliessend::error::ErrorKind;
use fliessend::fs::{FsOp, MemoryFsBackend};
use fliessend::{ApiError, OutlineEditor};
use std::fs;
use std::sync::Arc;

#[tokio::test]
async fn merge_into_empty_target_keeps_child_order() {
    let temp = disk_layout(&["A/", "A/z.txt", "A/a.txt", "A/sub/", "B/"]);
    fs::write(
        temp.path().join("A/.metadata.json"),
        r#"{"id":"src","displayName":" and more"}"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("B/.metadata.json"),
        r#"{"id":"dst","displayName":"Ideas"}"#,
    )
    .unwrap();
    let editor = disk_editor(temp.path()).await;
    let a = id(&editor, "A");
    let b = id(&editor, "B");
    let original = child_names(&editor, "A");
    assert_eq!(original, vec!["sub", "a.txt", "z.txt"]);

    let outcome = editor.merge(&a, &b).await.unwrap();
    assert_eq!(outcome.label, "Ideas and more");
    assert_eq!(outcome.path, temp.path().join("Ideas-and-more"));
    assert!(!temp.path().join("A").exists());

    let state = editor.snapshot();
    let tree = state.tree().unwrap();
    assert!(tree.get(&a).is_none());
    let merged: Vec<_> = tree.children(&b).map(|n| n.name.clone()).collect();
    assert_eq!(merged, original);
    assert_eq!(state.selected, Some(b));
    assert_in_sync(&editor);

    let raw: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("Ideas-and-more/.metadata.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(raw["id"], "dst");
    assert_eq!(raw["displayName"], "Ideas and more");
}

#[tokio::test]
async fn merging_a_child_into_its_parent_flattens_it() {
    let temp = disk_layout(&["P/", "P/inner/", "P/inner/x.txt", "P/y.txt"]);
    let editor = disk_editor(temp.path()).await;
    editor
        .merge(&id(&editor, "P/inner"), &id(&editor, "P"))
        .await
        .unwrap();
    assert!(temp.path().join("Pinner/x.txt").is_file());
    assert!(temp.path().join("Pinner/y.txt").is_file());
    assert_eq!(child_names(&editor, "Pinner"), vec!["y.txt", "x.txt"]);
    assert_in_sync(&editor);
}

#[tokio::test]
async fn compensation_failure_is_reported_as_inconsistent() {
    let (backend, editor) = memory_editor(
        MemoryFsBackend::new()
            .with_file("/r/A/one.txt", "1")
            .with_file("/r/A/two.txt", "2")
            .with_dir("/r/B"),
    )
    .await;
    backend.fail_on(FsOp::Rename, "/r/A/two.txt");
    backend.fail_on(FsOp::Rename, "/r/B/one.txt");

    let err = editor
        .merge(&id(&editor, "A"), &id(&editor, "B"))
        .await
        .unwrap_err();
    match &err {
        ApiError::Inconsistent {
            cause,
            compensation_failures,
        } => {
            assert_eq!(cause.kind(), ErrorKind::Io);
            assert_eq!(compensation_failures.len(), 1);
            assert!(compensation_failures[0].contains("one.txt"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(editor.snapshot().tree().unwrap().contains(&id(&editor, "A")));
    assert!(backend.contains("/r/B/one.txt"));
}

#[tokio::test]
async fn without_compensation_partial_state_stays() {
    let backend = Arc::new(
        MemoryFsBackend::new()
            .with_file("/r/A/one.txt", "1")
            .with_file("/r/A/two.txt", "2")
            .with_dir("/r/B"),
    );
    let config = EditorConfig {
        compensate_on_failure: false,
        ..EditorConfig::default()
    };
    let editor = OutlineEditor::new(backend.clone(), config);
    editor.open("/r").await.unwrap();
    backend.fail_on(FsOp::Rename, "/r/A/two.txt");

    let err = editor
        .merge(&id(&editor, "A"), &id(&editor, "B"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(backend.contains("/r/B/one.txt"));
    assert!(backend.contains("/r/A/two.txt"));

    // the tree was not touched, a reload shows the partial move
    assert_eq!(child_names(&editor, "A"), vec!["one.txt", "two.txt"]);
    editor.reload().await.unwrap();
    assert_eq!(child_names(&editor, "B"), vec!["one.txt"]);
}
