use crate::integration::support::*;
use fliessend::error::{ErrorKind, InvalidOperation};
use fliessend::feedback::status_for_error;
use fliessend::NodeKind;
use std::sync::Arc;

#[tokio::test]
async fn indent_fails_then_outdent_moves_to_root() {
    let temp = disk_layout(&["A/", "A/b.txt"]);
    let editor = disk_editor(temp.path()).await;
    let b = id(&editor, "A/b.txt");

    let err = editor.indent(&b).await.unwrap_err();
    assert_eq!(err.invalid_reason(), Some(InvalidOperation::NoLeftTarget));
    assert_eq!(status_for_error(&err), "cannot indent further left");

    let outcome = editor.outdent(&b).await.unwrap();
    assert_eq!(outcome.path, temp.path().join("b.txt"));
    assert!(temp.path().join("b.txt").is_file());
    assert!(!temp.path().join("A/b.txt").exists());
    assert_eq!(child_names(&editor, ""), vec!["A", "b.txt"]);
    assert_in_sync(&editor);
}

#[tokio::test]
async fn moved_folders_carry_their_descendants() {
    let temp = disk_layout(&["A/", "B/", "B/C/", "B/C/deep.txt"]);
    let editor = disk_editor(temp.path()).await;
    let deep = id(&editor, "B/C/deep.txt");

    editor.indent(&id(&editor, "B")).await.unwrap();
    let state = editor.snapshot();
    let node = state.tree().unwrap().get(&deep).unwrap().clone();
    assert_eq!(node.path, temp.path().join("A/B/C/deep.txt"));
    assert!(node.path.is_file());
    assert_in_sync(&editor);

    editor.rename(&id(&editor, "A"), "Renamed").await.unwrap();
    let state = editor.snapshot();
    let node = state.tree().unwrap().get(&deep).unwrap().clone();
    assert_eq!(node.path, temp.path().join("Renamed/B/C/deep.txt"));
    assert_in_sync(&editor);
}

#[tokio::test]
async fn existing_name_is_refused_without_changes() {
    let temp = disk_layout(&["A/", "A/b.txt"]);
    let editor = disk_editor(temp.path()).await;
    let before = editor.snapshot();
    let err = editor
        .create(&id(&editor, "A"), Some("b.txt"), NodeKind::File)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(Arc::ptr_eq(&before, &editor.snapshot()));
    assert_eq!(std::fs::read_to_string(temp.path().join("A/b.txt")).unwrap(), "A/b.txt");
}

#[tokio::test]
async fn blank_folders_have_sidecars_on_disk() {
    let temp = disk_layout(&["new-folder/"]);
    let editor = disk_editor(temp.path()).await;
    let root = editor.snapshot().tree().unwrap().root_id().clone();

    let outcome = editor.create(&root, None, NodeKind::Folder).await.unwrap();
    assert_eq!(outcome.path, temp.path().join("new-folder (1)"));
    assert_eq!(outcome.label, "");
    let raw: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(temp.path().join("new-folder (1)/.metadata.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(raw["id"], outcome.node.as_str());
    assert_eq!(raw["displayName"], "");
    assert_in_sync(&editor);

    // the id survives a reopen through the sidecar
    editor.open(temp.path()).await.unwrap();
    assert_eq!(id(&editor, "new-folder (1)"), outcome.node);
}

#[tokio::test]
async fn ids_survive_rename_relabel_and_moves() {
    let temp = disk_layout(&["A/", "B/", "B/x.txt"]);
    let editor = disk_editor(temp.path()).await;
    let x = id(&editor, "B/x.txt");

    editor.update_display_name(&x, "Shopping list").await.unwrap();
    assert_eq!(id(&editor, "B/Shopping-list.txt"), x);
    editor.outdent(&x).await.unwrap();
    assert_eq!(id(&editor, "Shopping-list.txt"), x);
    editor.rename(&x, "list.md").await.unwrap();
    assert_eq!(id(&editor, "list.md"), x);

    let state = editor.snapshot();
    assert_eq!(state.selected, Some(x.clone()));
    assert_eq!(state.tree().unwrap().get(&x).unwrap().label(), "Shopping list");
    assert_in_sync(&editor);
}

#[tokio::test]
async fn deleting_root_changes_nothing() {
    let temp = disk_layout(&["A/"]);
    let editor = disk_editor(temp.path()).await;
    editor.navigate_down().unwrap();
    let before = editor.snapshot();
    let root = before.tree().unwrap().root_id().clone();

    let err = editor.delete(&root).await.unwrap_err();
    assert_eq!(err.invalid_reason(), Some(InvalidOperation::RootImmutable));
    assert!(Arc::ptr_eq(&before, &editor.snapshot()));
    assert!(temp.path().join("A").is_dir());
}

#[tokio::test]
async fn relabel_probes_for_a_free_name() {
    let temp = disk_layout(&["Notes/", "Draft/"]);
    let editor = disk_editor(temp.path()).await;
    let draft = id(&editor, "Draft");
    let outcome = editor.update_display_name(&draft, "Notes").await.unwrap();
    assert_eq!(outcome.path, temp.path().join("Notes (1)"));
    assert_in_sync(&editor);
}
