use fliessend::config::EditorConfig;
use fliessend::fs::MemoryFsBackend;
use fliessend::{NodeKind, OutlineEditor};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    CreateFile(usize, u8),
    CreateFolder(usize, u8),
    CreateBlank(usize),
    Delete(usize),
    Rename(usize, u8),
    Relabel(usize, String),
    Indent(usize),
    Outdent(usize),
    Merge(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    let target = 0usize..64;
    prop_oneof![
        (target.clone(), 0u8..6).prop_map(|(t, n)| Op::CreateFile(t, n)),
        (target.clone(), 0u8..6).prop_map(|(t, n)| Op::CreateFolder(t, n)),
        target.clone().prop_map(Op::CreateBlank),
        target.clone().prop_map(Op::Delete),
        (target.clone(), 0u8..6).prop_map(|(t, n)| Op::Rename(t, n)),
        (target.clone(), "[a-c ]{0,6}").prop_map(|(t, s)| Op::Relabel(t, s)),
        target.clone().prop_map(Op::Indent),
        target.clone().prop_map(Op::Outdent),
        (target.clone(), target).prop_map(|(a, b)| Op::Merge(a, b)),
    ]
}

async fn apply(editor: &OutlineEditor, op: &Op) {
    let snapshot = editor.snapshot();
    let nodes: Vec<_> = snapshot
        .tree()
        .unwrap()
        .walk()
        .into_iter()
        .map(|n| n.id.clone())
        .collect();
    let pick = |i: usize| nodes[i % nodes.len()].clone();

    // refusals and collisions are expected; only consistency matters here
    let _ = match op {
        Op::CreateFile(t, n) => {
            let name = format!("f{}.txt", n);
            editor.create(&pick(*t), Some(&name), NodeKind::File).await
        }
        Op::CreateFolder(t, n) => {
            let name = format!("d{}", n);
            editor.create(&pick(*t), Some(&name), NodeKind::Folder).await
        }
        Op::CreateBlank(t) => editor.create(&pick(*t), None, NodeKind::Folder).await,
        Op::Delete(t) => editor.delete(&pick(*t)).await,
        Op::Rename(t, n) => editor.rename(&pick(*t), &format!("r{}", n)).await,
        Op::Relabel(t, label) => editor.update_display_name(&pick(*t), label).await,
        Op::Indent(t) => editor.indent(&pick(*t)).await,
        Op::Outdent(t) => editor.outdent(&pick(*t)).await,
        Op::Merge(a, b) => editor.merge(&pick(*a), &pick(*b)).await,
    };
}

fn disk_paths(backend: &MemoryFsBackend, sidecar: &str) -> BTreeSet<PathBuf> {
    backend
        .paths_under("/r")
        .into_iter()
        .filter(|p| p.as_path() != std::path::Path::new("/r"))
        .filter(|p| p.file_name().map(|n| n != sidecar).unwrap_or(true))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_edits_keep_tree_and_disk_in_step(ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let backend = Arc::new(
                MemoryFsBackend::new()
                    .with_file("/r/A/x.txt", "")
                    .with_dir("/r/B")
                    .with_file("/r/c.txt", ""),
            );
            let editor = OutlineEditor::new(backend.clone(), EditorConfig::default());
            editor.open("/r").await.unwrap();
            let sidecar = editor.config().sidecar_file_name.clone();

            for op in &ops {
                apply(&editor, op).await;

                let snapshot = editor.snapshot();
                let tree = snapshot.tree().unwrap();
                if let Err(violations) = tree.check_invariants() {
                    panic!("after {:?}: {:?}", op, violations);
                }
                let in_tree: BTreeSet<PathBuf> = tree
                    .walk()
                    .into_iter()
                    .filter(|n| !tree.is_root(&n.id))
                    .map(|n| n.path.clone())
                    .collect();
                assert_eq!(in_tree, disk_paths(&backend, &sidecar), "after {:?}", op);
                if let Some(selected) = &snapshot.selected {
                    assert!(tree.contains(selected), "selection dangles after {:?}", op);
                }
            }
        });
    }
}
