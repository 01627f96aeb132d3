use crate::integration::support::*;
use fliessend::config::{EditorConfig, RenderConfig};
use fliessend::fs::MemoryFsBackend;
use fliessend::render::diff::{diff, DiffStrategy};
use fliessend::render::dom::Mutation;
use fliessend::render::renderer::attach;
use fliessend::render::{mount, render_outline, Dom, MemoryDom, Renderer};
use fliessend::{NodeKind, OutlineEditor, OutlineState, StateStore};
use parking_lot::Mutex;
use std::sync::Arc;

fn sample() -> MemoryFsBackend {
    MemoryFsBackend::new()
        .with_file("/r/A/a1.txt", "")
        .with_file("/r/A/a2.txt", "")
        .with_file("/r/B/b1.txt", "")
        .with_file("/r/C/c1.txt", "")
        .with_file("/r/d.txt", "")
}

fn fresh_html(state: &OutlineState, config: &RenderConfig) -> String {
    let mut dom = MemoryDom::new();
    let root = mount(&mut dom, &render_outline(state, config.indent_px));
    dom.to_html(root)
}

async fn run_session(strategy: DiffStrategy) {
    let store = Arc::new(StateStore::default());
    let config = RenderConfig {
        strategy,
        ..RenderConfig::default()
    };
    let mut dom = MemoryDom::new();
    let container = dom.create_element("div");
    let renderer = Arc::new(Mutex::new(Renderer::new(dom, container, &config)));
    attach(renderer.clone(), &store);

    let editor = OutlineEditor::with_store(Arc::new(sample()), store.clone(), EditorConfig::default());
    editor.open("/r").await.unwrap();
    editor.toggle_expanded(&id(&editor, "A")).unwrap();
    editor.indent(&id(&editor, "B")).await.unwrap();
    editor.delete(&id(&editor, "A/a1.txt")).await.unwrap();
    editor
        .create(&id(&editor, "C"), Some("c0.txt"), NodeKind::File)
        .await
        .unwrap();
    editor.outdent(&id(&editor, "A/B")).await.unwrap();
    editor.update_display_name(&id(&editor, "d.txt"), "Done").await.unwrap();
    editor.navigate_up().unwrap();

    let state = store.snapshot();
    let guard = renderer.lock();
    let live = guard.root().copied().unwrap();
    assert_eq!(guard.dom().to_html(live), fresh_html(&state, &config));
    assert_eq!(guard.dom().children(guard.container()), vec![live]);
}

#[tokio::test]
async fn keyed_display_tracks_every_edit() {
    run_session(DiffStrategy::Keyed).await;
}

#[tokio::test]
async fn positional_display_tracks_every_edit() {
    run_session(DiffStrategy::Positional).await;
}

#[tokio::test]
async fn deleting_a_middle_node_is_one_removal_when_keyed() {
    let (_, editor) = memory_editor(sample()).await;
    let before = render_outline(&editor.snapshot(), 20);
    editor.delete(&id(&editor, "B")).await.unwrap();
    let after = render_outline(&editor.snapshot(), 20);

    let mut dom = MemoryDom::new();
    let live = mount(&mut dom, &before);
    dom.take_mutations();
    diff(&before, &after, DiffStrategy::Keyed).apply(&mut dom, &live);
    let mutations = dom.take_mutations();

    let removals = mutations
        .iter()
        .filter(|m| matches!(m, Mutation::Remove(_)))
        .count();
    assert_eq!(removals, 1);
    assert!(!mutations.iter().any(|m| matches!(m, Mutation::Create(_))));
}

#[tokio::test]
async fn unchanged_state_causes_no_mutations() {
    let (_, editor) = memory_editor(sample()).await;
    let view = render_outline(&editor.snapshot(), 20);
    let mut dom = MemoryDom::new();
    let live = mount(&mut dom, &view);
    dom.take_mutations();
    for strategy in [DiffStrategy::Keyed, DiffStrategy::Positional] {
        let patch = diff(&view, &view.clone(), strategy);
        assert!(patch.is_noop());
        patch.apply(&mut dom, &live);
    }
    assert!(dom.mutations().is_empty());
}
