use super::{OutlineEditor, Operation, Outcome};
use crate::error::{ApiError, InvalidOperation};
use crate::store::Edit;
use crate::tree::model::Position;
use crate::types::NodeId;

impl OutlineEditor {
    /// Make the node the last child of its preceding sibling folder
    pub async fn indent(&self, id: &NodeId) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let tree = snapshot.tree()?;
        if tree.is_root(id) {
            return Err(InvalidOperation::RootImmutable.into());
        }
        let node = tree.node(id)?;
        let target = tree
            .previous_sibling(id)
            .ok_or(InvalidOperation::NoLeftTarget)?;
        if !target.is_folder() {
            return Err(InvalidOperation::TargetIsFile.into());
        }

        let path = fs.move_entry(&node.path, &target.path).await?;
        let state = self.commit(Edit::Moved {
            id: id.clone(),
            new_parent: target.id.clone(),
            position: Position::End,
            path,
        })?;
        self.outcome(Operation::Indent, &state, id)
    }

    /// Move the node out of its parent, right after it in the grandparent
    pub async fn outdent(&self, id: &NodeId) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let tree = snapshot.tree()?;
        if tree.is_root(id) {
            return Err(InvalidOperation::RootImmutable.into());
        }
        let node = tree.node(id)?;
        let parent = tree.parent(id).ok_or(InvalidOperation::RootImmutable)?;
        let grandparent = tree
            .parent(&parent.id)
            .ok_or(InvalidOperation::NoGrandparent)?;

        let path = fs.move_entry(&node.path, &grandparent.path).await?;
        let state = self.commit(Edit::Moved {
            id: id.clone(),
            new_parent: grandparent.id.clone(),
            position: Position::After(parent.id.clone()),
            path,
        })?;
        self.outcome(Operation::Outdent, &state, id)
    }
}

#[cfg(test)]
mod tests {
    use crate::edit::test_support::*;
    use crate::error::{ErrorKind, InvalidOperation};
    use crate::feedback::status_for_error;
    use crate::fs::MemoryFsBackend;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn sample() -> MemoryFsBackend {
        MemoryFsBackend::new().with_file("/r/A/b.txt", "")
    }

    #[tokio::test]
    async fn indent_without_left_sibling_fails() {
        let (_, editor) = opened(sample()).await;
        let before = editor.snapshot();
        let err = editor.indent(&id(&editor, "A/b.txt")).await.unwrap_err();
        assert_eq!(err.invalid_reason(), Some(InvalidOperation::NoLeftTarget));
        assert_eq!(status_for_error(&err), "cannot indent further left");
        assert!(Arc::ptr_eq(&before, &editor.snapshot()));
    }

    #[tokio::test]
    async fn outdent_moves_next_to_parent() {
        let (backend, editor) = opened(sample().with_dir("/r/C")).await;
        let b = id(&editor, "A/b.txt");
        let outcome = editor.outdent(&b).await.unwrap();
        assert_eq!(outcome.path, PathBuf::from("/r/b.txt"));
        assert!(backend.contains("/r/b.txt"));

        let state = editor.snapshot();
        let tree = state.tree().unwrap();
        let names: Vec<_> = tree.children(tree.root_id()).map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "b.txt", "C"]);
        assert_consistent(&editor);
    }

    #[tokio::test]
    async fn outdent_directly_under_root_fails() {
        let (_, editor) = opened(sample()).await;
        let err = editor.outdent(&id(&editor, "A")).await.unwrap_err();
        assert_eq!(err.invalid_reason(), Some(InvalidOperation::NoGrandparent));
    }

    #[tokio::test]
    async fn indent_refuses_file_targets_and_root() {
        let (_, editor) = opened(
            MemoryFsBackend::new()
                .with_file("/r/a.txt", "")
                .with_file("/r/b.txt", ""),
        )
        .await;
        let err = editor.indent(&id(&editor, "b.txt")).await.unwrap_err();
        assert_eq!(err.invalid_reason(), Some(InvalidOperation::TargetIsFile));
        let root = editor.snapshot().tree().unwrap().root_id().clone();
        let err = editor.indent(&root).await.unwrap_err();
        assert_eq!(err.invalid_reason(), Some(InvalidOperation::RootImmutable));
    }

    #[tokio::test]
    async fn indent_then_outdent_lands_next_to_old_parent() {
        let (backend, editor) = opened(
            MemoryFsBackend::new()
                .with_file("/r/A/x.txt", "")
                .with_file("/r/B/y.txt", ""),
        )
        .await;
        let b = id(&editor, "B");
        editor.indent(&b).await.unwrap();
        assert!(backend.contains("/r/A/B/y.txt"));
        {
            let state = editor.snapshot();
            let tree = state.tree().unwrap();
            let a = id(&editor, "A");
            assert!(state.is_expanded(&a));
            let names: Vec<_> = tree.children(&a).map(|n| n.name.as_str()).collect();
            assert_eq!(names, vec!["x.txt", "B"]);
        }

        editor.outdent(&b).await.unwrap();
        let state = editor.snapshot();
        let tree = state.tree().unwrap();
        let names: Vec<_> = tree.children(tree.root_id()).map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(tree.get(&id(&editor, "B/y.txt")).unwrap().path, PathBuf::from("/r/B/y.txt"));
        assert_consistent(&editor);
    }

    #[tokio::test]
    async fn indent_collision_leaves_everything_in_place() {
        let (backend, editor) = opened(
            MemoryFsBackend::new()
                .with_file("/r/A/b.txt", "")
                .with_file("/r/b.txt", ""),
        )
        .await;
        let err = editor.indent(&id(&editor, "b.txt")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(backend.contains("/r/b.txt"));
    }
}
