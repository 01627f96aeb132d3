use super::{OutlineEditor, Operation, Outcome};
use crate::error::{ApiError, InvalidOperation};
use crate::fs::Journal;
use crate::store::Edit;
use crate::tree::path::child_path;
use crate::types::NodeId;

impl OutlineEditor {
    /// Give the node a new physical name. Descendant paths follow.
    pub async fn rename(&self, id: &NodeId, new_name: &str) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let tree = snapshot.tree()?;
        let node = tree.node(id)?;
        if node.name == new_name {
            return Ok(Outcome::unchanged(Operation::Rename, node));
        }
        let parent = tree
            .parent(id)
            .ok_or(InvalidOperation::RootImmutable)?;

        let destination = child_path(&parent.path, new_name)?;
        let path = fs.rename(&node.path, &destination).await?;
        let state = self.commit(Edit::Renamed {
            id: id.clone(),
            path,
        })?;
        self.outcome(Operation::Rename, &state, id)
    }

    /// Change the label shown for the node and rename its entry to a
    /// physical name derived from that label. Folders persist the label in
    /// their sidecar.
    pub async fn update_display_name(
        &self,
        id: &NodeId,
        display_name: &str,
    ) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let tree = snapshot.tree()?;
        let node = tree.node(id)?;
        if node.label() == display_name {
            return Ok(Outcome::unchanged(Operation::Relabel, node));
        }
        if tree.is_root(id) {
            return Err(InvalidOperation::RootImmutable.into());
        }

        let mut journal = Journal::new();
        let path = match fs
            .update_display_name(&node.path, node.kind, id, display_name, &mut journal)
            .await
        {
            Ok(path) => path,
            Err(err) => return Err(self.settle(&fs, journal, err.into()).await),
        };

        let state = self.commit(Edit::Relabeled {
            id: id.clone(),
            display_name: Some(display_name.to_string()),
            path,
        })?;
        self.outcome(Operation::Relabel, &state, id)
    }
}
