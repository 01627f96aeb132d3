use super::{OutlineEditor, Operation, Outcome};
use crate::error::{ApiError, InvalidOperation};
use crate::store::Edit;
use crate::types::{NodeId, NodeKind};

impl OutlineEditor {
    /// Create a file or folder under `parent`. Without a name a blank folder
    /// with an empty display name is made. The new node is appended to the
    /// parent's children, the parent is expanded and the node selected.
    pub async fn create(
        &self,
        parent: &NodeId,
        name: Option<&str>,
        kind: NodeKind,
    ) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let parent_node = snapshot.tree()?.node(parent)?;
        if !parent_node.is_folder() {
            return Err(InvalidOperation::NotAFolder.into());
        }

        let node = fs.create(&parent_node.path, name, kind).await?;
        let id = node.id.clone();
        let state = self.commit(Edit::Inserted {
            parent: parent.clone(),
            node,
        })?;
        self.outcome(Operation::Create, &state, &id)
    }
}
