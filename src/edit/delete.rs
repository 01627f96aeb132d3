use super::{OutlineEditor, Operation, Outcome};
use crate::error::{ApiError, InvalidOperation};
use crate::store::Edit;
use crate::types::NodeId;
use tracing::info;

impl OutlineEditor {
    /// Remove the node's entry recursively, then drop it from the tree.
    /// The parent becomes selected.
    pub async fn delete(&self, id: &NodeId) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let tree = snapshot.tree()?;
        if tree.is_root(id) {
            return Err(InvalidOperation::RootImmutable.into());
        }
        let node = tree.node(id)?;

        fs.remove(&node.path).await?;
        self.commit(Edit::Removed { id: id.clone() })?;
        info!(operation = "delete", path = %node.path.display(), "Structural edit applied");
        Ok(Outcome::of(Operation::Delete, node))
    }
}
