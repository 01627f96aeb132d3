use super::{OutlineEditor, Operation, Outcome};
use crate::error::{ApiError, InvalidOperation};
use crate::fs::Journal;
use crate::store::Edit;
use crate::types::NodeId;
use tracing::debug;

impl OutlineEditor {
    /// Fold `source` into `target`: its entries move into the target folder,
    /// its directory goes away, and the target's label becomes the target
    /// label followed by the source label.
    ///
    /// When any step fails the applied steps are undone in reverse (unless
    /// compensation is disabled) and the tree stays as it was.
    pub async fn merge(&self, source: &NodeId, target: &NodeId) -> Result<Outcome, ApiError> {
        let (snapshot, fs) = self.session()?;
        let tree = snapshot.tree()?;
        if source == target {
            return Err(InvalidOperation::MergeIntoSelf.into());
        }
        if tree.is_root(source) || tree.is_root(target) {
            return Err(InvalidOperation::RootImmutable.into());
        }
        let source_node = tree.node(source)?;
        let target_node = tree.node(target)?;
        if !source_node.is_folder() || !target_node.is_folder() {
            return Err(InvalidOperation::NotAFolder.into());
        }
        if tree.is_ancestor_of(source, target) {
            return Err(InvalidOperation::MergeIntoDescendant.into());
        }

        let label = format!("{}{}", target_node.label(), source_node.label());
        let relabel = label != target_node.label();
        debug!(source = %source_node.path.display(), target = %target_node.path.display(), label = %label, "Planning merge");

        let mut journal = Journal::new();
        let applied = async {
            fs.merge_directories(&source_node.path, &target_node.path, &mut journal)
                .await?;
            if !relabel {
                return Ok(target_node.path.clone());
            }
            fs.update_display_name(
                &target_node.path,
                target_node.kind,
                target,
                &label,
                &mut journal,
            )
            .await
        }
        .await;
        let target_path = match applied {
            Ok(path) => path,
            Err(err) => return Err(self.settle(&fs, journal, err.into()).await),
        };

        let display_name = if relabel {
            Some(label)
        } else {
            target_node.display_name.clone()
        };
        let state = self.commit(Edit::Merged {
            source: source.clone(),
            target: target.clone(),
            display_name,
            target_path,
        })?;
        self.outcome(Operation::Merge, &state, target)
    }
}
