//! Human-readable status lines for edit outcomes and failures

use crate::edit::{Operation, Outcome};
use crate::error::{ApiError, StorageError};

pub const READY: &str = "Ready";
pub const NO_CHANGES: &str = "No changes";

/// Short verb for a completed operation
pub fn success_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Open => "Loaded",
        Operation::Create => "Created",
        Operation::Delete => "Deleted",
        Operation::Rename => "Renamed",
        Operation::Relabel => "Display name updated",
        Operation::Indent | Operation::Outdent => "Moved",
        Operation::Merge => "Merged",
        Operation::OpenExternally => "Opened",
    }
}

pub fn status_for_outcome(outcome: &Outcome) -> String {
    if !outcome.changed && outcome.operation != Operation::OpenExternally {
        return NO_CHANGES.to_string();
    }
    let subject = match outcome.operation {
        Operation::Open | Operation::OpenExternally => outcome.path.display().to_string(),
        _ => outcome.label.clone(),
    };
    format!("{}: {}", success_message(outcome.operation), subject)
}

/// The line shown when an operation fails. Refusals are shown as their
/// reason alone.
pub fn status_for_error(err: &ApiError) -> String {
    match err {
        ApiError::InvalidOperation(reason) => reason.to_string(),
        ApiError::Storage(StorageError::AlreadyExists { .. }) => {
            "A file or folder with the same name already exists".to_string()
        }
        ApiError::Inconsistent { .. } => format!("Error: {} (run `validate`)", err),
        _ => format!("Error: {}", err),
    }
}
