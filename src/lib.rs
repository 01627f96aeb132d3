//! Fliessend: Directory Outlines
//!
//! Presents a filesystem directory as an editable outline. Every structural
//! edit (create, delete, rename, display-name update, indent, outdent, merge)
//! is performed on disk first and then folded into an in-memory tree, which is
//! rendered incrementally through a minimal-diff reconciler.

pub mod config;
pub mod edit;
pub mod error;
pub mod feedback;
pub mod fs;
pub mod logging;
pub mod render;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use edit::OutlineEditor;
pub use error::{ApiError, ErrorKind, InvalidOperation, StorageError};
pub use store::{OutlineState, StateStore};
pub use tree::{Node, OutlineTree};
pub use types::{NodeId, NodeKind};
