//! Error types for the filesystem adapter and the structural edit protocol.

use crate::types::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification shared by every failure surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Underlying filesystem failure (permission, not found, busy)
    Io,
    /// Destination name collision
    AlreadyExists,
    /// Root manipulation, missing left/right target, non-folder target
    InvalidOperation,
    /// Destination escapes the expected parent boundary
    TraversalRejected,
}

/// Failures raised by the filesystem adapter
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{op} failed for {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A file or folder with the same name already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Path {} escapes {}", path.display(), boundary.display())]
    TraversalRejected { path: PathBuf, boundary: PathBuf },

    #[error("Invalid metadata in {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Io { .. } | StorageError::Metadata { .. } => ErrorKind::Io,
            StorageError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StorageError::TraversalRejected { .. } => ErrorKind::TraversalRejected,
        }
    }
}

/// Why a structural edit was refused before touching the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    #[error("the root folder cannot be moved or removed")]
    RootImmutable,
    #[error("cannot indent further left")]
    NoLeftTarget,
    #[error("cannot move a node under a file")]
    TargetIsFile,
    #[error("cannot outdent further right")]
    NoGrandparent,
    #[error("cannot merge a node into itself")]
    MergeIntoSelf,
    #[error("cannot merge a folder into one of its own descendants")]
    MergeIntoDescendant,
    #[error("operation requires a folder")]
    NotAFolder,
    #[error("blank creation is only available for folders")]
    BlankFileUnsupported,
    #[error("a node with this id is already in the tree")]
    DuplicateId,
}

/// Failures surfaced by the structural edit protocol
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid operation: {0}")]
    InvalidOperation(InvalidOperation),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("No folder is open")]
    NoTreeLoaded,

    #[error("{cause}; rollback incomplete: {}", compensation_failures.join("; "))]
    Inconsistent {
        cause: Box<ApiError>,
        compensation_failures: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<InvalidOperation> for ApiError {
    fn from(reason: InvalidOperation) -> Self {
        ApiError::InvalidOperation(reason)
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Storage(err) => err.kind(),
            ApiError::InvalidOperation(_)
            | ApiError::NodeNotFound(_)
            | ApiError::NoTreeLoaded
            | ApiError::ConfigError(_) => ErrorKind::InvalidOperation,
            ApiError::Inconsistent { cause, .. } => cause.kind(),
        }
    }

    /// The refusal reason when this is an `InvalidOperation`
    pub fn invalid_reason(&self) -> Option<InvalidOperation> {
        match self {
            ApiError::InvalidOperation(reason) => Some(*reason),
            _ => None,
        }
    }
}
