//! Sidecar metadata stored next to a folder's children.
//!
//! Shape on disk: `{ "id": "...", "displayName": "..." }`. Unknown keys are
//! kept when the file is rewritten.

use crate::error::StorageError;
use crate::fs::contract::FsBackend;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarMetadata {
    pub id: NodeId,
    #[serde(default)]
    pub display_name: String,
}

pub fn sidecar_path(folder: &Path, file_name: &str) -> PathBuf {
    folder.join(file_name)
}

/// Read the sidecar in `folder`. `Ok(None)` when there is none.
pub async fn read_sidecar(
    backend: &dyn FsBackend,
    folder: &Path,
    file_name: &str,
) -> Result<Option<SidecarMetadata>, StorageError> {
    let path = sidecar_path(folder, file_name);
    let bytes = match backend.read_file(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StorageError::io("read sidecar", path, err)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StorageError::Metadata { path, source })
}

/// Write a fresh sidecar, replacing any existing file
pub async fn write_sidecar(
    backend: &dyn FsBackend,
    folder: &Path,
    file_name: &str,
    metadata: &SidecarMetadata,
) -> Result<(), StorageError> {
    let path = sidecar_path(folder, file_name);
    let bytes = serde_json::to_vec_pretty(metadata)
        .map_err(|source| StorageError::Metadata {
            path: path.clone(),
            source,
        })?;
    backend
        .write_file(&path, &bytes)
        .await
        .map_err(|err| StorageError::io("write sidecar", path, err))
}

/// Set `id` and `displayName` in the sidecar, keeping any other keys.
///
/// Returns the previous raw contents so the caller can restore them.
pub async fn upsert_display_name(
    backend: &dyn FsBackend,
    folder: &Path,
    file_name: &str,
    id: &NodeId,
    display_name: &str,
) -> Result<Option<Vec<u8>>, StorageError> {
    let path = sidecar_path(folder, file_name);
    let previous = match backend.read_file(&path).await {
        Ok(bytes) => Some(bytes),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(StorageError::io("read sidecar", path, err)),
    };

    let mut object = previous
        .as_deref()
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(bytes).ok())
        .and_then(|value| match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();
    object
        .entry("id")
        .or_insert_with(|| serde_json::Value::String(id.to_string()));
    object.insert(
        "displayName".to_string(),
        serde_json::Value::String(display_name.to_string()),
    );

    let bytes = serde_json::to_vec_pretty(&serde_json::Value::Object(object))
        .map_err(|source| StorageError::Metadata {
            path: path.clone(),
            source,
        })?;
    backend
        .write_file(&path, &bytes)
        .await
        .map_err(|err| StorageError::io("write sidecar", path, err))?;
    Ok(previous)
}
