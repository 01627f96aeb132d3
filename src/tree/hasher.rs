//! NodeId minting
//!
//! Ids are the hex prefix of a BLAKE3 hash over a per-process seed, a
//! monotonically increasing counter, and the path the node was minted for.
//! The counter alone makes ids unique within a process; the seed keeps ids
//! written to sidecars by earlier sessions from colliding with new ones.

use crate::types::NodeId;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

const ID_HEX_LEN: usize = 20;

static COUNTER: AtomicU64 = AtomicU64::new(0);
static SEED: OnceLock<[u8; 32]> = OnceLock::new();

fn session_seed() -> &'static [u8; 32] {
    SEED.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&std::process::id().to_le_bytes());
        *hasher.finalize().as_bytes()
    })
}

/// Mint a fresh identifier for a node at `path`
pub fn mint_node_id(path: &Path) -> NodeId {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = blake3::Hasher::new();
    hasher.update(session_seed());
    hasher.update(&n.to_le_bytes());
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = hex::encode(hasher.finalize().as_bytes());
    NodeId::new(&digest[..ID_HEX_LEN])
}
