//! Filesystem side of the outline: backend contract, backends, sidecar
//! metadata, compensation journal and the adapter used by the editor.

pub mod contract;
pub mod journal;
pub mod memory;
pub mod outline_fs;
pub mod sidecar;
pub mod tokio_backend;

pub use contract::{EntryStat, FsBackend};
pub use journal::{Compensation, Journal};
pub use memory::{FsOp, MemoryFsBackend};
pub use outline_fs::OutlineFs;
pub use tokio_backend::TokioFsBackend;
