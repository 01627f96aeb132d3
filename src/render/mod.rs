//! Incremental reconciliation renderer: view tree, diffing and the live
//! display it patches.

pub mod diff;
pub mod dom;
pub mod renderer;
pub mod view;

pub use diff::{diff, mount, DiffStrategy, Patch};
pub use dom::{Dom, MemoryDom};
pub use renderer::Renderer;
pub use view::{h, render_outline, text, ViewNode};
