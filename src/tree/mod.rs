//! Outline tree: node model, arena, builder and integrity checks.

pub mod audit;
pub mod builder;
pub mod hasher;
pub mod model;
pub mod node;
pub mod path;

pub use builder::TreeBuilder;
pub use model::{OutlineTree, Position};
pub use node::{Node, NodeStats};
