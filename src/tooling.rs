//! Tooling & Integration Layer
//!
//! Command-line access to the outline editor and the text/JSON/HTML
//! renderings it prints.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
