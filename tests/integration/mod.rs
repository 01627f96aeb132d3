//! Integration tests for the outline editor and renderer

mod invariants_prop;
mod merge;
mod reconciliation;
mod structural_edits;
mod support;
mod tree_builder;
