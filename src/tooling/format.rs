//! Text, JSON and HTML renderings of an outline and of audit reports.

use crate::config::RenderConfig;
use crate::error::ApiError;
use crate::render::dom::{Dom, MemoryDom};
use crate::render::renderer::Renderer;
use crate::render::view::display_label;
use crate::store::OutlineState;
use crate::tree::audit::{AuditReport, Discrepancy};
use crate::tree::model::OutlineTree;
use crate::types::NodeId;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{json, Value};

/// Section heading in bold/underline
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Indented outline of the visible nodes. `>` marks the selection, `+` a
/// collapsed folder and `-` an expanded one.
pub fn format_outline_text(state: &OutlineState) -> Result<String, ApiError> {
    let tree = state.tree()?;
    let mut out = String::new();
    for node in state.visible() {
        let marker = match (node.is_folder(), state.is_expanded(&node.id)) {
            (true, true) => "-",
            (true, false) => "+",
            (false, _) => " ",
        };
        let cursor = if state.selected.as_ref() == Some(&node.id) {
            ">"
        } else {
            " "
        };
        let indent = "  ".repeat(tree.depth(&node.id));
        out.push_str(&format!(
            "{}{}{} {}\n",
            cursor,
            indent,
            marker,
            display_label(node)
        ));
    }
    Ok(out)
}

fn node_json(tree: &OutlineTree, id: &NodeId) -> Value {
    let Some(node) = tree.get(id) else {
        return Value::Null;
    };
    let children: Vec<Value> = node
        .children
        .iter()
        .map(|child| node_json(tree, child))
        .collect();
    json!({
        "id": node.id,
        "name": node.name,
        "displayName": node.display_name,
        "type": node.kind,
        "path": node.path,
        "children": children,
    })
}

pub fn format_outline_json(state: &OutlineState) -> Result<String, ApiError> {
    let tree = state.tree()?;
    let out = json!({
        "selected": state.selected,
        "root": node_json(tree, tree.root_id()),
    });
    serde_json::to_string_pretty(&out)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize outline: {}", e)))
}

/// Mount the outline into an in-memory display and serialize it
pub fn format_outline_html(state: &OutlineState, config: &RenderConfig) -> String {
    let mut dom = MemoryDom::new();
    let container = dom.create_element("div");
    dom.set_attribute(&container, "id", "fileTree");
    let mut renderer = Renderer::new(dom, container, config);
    renderer.render(state);
    renderer.dom().to_html(container)
}

pub fn format_audit_report(report: &AuditReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Outline audit"));
    out.push_str(&format!("  Entries on disk: {}\n", report.disk_entries));
    out.push_str(&format!("  Nodes in outline: {}\n", report.tree_nodes));
    if report.is_clean() {
        out.push_str("  All checks passed\n");
        return out;
    }

    out.push_str(&format!("\n  Discrepancies ({}):\n\n", report.discrepancies.len()));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "Detail"]);
    for discrepancy in &report.discrepancies {
        let kind = match discrepancy {
            Discrepancy::MissingFromTree(_) => "not in outline",
            Discrepancy::MissingOnDisk(_) => "missing on disk",
            Discrepancy::KindMismatch { .. } => "kind mismatch",
            Discrepancy::Invariant(_) => "invariant",
        };
        table.add_row(vec![kind.to_string(), discrepancy.to_string()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}
