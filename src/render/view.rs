//! View tree: lightweight element descriptions produced from outline state.

use crate::store::OutlineState;
use crate::tree::model::OutlineTree;
use crate::tree::node::Node;
use crate::types::NodeId;
use std::collections::{BTreeMap, HashSet};

pub const EMPTY_STATE_TITLE: &str = "Open a folder to get started";
pub const EMPTY_STATE_HINT: &str = "Use the \"Open folder\" command";
/// Label shown for a node whose display name is deliberately empty
pub const BLANK_LABEL: &str = "blank";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Identity used by keyed reconciliation
    pub key: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<ViewNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewNode {
    Element(Element),
    Text(String),
}

impl ViewNode {
    pub fn key(&self) -> Option<&str> {
        match self {
            ViewNode::Element(el) => el.key.as_deref(),
            ViewNode::Text(_) => None,
        }
    }

    pub fn with_key(self, key: impl Into<String>) -> Self {
        match self {
            ViewNode::Element(mut el) => {
                el.key = Some(key.into());
                ViewNode::Element(el)
            }
            text => text,
        }
    }

    pub fn children(&self) -> &[ViewNode] {
        match self {
            ViewNode::Element(el) => &el.children,
            ViewNode::Text(_) => &[],
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            ViewNode::Element(el) => el.attrs.get(name).map(String::as_str),
            ViewNode::Text(_) => None,
        }
    }

    /// Number of view nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(ViewNode::size).sum::<usize>()
    }
}

/// Element builder
pub fn h<I, K, V>(tag: &str, attrs: I, children: Vec<ViewNode>) -> ViewNode
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    ViewNode::Element(Element {
        tag: tag.to_string(),
        key: None,
        attrs: attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
        children,
    })
}

pub fn text(content: impl Into<String>) -> ViewNode {
    ViewNode::Text(content.into())
}

fn no_attrs() -> [(&'static str, &'static str); 0] {
    []
}

/// Label as shown in the outline
pub fn display_label(node: &Node) -> &str {
    match node.display_name.as_deref() {
        Some("") => BLANK_LABEL,
        Some(name) => name,
        None => &node.name,
    }
}

/// View tree for the whole outline, or the empty-state panel without a tree
pub fn render_outline(state: &OutlineState, indent_px: u32) -> ViewNode {
    match state.tree.as_deref() {
        Some(tree) => render_node(
            tree,
            tree.root_id(),
            0,
            state.selected.as_ref(),
            &state.expanded,
            indent_px,
        ),
        None => h(
            "div",
            [("class", "empty-state")],
            vec![
                h("p", no_attrs(), vec![text(EMPTY_STATE_TITLE)]),
                h("p", [("class", "empty-state-hint")], vec![text(EMPTY_STATE_HINT)]),
            ],
        ),
    }
}

fn render_node(
    tree: &OutlineTree,
    id: &NodeId,
    level: u32,
    selected: Option<&NodeId>,
    expanded: &HashSet<NodeId>,
    indent_px: u32,
) -> ViewNode {
    let Some(node) = tree.get(id) else {
        return text("");
    };

    let class = if selected == Some(id) {
        "tree-node selected"
    } else {
        "tree-node"
    };
    let label = h(
        "span",
        [("class", "tree-node-name"), ("contenteditable", "true")],
        vec![text(display_label(node))],
    );

    let mut children = vec![label];
    if expanded.contains(id) {
        children.extend(
            node.children
                .iter()
                .map(|child| render_node(tree, child, level + 1, selected, expanded, indent_px)),
        );
    }

    h(
        "div",
        [
            ("class", class.to_string()),
            ("data-node-id", node.id.to_string()),
            ("data-node-type", node.kind.to_string()),
            ("data-node-name", node.name.clone()),
            ("style", format!("padding-left: {}px", level * indent_px)),
        ],
        children,
    )
    .with_key(node.id.as_str())
}
