//! Reconciliation: compute a patch between two view trees and apply it to a
//! live `Dom`.
//!
//! Nodes at the same position are compared; a differing tag or node type
//! replaces the whole subtree, otherwise attributes are diffed key by key and
//! children are reconciled with the selected strategy:
//!
//! - `Keyed` matches children by key (unkeyed children get positional keys
//!   among themselves), removes and inserts explicitly, and only moves the
//!   children outside a longest increasing subsequence of old positions.
//! - `Positional` pairs children by index, appends extra new children and
//!   removes extra old ones.
//!
//! Diffing a tree against an equal tree yields a patch that performs no
//! mutations.

use crate::render::dom::Dom;
use crate::render::view::{Element, ViewNode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStrategy {
    #[default]
    Keyed,
    Positional,
}

impl std::str::FromStr for DiffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyed" => Ok(DiffStrategy::Keyed),
            "positional" => Ok(DiffStrategy::Positional),
            other => Err(format!("unknown diff strategy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrChange {
    Set(String, String),
    Remove(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    Keep,
    /// Render the new subtree and swap it in
    Replace(ViewNode),
    SetText(String),
    Remove,
    Update {
        attrs: Vec<AttrChange>,
        children: ChildrenPatch,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildrenPatch {
    Positional {
        /// One patch per old child, by index
        patches: Vec<Patch>,
        append: Vec<ViewNode>,
    },
    Keyed {
        /// Old child indices to remove
        removed: Vec<usize>,
        /// New children in order
        entries: Vec<KeyedEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyedEntry {
    Insert(ViewNode),
    Reuse {
        from: usize,
        patch: Patch,
        /// Needs repositioning among its siblings
        moved: bool,
    },
}

impl ChildrenPatch {
    pub fn is_noop(&self) -> bool {
        match self {
            ChildrenPatch::Positional { patches, append } => {
                append.is_empty() && patches.iter().all(Patch::is_noop)
            }
            ChildrenPatch::Keyed { removed, entries } => {
                removed.is_empty()
                    && entries.iter().all(|e| match e {
                        KeyedEntry::Reuse { patch, moved, .. } => !moved && patch.is_noop(),
                        KeyedEntry::Insert(_) => false,
                    })
            }
        }
    }
}

impl Patch {
    pub fn is_noop(&self) -> bool {
        match self {
            Patch::Keep => true,
            Patch::Update { attrs, children } => attrs.is_empty() && children.is_noop(),
            _ => false,
        }
    }

    /// Apply to the live node for the old view tree; returns the node that now
    /// stands in its place (`None` once removed).
    pub fn apply<D: Dom>(&self, dom: &mut D, node: &D::Handle) -> Option<D::Handle> {
        match self {
            Patch::Keep => Some(node.clone()),
            Patch::Replace(view) => {
                let replacement = mount(dom, view);
                dom.replace_with(node, &replacement);
                Some(replacement)
            }
            Patch::SetText(text) => {
                dom.set_text(node, text);
                Some(node.clone())
            }
            Patch::Remove => {
                dom.remove(node);
                None
            }
            Patch::Update { attrs, children } => {
                for change in attrs {
                    match change {
                        AttrChange::Set(name, value) => dom.set_attribute(node, name, value),
                        AttrChange::Remove(name) => dom.remove_attribute(node, name),
                    }
                }
                children.apply(dom, node);
                Some(node.clone())
            }
        }
    }
}

impl ChildrenPatch {
    fn apply<D: Dom>(&self, dom: &mut D, parent: &D::Handle) {
        if self.is_noop() {
            return;
        }
        let live = dom.children(parent);
        match self {
            ChildrenPatch::Positional { patches, append } => {
                for (patch, child) in patches.iter().zip(live.iter()) {
                    patch.apply(dom, child);
                }
                for view in append {
                    let child = mount(dom, view);
                    dom.append_child(parent, &child);
                }
            }
            ChildrenPatch::Keyed { removed, entries } => {
                for index in removed {
                    if let Some(child) = live.get(*index) {
                        dom.remove(child);
                    }
                }

                let mut placed: Vec<Option<(D::Handle, bool)>> = Vec::with_capacity(entries.len());
                for entry in entries {
                    match entry {
                        KeyedEntry::Insert(_) => placed.push(None),
                        KeyedEntry::Reuse { from, patch, moved } => {
                            let handle = live.get(*from).and_then(|child| patch.apply(dom, child));
                            placed.push(handle.map(|h| (h, *moved)));
                        }
                    }
                }

                let mut anchor: Option<D::Handle> = None;
                for (entry, slot) in entries.iter().zip(placed).rev() {
                    let handle = match (entry, slot) {
                        (KeyedEntry::Insert(view), _) => {
                            let child = mount(dom, view);
                            dom.insert_before(parent, &child, anchor.as_ref());
                            child
                        }
                        (_, Some((handle, true))) => {
                            dom.insert_before(parent, &handle, anchor.as_ref());
                            handle
                        }
                        (_, Some((handle, false))) => handle,
                        (_, None) => continue,
                    };
                    anchor = Some(handle);
                }
            }
        }
    }
}

/// Render a view subtree into new live nodes
pub fn mount<D: Dom>(dom: &mut D, view: &ViewNode) -> D::Handle {
    match view {
        ViewNode::Text(text) => dom.create_text(text),
        ViewNode::Element(el) => {
            let handle = dom.create_element(&el.tag);
            for (name, value) in &el.attrs {
                dom.set_attribute(&handle, name, value);
            }
            for child in &el.children {
                let child_handle = mount(dom, child);
                dom.append_child(&handle, &child_handle);
            }
            handle
        }
    }
}

/// Patch turning `old` into `new`
pub fn diff(old: &ViewNode, new: &ViewNode, strategy: DiffStrategy) -> Patch {
    match (old, new) {
        (ViewNode::Text(a), ViewNode::Text(b)) => {
            if a == b {
                Patch::Keep
            } else {
                Patch::SetText(b.clone())
            }
        }
        (ViewNode::Element(a), ViewNode::Element(b)) if a.tag == b.tag => {
            let attrs = diff_attrs(a, b);
            let children = match strategy {
                DiffStrategy::Positional => diff_children_positional(&a.children, &b.children),
                DiffStrategy::Keyed => diff_children_keyed(&a.children, &b.children),
            };
            let patch = Patch::Update { attrs, children };
            if patch.is_noop() {
                Patch::Keep
            } else {
                patch
            }
        }
        _ => Patch::Replace(new.clone()),
    }
}

fn diff_attrs(old: &Element, new: &Element) -> Vec<AttrChange> {
    let mut changes: Vec<AttrChange> = new
        .attrs
        .iter()
        .filter(|(name, value)| old.attrs.get(*name) != Some(*value))
        .map(|(name, value)| AttrChange::Set(name.clone(), value.clone()))
        .collect();
    changes.extend(
        old.attrs
            .keys()
            .filter(|name| !new.attrs.contains_key(*name))
            .map(|name| AttrChange::Remove(name.clone())),
    );
    changes
}

fn diff_children_positional(old: &[ViewNode], new: &[ViewNode]) -> ChildrenPatch {
    let patches = old
        .iter()
        .enumerate()
        .map(|(i, old_child)| match new.get(i) {
            Some(new_child) => diff(old_child, new_child, DiffStrategy::Positional),
            None => Patch::Remove,
        })
        .collect();
    let append = new.iter().skip(old.len()).cloned().collect();
    ChildrenPatch::Positional { patches, append }
}

/// Keys for reconciliation: explicit keys, else `#n` among the unkeyed.
/// `None` when keys collide, in which case positional pairing is used.
fn child_keys(children: &[ViewNode]) -> Option<Vec<String>> {
    let mut unkeyed = 0usize;
    let mut seen = HashSet::with_capacity(children.len());
    let mut keys = Vec::with_capacity(children.len());
    for child in children {
        let key = match child.key() {
            Some(key) => format!("k:{}", key),
            None => {
                unkeyed += 1;
                format!("#{}", unkeyed - 1)
            }
        };
        if !seen.insert(key.clone()) {
            return None;
        }
        keys.push(key);
    }
    Some(keys)
}

fn diff_children_keyed(old: &[ViewNode], new: &[ViewNode]) -> ChildrenPatch {
    let (Some(old_keys), Some(new_keys)) = (child_keys(old), child_keys(new)) else {
        return diff_children_positional(old, new);
    };

    let old_index: HashMap<&str, usize> = old_keys
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect();
    let new_set: HashSet<&str> = new_keys.iter().map(String::as_str).collect();

    let removed = old_keys
        .iter()
        .enumerate()
        .filter(|(_, k)| !new_set.contains(k.as_str()))
        .map(|(i, _)| i)
        .collect();

    let sources: Vec<Option<usize>> = new_keys
        .iter()
        .map(|k| old_index.get(k.as_str()).copied())
        .collect();
    let reused: Vec<usize> = sources.iter().flatten().copied().collect();
    let stable: HashSet<usize> = longest_increasing_subsequence(&reused)
        .into_iter()
        .map(|i| reused[i])
        .collect();

    let entries = new
        .iter()
        .zip(sources)
        .map(|(new_child, source)| match source {
            Some(from) => KeyedEntry::Reuse {
                from,
                patch: diff(&old[from], new_child, DiffStrategy::Keyed),
                moved: !stable.contains(&from),
            },
            None => KeyedEntry::Insert(new_child.clone()),
        })
        .collect();

    ChildrenPatch::Keyed { removed, entries }
}

/// Indices (into `seq`) of one longest strictly increasing subsequence
pub fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    // tails[k]: index in `seq` of the smallest tail of an increasing run of length k+1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];
    for (i, &value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < value);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut out = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        out.push(i);
        cursor = prev[i];
    }
    out.reverse();
    out
}
