//! Live display tree the renderer patches.
//!
//! `Dom` mirrors the handful of DOM calls reconciliation needs. `MemoryDom`
//! is an arena implementation that also logs every mutation, which is how
//! tests and the CLI observe what a patch actually did.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

pub trait Dom {
    type Handle: Clone + PartialEq + fmt::Debug;

    fn create_element(&mut self, tag: &str) -> Self::Handle;
    fn create_text(&mut self, text: &str) -> Self::Handle;
    fn set_attribute(&mut self, node: &Self::Handle, name: &str, value: &str);
    fn remove_attribute(&mut self, node: &Self::Handle, name: &str);
    fn set_text(&mut self, node: &Self::Handle, text: &str);
    fn append_child(&mut self, parent: &Self::Handle, child: &Self::Handle);
    /// Insert (or move) `child` before `reference`; append when there is none
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        reference: Option<&Self::Handle>,
    );
    fn replace_with(&mut self, old: &Self::Handle, new: &Self::Handle);
    fn remove(&mut self, node: &Self::Handle);
    fn children(&self, parent: &Self::Handle) -> Vec<Self::Handle>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(DomId),
    SetAttribute(DomId, String),
    RemoveAttribute(DomId, String),
    SetText(DomId),
    Insert { parent: DomId, child: DomId },
    Replace { old: DomId, new: DomId },
    Remove(DomId),
}

#[derive(Debug, Clone)]
enum Content {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct DomNode {
    content: Content,
    parent: Option<DomId>,
    children: Vec<DomId>,
}

#[derive(Debug, Default)]
pub struct MemoryDom {
    nodes: Vec<DomNode>,
    log: Vec<Mutation>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.log
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.log)
    }

    pub fn parent(&self, node: DomId) -> Option<DomId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn tag(&self, node: DomId) -> Option<&str> {
        match &self.nodes.get(node.0)?.content {
            Content::Element { tag, .. } => Some(tag),
            Content::Text(_) => None,
        }
    }

    pub fn attribute(&self, node: DomId, name: &str) -> Option<&str> {
        match &self.nodes.get(node.0)?.content {
            Content::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            Content::Text(_) => None,
        }
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self, node: DomId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: DomId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        match &n.content {
            Content::Text(t) => out.push_str(t),
            Content::Element { .. } => {
                for child in &n.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Serialize a subtree as HTML with sorted attributes
    pub fn to_html(&self, node: DomId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: DomId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        match &n.content {
            Content::Text(t) => out.push_str(&escape(t)),
            Content::Element { tag, attrs } => {
                let _ = write!(out, "<{}", tag);
                for (k, v) in attrs {
                    let _ = write!(out, " {}=\"{}\"", k, escape(v));
                }
                out.push('>');
                for child in &n.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }

    fn alloc(&mut self, content: Content) -> DomId {
        let id = DomId(self.nodes.len());
        self.nodes.push(DomNode {
            content,
            parent: None,
            children: Vec::new(),
        });
        self.log.push(Mutation::Create(id));
        id
    }

    fn detach(&mut self, node: DomId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Dom for MemoryDom {
    type Handle = DomId;

    fn create_element(&mut self, tag: &str) -> DomId {
        self.alloc(Content::Element {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> DomId {
        self.alloc(Content::Text(text.to_string()))
    }

    fn set_attribute(&mut self, node: &DomId, name: &str, value: &str) {
        if let Content::Element { attrs, .. } = &mut self.nodes[node.0].content {
            attrs.insert(name.to_string(), value.to_string());
            self.log.push(Mutation::SetAttribute(*node, name.to_string()));
        }
    }

    fn remove_attribute(&mut self, node: &DomId, name: &str) {
        if let Content::Element { attrs, .. } = &mut self.nodes[node.0].content {
            attrs.remove(name);
            self.log.push(Mutation::RemoveAttribute(*node, name.to_string()));
        }
    }

    fn set_text(&mut self, node: &DomId, text: &str) {
        if let Content::Text(existing) = &mut self.nodes[node.0].content {
            *existing = text.to_string();
            self.log.push(Mutation::SetText(*node));
        }
    }

    fn append_child(&mut self, parent: &DomId, child: &DomId) {
        self.insert_before(parent, child, None);
    }

    fn insert_before(&mut self, parent: &DomId, child: &DomId, reference: Option<&DomId>) {
        self.detach(*child);
        let siblings = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|r| siblings.iter().position(|c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, *child);
        self.nodes[child.0].parent = Some(*parent);
        self.log.push(Mutation::Insert {
            parent: *parent,
            child: *child,
        });
    }

    fn replace_with(&mut self, old: &DomId, new: &DomId) {
        self.detach(*new);
        if let Some(parent) = self.nodes[old.0].parent.take() {
            let siblings = &mut self.nodes[parent.0].children;
            if let Some(index) = siblings.iter().position(|c| c == old) {
                siblings[index] = *new;
            }
            self.nodes[new.0].parent = Some(parent);
        }
        self.log.push(Mutation::Replace {
            old: *old,
            new: *new,
        });
    }

    fn remove(&mut self, node: &DomId) {
        self.detach(*node);
        self.log.push(Mutation::Remove(*node));
    }

    fn children(&self, parent: &DomId) -> Vec<DomId> {
        self.nodes
            .get(parent.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }
}
