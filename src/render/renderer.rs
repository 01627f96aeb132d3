//! Renderer: keeps a live `Dom` in step with the State Store.

use crate::config::RenderConfig;
use crate::render::diff::{diff, mount, DiffStrategy};
use crate::render::dom::Dom;
use crate::render::view::{render_outline, ViewNode};
use crate::store::{OutlineState, StateStore, SubscriptionId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

pub struct Renderer<D: Dom> {
    dom: D,
    container: D::Handle,
    strategy: DiffStrategy,
    indent_px: u32,
    current: Option<(ViewNode, D::Handle)>,
}

impl<D: Dom> Renderer<D> {
    /// Render into `container`, which the renderer owns the children of
    pub fn new(dom: D, container: D::Handle, config: &RenderConfig) -> Self {
        Self {
            dom,
            container,
            strategy: config.strategy,
            indent_px: config.indent_px,
            current: None,
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn container(&self) -> &D::Handle {
        &self.container
    }

    /// Live node for the outline root, once something was rendered
    pub fn root(&self) -> Option<&D::Handle> {
        self.current.as_ref().map(|(_, handle)| handle)
    }

    pub fn view(&self) -> Option<&ViewNode> {
        self.current.as_ref().map(|(view, _)| view)
    }

    /// Bring the display in line with `state`: mount on first use, patch after
    pub fn render(&mut self, state: &OutlineState) {
        let next = render_outline(state, self.indent_px);
        let handle = match self.current.take() {
            None => {
                for stale in self.dom.children(&self.container) {
                    self.dom.remove(&stale);
                }
                let handle = mount(&mut self.dom, &next);
                self.dom.append_child(&self.container, &handle);
                handle
            }
            Some((previous, handle)) => {
                let patch = diff(&previous, &next, self.strategy);
                trace!(noop = patch.is_noop(), "Patching outline view");
                match patch.apply(&mut self.dom, &handle) {
                    Some(handle) => handle,
                    None => {
                        let handle = mount(&mut self.dom, &next);
                        self.dom.append_child(&self.container, &handle);
                        handle
                    }
                }
            }
        };
        self.current = Some((next, handle));
    }
}

/// Render the current snapshot, then re-render on every published change
pub fn attach<D>(renderer: Arc<Mutex<Renderer<D>>>, store: &StateStore) -> SubscriptionId
where
    D: Dom + Send + 'static,
    D::Handle: Send,
{
    renderer.lock().render(&store.snapshot());
    store.subscribe(move |state| renderer.lock().render(state))
}
