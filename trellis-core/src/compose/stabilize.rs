//! Stabilized subtrees
//!
//! A reactive block rebuilds its content on every change. Wrapping part of
//! that content in [`stabilize`] keeps it: the first render creates the
//! subtree and marks its root stable, and later renders move the same node
//! into place instead of creating a new one. Clearing or destroying the
//! enclosing block detaches a stable node rather than destroying it.
//!
//! A later pass moves the kept node back into place. It does not leave an
//! empty placeholder behind in the position the node was first rendered at.
//!
//! Calling [`StableElement::reset`] makes the next render recreate the
//! subtree.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::dom::NodeRef;
use crate::element::{renderer, ElementRenderer};
use crate::runtime::Runtime;

#[derive(Debug, Default)]
struct StableState {
    node: Option<NodeRef>,
    reset: bool,
}

/// Slot holding a stabilized subtree across re-renders.
#[derive(Debug, Clone, Default)]
pub struct StableElement {
    state: Rc<RefCell<StableState>>,
}

impl StableElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recreate the subtree on the next render.
    pub fn reset(&self) {
        self.state.borrow_mut().reset = true;
    }

    /// Root of the current subtree, if it was rendered.
    pub fn node(&self) -> Option<NodeRef> {
        self.state.borrow().node
    }

    /// Destroy the current subtree.
    pub fn destroy(&self, rt: &Runtime) {
        let node = self.state.borrow_mut().node.take();
        if let Some(node) = node {
            rt.destroy(node);
        }
    }
}

/// Render `content` once into `stable` and reuse the node afterwards.
///
/// # Example
///
/// ```rust,ignore
/// let editor = StableElement::new();
/// let view = div([]).reactive(&layout, move || {
///     fragment([
///         header_for(layout.get()),
///         stabilize(&editor, textarea([]).render()),
///     ])
/// });
/// ```
pub fn stabilize(stable: &StableElement, content: ElementRenderer) -> ElementRenderer {
    let stable = stable.clone();
    renderer(move |rt, target, placement| {
        let (existing, reset) = {
            let state = stable.state.borrow();
            (state.node, state.reset)
        };

        if let Some(node) = existing.filter(|node| rt.dom().is_alive(*node)) {
            if !reset {
                rt.detach(node);
                return rt.place(target, placement, node);
            }
            rt.destroy(node);
        }

        {
            let mut state = stable.state.borrow_mut();
            state.node = None;
            state.reset = false;
        }

        let node = content(rt, target, placement)?;
        if node == target {
            debug!(%node, "stabilized content rendered into its target, nothing to keep");
            return Some(node);
        }
        rt.dom().set_stable(node, true);
        stable.state.borrow_mut().node = Some(node);
        Some(node)
    })
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
