//! Placement Descriptors
//!
//! A [`Renderer`] says how a freshly described element attaches to its
//! materialization target:
//!
//! | Type     | Target is      | Effect                                              |
//! |----------|----------------|-----------------------------------------------------|
//! | Append   | parent         | new last child                                      |
//! | Insert   | parent         | new child at `metadata`, or last if out of range    |
//! | Replace  | existing node  | new node takes the target's place; target destroyed |
//! | Emplace  | existing node  | target handle kept and re-materialized in place     |
//! | Inplace  | parent         | no node created; the parent is returned             |
//! | Fragment | parent         | new node owned as a fragment member of the parent   |
//!
//! An [`ElementRenderer`] is the deferred form of a description: a function
//! that materializes it against a target when called.

use std::rc::Rc;

use tracing::trace;

use super::html_element::HtmlElement;
use crate::dom::NodeRef;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RendererType {
    #[default]
    Append,
    Insert,
    Replace,
    Emplace,
    Inplace,
    Fragment,
}

/// Placement descriptor: a type plus type-specific metadata (the index for
/// `Insert`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Renderer {
    pub kind: RendererType,
    pub metadata: usize,
}

impl Renderer {
    pub const fn new(kind: RendererType, metadata: usize) -> Self {
        Self { kind, metadata }
    }

    pub const fn append() -> Self {
        Self::new(RendererType::Append, 0)
    }

    pub const fn insert(index: usize) -> Self {
        Self::new(RendererType::Insert, index)
    }

    pub const fn replace() -> Self {
        Self::new(RendererType::Replace, 0)
    }

    pub const fn emplace() -> Self {
        Self::new(RendererType::Emplace, 0)
    }

    pub const fn inplace() -> Self {
        Self::new(RendererType::Inplace, 0)
    }

    pub const fn fragment() -> Self {
        Self::new(RendererType::Fragment, 0)
    }
}

/// Materializes a description against a target. Returns the created node,
/// the target itself for `Inplace`, or `None` when nothing was created.
pub type ElementRenderer = Rc<dyn Fn(&Runtime, NodeRef, &Renderer) -> Option<NodeRef>>;

/// Wrap a closure as an [`ElementRenderer`].
pub fn renderer<F>(render: F) -> ElementRenderer
where
    F: Fn(&Runtime, NodeRef, &Renderer) -> Option<NodeRef> + 'static,
{
    Rc::new(render)
}

/// Materialize `element` against `target` as `placement` describes.
pub fn render_element(
    rt: &Runtime,
    target: NodeRef,
    placement: &Renderer,
    element: &HtmlElement,
) -> Option<NodeRef> {
    trace!(placement = ?placement.kind, tag = element.name(), "rendering element");
    match placement.kind {
        RendererType::Append => rt.append_element(target, element),
        RendererType::Insert => rt.insert_element(target, placement.metadata, element),
        RendererType::Replace => rt.replace_element(target, element),
        RendererType::Emplace => rt.emplace_element(target, element),
        RendererType::Fragment => rt.fragment_element(target, element),
        RendererType::Inplace => rt.dom().is_alive(target).then_some(target),
    }
}
