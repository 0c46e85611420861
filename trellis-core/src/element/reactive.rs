//! Reactive Rendering
//!
//! A reactive render materializes an element once and re-renders its
//! content whenever a member of an Observed group changes.
//!
//! # How Reactive Rendering Works
//!
//! 1. The element is rendered with the requested placement.
//! 2. One persistent event is registered and attached to every member of
//!    the group. A change selects it; the next drain runs it.
//! 3. Each run discards the previous content and renders the generator's
//!    current output. For elements that owns the node's children. For
//!    `Inplace` renders the content goes straight into the target as
//!    fragment members placed in front of an empty comment anchor, and
//!    only the members this render created are discarded.
//!
//! A reactive fragment opens its anchor where the placement points: at the
//! end of the target, in front of the child at the `Insert` index, or where
//! a `Replace`/`Emplace` target was.
//!
//! A render stays current while its node is alive. An `Inplace` render
//! (a fragment boundary) additionally expires when its parent's children
//! are cleared (the parent's epoch moves on) or when an enclosing fragment
//! re-renders. Once stale, the event reports itself invalid and is dropped
//! by the context.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;

use super::html_element::HtmlElement;
use super::renderer::{render_element, renderer, ElementRenderer, Renderer, RendererType};
use crate::dom::{Dom, NodeRef};
use crate::event::Event;
use crate::reactive::ObservedGroup;
use crate::runtime::Runtime;

/// What a reactive render produces on every change.
#[derive(Clone)]
pub(crate) enum Regenerate {
    Children(Rc<dyn Fn() -> ElementRenderer>),
    Text(Rc<dyn Fn() -> String>),
}

/// One render pass of a fragment boundary.
///
/// Boundaries created while a pass is running are enclosed by it and expire
/// with it. Members they create are recorded on every enclosing pass so an
/// enclosing re-render discards them too.
pub(crate) struct FragmentScope {
    alive: Cell<bool>,
    enclosing: Option<Rc<FragmentScope>>,
    members: RefCell<Vec<NodeRef>>,
}

impl FragmentScope {
    fn new(enclosing: Option<Rc<FragmentScope>>) -> Self {
        Self {
            alive: Cell::new(true),
            enclosing,
            members: RefCell::new(Vec::new()),
        }
    }

    fn is_live(&self) -> bool {
        self.alive.get() && self.enclosing.as_ref().map_or(true, |scope| scope.is_live())
    }

    fn record(&self, created: &[NodeRef]) {
        self.members.borrow_mut().extend_from_slice(created);
        if let Some(enclosing) = &self.enclosing {
            enclosing.record(created);
        }
    }
}

/// Fragment passes currently rendering, innermost last.
pub(crate) type FragmentStack = Rc<RefCell<Vec<Rc<FragmentScope>>>>;

struct FragmentBoundary {
    epoch: u32,
    /// Empty comment node marking where the members go.
    anchor: NodeRef,
    enclosing: Option<Rc<FragmentScope>>,
    pass: RefCell<Rc<FragmentScope>>,
}

struct Refresh {
    node: NodeRef,
    regenerate: Regenerate,
    fragment: Option<FragmentBoundary>,
}

impl FragmentBoundary {
    /// Create the anchor inside `parent`, in front of `sibling` if given.
    fn open(rt: &Runtime, parent: NodeRef, sibling: Option<NodeRef>) -> Option<Self> {
        let enclosing = rt.fragment_scopes().borrow().last().cloned();
        let epoch = rt.dom().epoch(parent)?;
        let anchor = rt.fragment_element(parent, &HtmlElement::comment_node(""))?;
        if let Some(sibling) = sibling {
            let dom = rt.dom();
            if let (Some(parent), Some(anchor), Some(sibling)) =
                (dom.native(parent), dom.native(anchor), dom.native(sibling))
            {
                dom.host().insert_before(parent, anchor, sibling);
            }
        }
        Some(Self {
            epoch,
            anchor,
            pass: RefCell::new(Rc::new(FragmentScope::new(enclosing.clone()))),
            enclosing,
        })
    }
}

impl Refresh {
    fn is_current(&self, dom: &Dom) -> bool {
        if !dom.is_alive(self.node) {
            return false;
        }
        match &self.fragment {
            None => true,
            Some(boundary) => {
                dom.epoch(self.node) == Some(boundary.epoch)
                    && boundary.enclosing.as_ref().map_or(true, |scope| scope.is_live())
            }
        }
    }
}

/// Render `element`, then keep its content in sync with `group`.
pub(crate) fn reactive_render(element: HtmlElement, group: ObservedGroup, regenerate: Regenerate) -> ElementRenderer {
    renderer(move |rt, target, placement| {
        let node = render_element(rt, target, placement, &element)?;

        let fragment = if placement.kind == RendererType::Inplace {
            Some(FragmentBoundary::open(rt, node, None)?)
        } else {
            None
        };
        mount(rt, node, &group, &regenerate, fragment);
        Some(node)
    })
}

/// Render `regenerate`'s output as fragment members at the position
/// `placement` points to, and keep it in sync with `group`.
///
/// Returns the node that owns the members. For `Replace` and `Emplace`
/// that is the target's parent, and the target is destroyed.
pub(crate) fn reactive_fragment(group: ObservedGroup, regenerate: Regenerate) -> ElementRenderer {
    renderer(move |rt, target, placement| {
        let dom = rt.dom();
        if !dom.is_alive(target) {
            return None;
        }
        let (parent, sibling, replaced) = match placement.kind {
            RendererType::Insert => (target, dom.child(target, placement.metadata), None),
            RendererType::Replace | RendererType::Emplace => {
                (dom.parent(target)?, Some(target), Some(target))
            }
            _ => (target, None, None),
        };

        let boundary = FragmentBoundary::open(rt, parent, sibling)?;
        if let Some(replaced) = replaced {
            rt.destroy(replaced);
        }
        mount(rt, parent, &group, &regenerate, Some(boundary));
        Some(parent)
    })
}

fn mount(
    rt: &Runtime,
    node: NodeRef,
    group: &ObservedGroup,
    regenerate: &Regenerate,
    fragment: Option<FragmentBoundary>,
) {
    let state = Rc::new(Refresh {
        node,
        regenerate: regenerate.clone(),
        fragment,
    });
    subscribe(rt, group, &state);
    refresh(rt, &state);
}

fn subscribe(rt: &Runtime, group: &ObservedGroup, state: &Rc<Refresh>) {
    let runtime = rt.downgrade();
    let action_state = state.clone();
    let validity_state = state.clone();
    let dom = rt.dom().clone();

    let id = rt.events().register_event(Event::with_validity(
        move |_| match runtime.upgrade() {
            Some(rt) => {
                refresh(&rt, &action_state);
                action_state.is_current(rt.dom())
            }
            None => false,
        },
        move || validity_state.is_current(&dom),
    ));
    group.attach_event(rt.events(), id);

    if state.fragment.is_none() {
        rt.dom().attach_event(state.node, id);
    }
}

fn refresh(rt: &Runtime, state: &Refresh) {
    if !state.is_current(rt.dom()) {
        return;
    }
    trace!(node = %state.node, fragment = state.fragment.is_some(), "refreshing reactive content");

    let Some(boundary) = &state.fragment else {
        rt.clear_children(state.node);
        match &state.regenerate {
            Regenerate::Children(generate) => {
                generate()(rt, state.node, &Renderer::append());
            }
            Regenerate::Text(generate) => {
                rt.dom().set_text_content(state.node, &generate());
            }
        }
        return;
    };

    let pass = Rc::new(FragmentScope::new(boundary.enclosing.clone()));
    let previous = boundary.pass.replace(pass.clone());
    previous.alive.set(false);
    let stale = previous.members.take();
    for member in stale {
        rt.discard(member);
    }

    let before: HashSet<NodeRef> = owned_nodes(rt.dom(), state.node).into_iter().collect();
    rt.fragment_scopes().borrow_mut().push(pass.clone());
    match &state.regenerate {
        Regenerate::Children(generate) => {
            generate()(rt, state.node, &Renderer::fragment());
        }
        Regenerate::Text(generate) => {
            rt.fragment_element(state.node, &HtmlElement::text_node(generate()));
        }
    }
    rt.fragment_scopes().borrow_mut().pop();

    let created: Vec<NodeRef> = owned_nodes(rt.dom(), state.node)
        .into_iter()
        .filter(|node| !before.contains(node))
        .collect();
    rt.dom().move_before(state.node, &created, boundary.anchor);
    pass.record(&created);
}

fn owned_nodes(dom: &Dom, node: NodeRef) -> Vec<NodeRef> {
    let mut nodes = dom.children(node);
    nodes.extend(dom.fragment_members(node));
    nodes
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
