//! Delocalized elements
//!
//! A [`Delocalized`] element is one persistent subtree that can show up in
//! any of several named slots. Each slot is a wrapper rendered by
//! [`delocalized_slot`]; the wrapper whose id matches the current slot holds
//! the subtree, every other wrapper shows an alternative.
//!
//! # How Moving Works
//!
//! 1. The subtree is created the first time a matching slot renders, and its
//!    root is marked stable.
//! 2. Changing the slot re-renders every wrapper. The one losing the
//!    subtree detaches it while clearing its children; the one gaining it
//!    moves the same node in.
//! 3. Setting new content recreates the subtree on the next render.

use std::cell::RefCell;
use std::rc::Rc;

use super::stabilize::{stabilize, StableElement};
use crate::dom::NodeRef;
use crate::element::{div, style, Attribute, ElementRenderer};
use crate::reactive::Observed;
use crate::runtime::Runtime;

/// A subtree that moves between slots.
///
/// # Example
///
/// ```rust,ignore
/// let player = Delocalized::with_content("sidebar", video([]).render());
///
/// let view = div([]).children([
///     delocalized_slot("sidebar", &player, [class().value("small")]),
///     delocalized_slot("theater", &player, [class().value("large")]),
/// ]);
///
/// player.set_slot("theater"); // the same video node moves over
/// ```
pub struct Delocalized<S: 'static> {
    content: Rc<RefCell<Option<ElementRenderer>>>,
    stable: StableElement,
    slot: Observed<S>,
}

impl<S> Delocalized<S>
where
    S: PartialEq + Clone + 'static,
{
    /// A delocalized element without content, in `slot`.
    pub fn new(slot: S) -> Self {
        Self {
            content: Rc::new(RefCell::new(None)),
            stable: StableElement::new(),
            slot: Observed::new(slot),
        }
    }

    pub fn with_content(slot: S, content: ElementRenderer) -> Self {
        let delocalized = Self::new(slot);
        *delocalized.content.borrow_mut() = Some(content);
        delocalized
    }

    /// Replace the content. The subtree is recreated when the slots render
    /// next.
    pub fn set_content(&self, content: ElementRenderer) {
        *self.content.borrow_mut() = Some(content);
        self.stable.reset();
        self.slot.update_with(|_| {});
    }

    pub fn has_content(&self) -> bool {
        self.content.borrow().is_some()
    }

    /// Set the content unless there already is some.
    pub fn initialize_if_empty(&self, content: ElementRenderer) {
        if !self.has_content() {
            self.set_content(content);
        }
    }

    /// Move the subtree to `slot`.
    pub fn set_slot(&self, slot: S) {
        self.slot.set(slot);
    }

    pub fn slot(&self) -> S {
        self.slot.get()
    }

    /// Root of the subtree, once it was rendered.
    pub fn node(&self) -> Option<NodeRef> {
        self.stable.node()
    }

    /// Destroy the subtree. It is recreated when a matching slot renders.
    pub fn destroy(&self, rt: &Runtime) {
        self.stable.destroy(rt);
    }
}

impl<S: 'static> Clone for Delocalized<S> {
    fn clone(&self) -> Self {
        Self {
            content: self.content.clone(),
            stable: self.stable.clone(),
            slot: self.slot.clone(),
        }
    }
}

/// A `<div>` wrapper holding `delocalized` while its slot is `slot`, and a
/// hidden `<div>` otherwise.
pub fn delocalized_slot<S, I>(
    slot: S,
    delocalized: &Delocalized<S>,
    wrapper_attributes: I,
) -> ElementRenderer
where
    S: PartialEq + Clone + 'static,
    I: IntoIterator<Item = Attribute>,
{
    let hidden = div([style().value("display: none")]).render();
    delocalized_slot_or(slot, delocalized, wrapper_attributes, hidden)
}

/// Like [`delocalized_slot`], rendering `alternative` while the slot is not
/// active.
pub fn delocalized_slot_or<S, I>(
    slot: S,
    delocalized: &Delocalized<S>,
    wrapper_attributes: I,
    alternative: ElementRenderer,
) -> ElementRenderer
where
    S: PartialEq + Clone + 'static,
    I: IntoIterator<Item = Attribute>,
{
    let current = delocalized.slot.downgrade();
    let content = delocalized.content.clone();
    let stable = delocalized.stable.clone();

    div(wrapper_attributes).reactive(&delocalized.slot, move || {
        let active = current
            .upgrade()
            .is_some_and(|current| current.with(|current| *current == slot));
        let content = content.borrow().clone();
        match content {
            Some(content) if active => stabilize(&stable, content),
            _ => alternative.clone(),
        }
    })
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dom::{DomHost, MemoryDom};
    use crate::element::{class, p, span};

    fn setup() -> (Runtime, MemoryDom) {
        let document = MemoryDom::new();
        let runtime = Runtime::new(Rc::new(document.clone()));
        (runtime, document)
    }

    fn body(document: &MemoryDom) -> String {
        document.inner_html(document.body())
    }

    #[test]
    fn active_slot_holds_content() {
        let (rt, document) = setup();
        let delocalized = Delocalized::with_content("main", span([]).text("Hello"));

        rt.render(&delocalized_slot("main", &delocalized, [class().value("wrapper")]));
        assert_eq!(body(&document), r#"<div class="wrapper"><span>Hello</span></div>"#);
        assert!(delocalized.node().is_some());
    }

    #[test]
    fn inactive_slot_shows_hidden_placeholder() {
        let (rt, document) = setup();
        let delocalized = Delocalized::with_content("other", span([]).text("Hello"));

        rt.render(&delocalized_slot("main", &delocalized, []));
        assert_eq!(body(&document), r#"<div><div style="display: none"></div></div>"#);
        assert_eq!(delocalized.node(), None);
    }

    #[test]
    fn custom_alternative() {
        let (rt, document) = setup();
        let delocalized = Delocalized::with_content("other", span([]).text("Hello"));

        rt.render(&delocalized_slot_or("main", &delocalized, [], p([]).text("elsewhere")));
        assert_eq!(body(&document), "<div><p>elsewhere</p></div>");
    }

    #[test]
    fn moving_between_slots_keeps_node() {
        let (rt, document) = setup();
        let delocalized = Delocalized::with_content("left", span([]).text("Hello"));

        rt.render(&div([]).children([
            delocalized_slot("left", &delocalized, []),
            delocalized_slot("right", &delocalized, []),
        ]));
        let node = delocalized.node().expect("rendered");
        let native = rt.dom().native(node).expect("alive");
        let left = rt.dom().parent(node).expect("placed");
        assert_eq!(
            body(&document),
            r#"<div><div><span>Hello</span></div><div><div style="display: none"></div></div></div>"#
        );

        delocalized.set_slot("right");
        rt.execute_active_events();
        assert_eq!(
            body(&document),
            r#"<div><div><div style="display: none"></div></div><div><span>Hello</span></div></div>"#
        );
        assert_eq!(delocalized.node(), Some(node));
        assert_eq!(rt.dom().native(node), Some(native));

        delocalized.set_slot("left");
        rt.execute_active_events();
        assert_eq!(delocalized.node(), Some(node));
        assert_eq!(rt.dom().parent(node), Some(left));
        assert_eq!(rt.dom().native(node), Some(native));
    }

    #[test]
    fn new_content_replaces_subtree() {
        let (rt, document) = setup();
        let delocalized = Delocalized::new("main");
        assert!(!delocalized.has_content());

        rt.render(&delocalized_slot("main", &delocalized, []));
        assert_eq!(body(&document), r#"<div><div style="display: none"></div></div>"#);

        delocalized.initialize_if_empty(span([]).text("first"));
        rt.execute_active_events();
        let first = delocalized.node().expect("rendered");
        assert_eq!(body(&document), "<div><span>first</span></div>");

        delocalized.initialize_if_empty(span([]).text("ignored"));
        rt.execute_active_events();
        assert_eq!(delocalized.node(), Some(first));

        delocalized.set_content(span([]).text("second"));
        rt.execute_active_events();
        assert_ne!(delocalized.node(), Some(first));
        assert!(!rt.dom().is_alive(first));
        assert_eq!(body(&document), "<div><span>second</span></div>");
    }
}
