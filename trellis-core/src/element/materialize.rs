//! Materialization
//!
//! Turning descriptions into live nodes. Every placement follows the same
//! steps:
//!
//! 1. Create the native node through the element's bridge and track it in
//!    the arena.
//! 2. Apply each attribute once and wire its reactive path. Event ids are
//!    recorded on the node so they are removed together with it.
//! 3. Attach the node to the target as the placement describes.
//!
//! Children are materialized by the renderer that called us, against the
//! node we return.

use super::html_element::HtmlElement;
use super::renderer::{Renderer, RendererType};
use crate::dom::NodeRef;
use crate::runtime::Runtime;

impl Runtime {
    /// Create a detached node for `element`.
    pub fn make_element(&self, element: &HtmlElement) -> NodeRef {
        let native = element.bridge().create(self.dom().host(), element);
        let node = self.dom().insert(native, element.name(), element.kind());
        self.setup(node, element);
        node
    }

    fn setup(&self, node: NodeRef, element: &HtmlElement) {
        for attribute in element.attributes() {
            attribute.set_on(self, node);
            if let Some(id) = attribute.create_event(self, node) {
                self.dom().attach_event(node, id);
            }
        }
    }

    fn materialize(&self, target: NodeRef, placement: &Renderer, element: &HtmlElement) -> Option<NodeRef> {
        if !self.dom().is_alive(target) {
            return None;
        }
        let node = self.make_element(element);
        self.place(target, placement, node)
    }

    /// Create `element` and append it to `parent`.
    pub fn append_element(&self, parent: NodeRef, element: &HtmlElement) -> Option<NodeRef> {
        self.materialize(parent, &Renderer::append(), element)
    }

    /// Create `element` and insert it at `index` among `parent`'s children.
    /// Indices past the end append.
    pub fn insert_element(&self, parent: NodeRef, index: usize, element: &HtmlElement) -> Option<NodeRef> {
        self.materialize(parent, &Renderer::insert(index), element)
    }

    /// Create `element` and put it in place of `target`, which is destroyed.
    pub fn replace_element(&self, target: NodeRef, element: &HtmlElement) -> Option<NodeRef> {
        self.materialize(target, &Renderer::replace(), element)
    }

    /// Create `element` as a fragment member of `parent`.
    pub fn fragment_element(&self, parent: NodeRef, element: &HtmlElement) -> Option<NodeRef> {
        self.materialize(parent, &Renderer::fragment(), element)
    }

    /// Re-materialize `target` from `element`, keeping its handle.
    ///
    /// Children and reactive bindings of `target` are discarded. If tag and
    /// kind match, the native node is reused and the new attributes are
    /// applied on top of the existing ones; otherwise a new native node is
    /// swapped in.
    pub fn emplace_element(&self, target: NodeRef, element: &HtmlElement) -> Option<NodeRef> {
        let dom = self.dom();
        let tag = dom.tag(target)?;
        let kind = dom.kind(target)?;

        self.clear_children(target);
        for id in dom.take_events(target) {
            self.events().remove_event(id);
        }

        if tag != element.name() || kind != element.kind() {
            let native = element.bridge().create(dom.host(), element);
            if let Some(previous) = dom.swap_native(target, native, element.name(), element.kind()) {
                dom.host().replace_with(previous, native);
                dom.host().release(previous);
            }
        }

        self.setup(target, element);
        Some(target)
    }

    /// Attach an existing detached node to `target` as `placement` describes.
    pub(crate) fn place(&self, target: NodeRef, placement: &Renderer, node: NodeRef) -> Option<NodeRef> {
        let dom = self.dom();
        let native = dom.native(node)?;
        let host = dom.host();

        match placement.kind {
            RendererType::Append | RendererType::Inplace => {
                host.append_child(dom.native(target)?, native);
                dom.link_child(target, node, None);
            }
            RendererType::Fragment => {
                host.append_child(dom.native(target)?, native);
                dom.link_fragment(target, node);
            }
            RendererType::Insert => {
                let parent = dom.native(target)?;
                let index = placement.metadata;
                match dom.child(target, index).and_then(|sibling| dom.native(sibling)) {
                    Some(sibling) => {
                        host.insert_before(parent, native, sibling);
                        dom.link_child(target, node, Some(index));
                    }
                    None => {
                        host.append_child(parent, native);
                        dom.link_child(target, node, None);
                    }
                }
            }
            RendererType::Replace | RendererType::Emplace => {
                host.replace_with(dom.native(target)?, native);
                dom.splice(target, node);
                self.destroy(target);
            }
        }
        Some(node)
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::dom::MemoryDom;
    use crate::element::{class, div, li, span, ul};
    use crate::reactive::Observed;

    fn setup() -> (Runtime, MemoryDom) {
        let document = MemoryDom::new();
        let runtime = Runtime::new(Rc::new(document.clone()));
        (runtime, document)
    }

    fn native_children(rt: &Runtime, document: &MemoryDom, node: NodeRef) -> Vec<String> {
        let native = rt.dom().native(node).expect("alive");
        document
            .children(native)
            .into_iter()
            .map(|child| document.outer_html(child))
            .collect()
    }

    #[test]
    fn append_tracks_children_in_order() {
        let (rt, document) = setup();
        let list = rt.append_element(rt.root(), &ul([])).expect("created");
        let first = rt.append_element(list, &li([class().value("a")])).expect("created");
        let second = rt.append_element(list, &li([class().value("b")])).expect("created");

        assert_eq!(rt.dom().children(list), vec![first, second]);
        assert_eq!(
            native_children(&rt, &document, list),
            vec![r#"<li class="a"></li>"#, r#"<li class="b"></li>"#]
        );
    }

    #[test]
    fn insert_shifts_siblings_and_appends_past_end() {
        let (rt, document) = setup();
        let list = rt.append_element(rt.root(), &ul([])).expect("created");
        rt.append_element(list, &li([class().value("a")]));
        rt.append_element(list, &li([class().value("c")]));

        let middle = rt.insert_element(list, 1, &li([class().value("b")])).expect("created");
        let last = rt.insert_element(list, 10, &li([class().value("d")])).expect("created");

        assert_eq!(rt.dom().child(list, 1), Some(middle));
        assert_eq!(rt.dom().child(list, 3), Some(last));
        assert_eq!(
            native_children(&rt, &document, list),
            vec![
                r#"<li class="a"></li>"#,
                r#"<li class="b"></li>"#,
                r#"<li class="c"></li>"#,
                r#"<li class="d"></li>"#,
            ]
        );
    }

    #[test]
    fn replace_destroys_target() {
        let (rt, document) = setup();
        let container = rt.append_element(rt.root(), &div([])).expect("created");
        let old = rt.append_element(container, &span([])).expect("created");

        let new = rt.replace_element(old, &HtmlElement::new("p")).expect("created");

        assert!(!rt.dom().is_alive(old));
        assert_eq!(rt.dom().children(container), vec![new]);
        assert_eq!(native_children(&rt, &document, container), vec!["<p></p>"]);
    }

    #[test]
    fn emplace_keeps_handle() {
        let (rt, document) = setup();
        let container = rt.append_element(rt.root(), &div([])).expect("created");
        let target = rt.append_element(container, &span([class().value("old")])).expect("created");
        let native = rt.dom().native(target).expect("alive");
        rt.append_element(target, &span([]));

        let same_tag = rt.emplace_element(target, &span([class().value("new")])).expect("kept");
        assert_eq!(same_tag, target);
        assert_eq!(rt.dom().native(target), Some(native));
        assert_eq!(rt.dom().child_count(target), 0);
        assert_eq!(document.attribute(native, "class").as_deref(), Some("new"));

        let other_tag = rt.emplace_element(target, &HtmlElement::new("p")).expect("kept");
        assert_eq!(other_tag, target);
        assert_ne!(rt.dom().native(target), Some(native));
        assert!(!document.contains(native));
        assert_eq!(native_children(&rt, &document, container), vec!["<p></p>"]);
    }

    #[test]
    fn emplace_drops_previous_bindings() {
        let (rt, document) = setup();
        let label = Observed::new(String::from("a"));
        let target = rt
            .append_element(rt.root(), &span([class().observed(&label)]))
            .expect("created");
        let native = rt.dom().native(target).expect("alive");
        assert_eq!(rt.events().event_count(), 1);

        rt.emplace_element(target, &span([]));
        assert_eq!(rt.events().event_count(), 0);

        label.set(String::from("b"));
        rt.events().execute_active_events();
        assert_eq!(document.attribute(native, "class").as_deref(), Some("a"));
    }

    #[test]
    fn fragment_members_are_not_indexed() {
        let (rt, document) = setup();
        let container = rt.append_element(rt.root(), &div([])).expect("created");
        let member = rt.fragment_element(container, &span([])).expect("created");

        assert_eq!(rt.dom().child_count(container), 0);
        assert_eq!(rt.dom().fragment_members(container), vec![member]);
        assert_eq!(native_children(&rt, &document, container), vec!["<span></span>"]);

        rt.destroy(container);
        assert!(!rt.dom().is_alive(member));
    }

    #[test]
    fn dead_target_creates_nothing() {
        let (rt, _document) = setup();
        let container = rt.append_element(rt.root(), &div([])).expect("created");
        rt.destroy(container);

        let before = rt.dom().node_count();
        assert_eq!(rt.append_element(container, &span([])), None);
        assert_eq!(rt.dom().node_count(), before);
    }
}
