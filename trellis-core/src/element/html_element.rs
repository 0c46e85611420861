//! Element Descriptions
//!
//! An [`HtmlElement`] is an immutable description: a tag name, an element
//! kind selecting the bridge that creates the native node, and an ordered
//! list of attributes. Descriptions become live nodes only when a renderer
//! produced from them is invoked.
//!
//! Text and comment nodes are elements too: an empty tag name, the text or
//! comment bridge, and a single attribute carrying the node data.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use super::attribute::{bind_reactive, Attribute};
use super::reactive::{reactive_render, Regenerate};
use super::renderer::{render_element, renderer, ElementRenderer, Renderer};
use crate::compose::range_generator;
use crate::dom::{DomHost, NativeHandle, SVG_NAMESPACE};
use crate::reactive::{observe, IntoObservedGroup, Observed, ObservedGenerator};

/// How an element's native node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Regular,
    Svg,
    Text,
    Comment,
}

impl ElementKind {
    /// The bridge implementing this kind.
    pub fn bridge(self) -> &'static dyn HtmlElementBridge {
        match self {
            ElementKind::Regular => &RegularBridge,
            ElementKind::Svg => &SvgBridge,
            ElementKind::Text => &TextBridge,
            ElementKind::Comment => &CommentBridge,
        }
    }
}

/// Creates the native node for an element description.
pub trait HtmlElementBridge {
    fn create(&self, host: &dyn DomHost, element: &HtmlElement) -> NativeHandle;
}

struct RegularBridge;
struct SvgBridge;
struct TextBridge;
struct CommentBridge;

impl HtmlElementBridge for RegularBridge {
    fn create(&self, host: &dyn DomHost, element: &HtmlElement) -> NativeHandle {
        host.create_element(element.name())
    }
}

impl HtmlElementBridge for SvgBridge {
    fn create(&self, host: &dyn DomHost, element: &HtmlElement) -> NativeHandle {
        host.create_element_ns(SVG_NAMESPACE, element.name())
    }
}

impl HtmlElementBridge for TextBridge {
    fn create(&self, host: &dyn DomHost, element: &HtmlElement) -> NativeHandle {
        host.create_text_node(&element.string_data())
    }
}

impl HtmlElementBridge for CommentBridge {
    fn create(&self, host: &dyn DomHost, element: &HtmlElement) -> NativeHandle {
        host.create_comment(&element.string_data())
    }
}

/// Description of an element.
///
/// # Example
///
/// ```rust,ignore
/// let count = Observed::new(0);
///
/// let view = div([class().value("counter")]).children([
///     span([]).reactive_text(&count, {
///         let count = count.clone();
///         move || format!("clicked {} times", count.get())
///     }),
///     button([on_click(move |_| *count.modify() += 1)]).text("+1"),
/// ]);
///
/// runtime.render(&view);
/// ```
#[derive(Clone)]
pub struct HtmlElement {
    name: Cow<'static, str>,
    kind: ElementKind,
    attributes: Vec<Attribute>,
}

impl HtmlElement {
    /// A regular HTML element.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_kind(name, ElementKind::Regular)
    }

    /// An element created in the SVG namespace.
    pub fn svg(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_kind(name, ElementKind::Svg)
    }

    pub fn with_kind(name: impl Into<Cow<'static, str>>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: Vec::new(),
        }
    }

    /// A text node with fixed content.
    pub fn text_node(text: impl Into<String>) -> Self {
        Self::with_kind("", ElementKind::Text).with_attribute(Attribute::string_data(text))
    }

    /// A text node whose content follows an Observed string.
    pub fn text_node_observed(observed: &Observed<String>) -> Self {
        Self::with_kind("", ElementKind::Text).with_attribute(observed_node_value(observed))
    }

    /// A comment node with fixed content.
    pub fn comment_node(text: impl Into<String>) -> Self {
        Self::with_kind("", ElementKind::Comment).with_attribute(Attribute::string_data(text))
    }

    /// A comment node whose content follows an Observed string.
    pub fn comment_node_observed(observed: &Observed<String>) -> Self {
        Self::with_kind("", ElementKind::Comment).with_attribute(observed_node_value(observed))
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = Attribute>,
    {
        self.attributes.extend(attributes);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn bridge(&self) -> &'static dyn HtmlElementBridge {
        self.kind.bridge()
    }

    /// Data of the first attribute carrying string data.
    pub fn string_data(&self) -> String {
        self.attributes
            .iter()
            .find_map(Attribute::data)
            .unwrap_or_default()
    }

    // ---- Renderers ----

    /// Render the element without children.
    pub fn render(self) -> ElementRenderer {
        renderer(move |rt, target, placement| render_element(rt, target, placement, &self))
    }

    /// Render the element, then each child appended into it.
    pub fn children<I>(self, children: I) -> ElementRenderer
    where
        I: IntoIterator<Item = ElementRenderer>,
    {
        let children: Vec<ElementRenderer> = children.into_iter().collect();
        renderer(move |rt, target, placement| {
            let node = render_element(rt, target, placement, &self)?;
            for child in &children {
                child(rt, node, &Renderer::append());
            }
            Some(node)
        })
    }

    /// Render the element with fixed text content.
    pub fn text(self, text: impl Into<String>) -> ElementRenderer {
        let text: String = text.into();
        renderer(move |rt, target, placement| {
            let node = render_element(rt, target, placement, &self)?;
            rt.dom().set_text_content(node, &text);
            Some(node)
        })
    }

    /// Render the element with text content following an Observed string.
    pub fn text_observed(self, observed: &Observed<String>) -> ElementRenderer {
        let source = observed.downgrade();
        self.reactive_text(observed, move || {
            source.upgrade().map(|observed| observed.get()).unwrap_or_default()
        })
    }

    /// Render the element and re-render its children whenever a member of
    /// `group` changes.
    ///
    /// Every change discards the previous children and materializes the
    /// generator's output from scratch.
    pub fn reactive<G, F>(self, group: G, generator: F) -> ElementRenderer
    where
        G: IntoObservedGroup,
        F: Fn() -> ElementRenderer + 'static,
    {
        reactive_render(self, group.into_group(), Regenerate::Children(Rc::new(generator)))
    }

    /// Render the element and reset its text whenever a member of `group`
    /// changes.
    pub fn reactive_text<G, F>(self, group: G, generator: F) -> ElementRenderer
    where
        G: IntoObservedGroup,
        F: Fn() -> String + 'static,
    {
        reactive_render(self, group.into_group(), Regenerate::Text(Rc::new(generator)))
    }

    /// Like [`reactive`](Self::reactive), from an `observe(..).generate(..)`
    /// pair.
    pub fn generated(self, generator: ObservedGenerator<ElementRenderer>) -> ElementRenderer {
        let (group, generate) = generator.into_parts();
        reactive_render(self, group, Regenerate::Children(generate))
    }

    /// Render one child per item of an Observed list. Any change to the list
    /// re-renders all items.
    pub fn range<T, F>(self, observed: &Observed<Vec<T>>, item: F) -> ElementRenderer
    where
        T: 'static,
        F: Fn(usize, &T) -> ElementRenderer + 'static,
    {
        let generator = range_generator(observed, item);
        reactive_render(self, observe(observed), Regenerate::Children(generator))
    }
}

fn observed_node_value(observed: &Observed<String>) -> Attribute {
    let data_source = observed.downgrade();
    let source = observed.downgrade();

    Attribute::dynamic_data(move || {
        data_source
            .upgrade()
            .map(|observed| observed.get())
            .unwrap_or_default()
    })
    .with_event_creator(move |rt, node| {
        let observed = source.upgrade()?;
        let source = source.clone();
        Some(bind_reactive(rt, node, &observe(&observed), move |dom, node| {
            match source.upgrade() {
                Some(observed) => observed.with(|text| dom.set_node_value(node, text)),
                None => false,
            }
        }))
    })
}

impl fmt::Debug for HtmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlElement")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("attributes", &self.attributes.len())
            .finish()
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    #[test]
    fn bridges_create_matching_nodes() {
        let host = MemoryDom::new();

        let div = HtmlElement::new("div");
        let circle = HtmlElement::svg("circle");
        let text = HtmlElement::text_node("hello");
        let comment = HtmlElement::comment_node("note");

        let div_native = div.bridge().create(&host, &div);
        let circle_native = circle.bridge().create(&host, &circle);
        let text_native = text.bridge().create(&host, &text);
        let comment_native = comment.bridge().create(&host, &comment);

        assert_eq!(host.tag_name(div_native).as_deref(), Some("div"));
        assert_eq!(host.namespace(circle_native).as_deref(), Some(SVG_NAMESPACE));
        assert_eq!(host.node_value(text_native).as_deref(), Some("hello"));
        assert!(host.is_comment(comment_native));
        assert_eq!(host.node_value(comment_native).as_deref(), Some("note"));
    }

    #[test]
    fn observed_text_node_reads_current_value() {
        let label = Observed::new(String::from("first"));
        let element = HtmlElement::text_node_observed(&label);

        label.set(String::from("second"));
        assert_eq!(element.string_data(), "second");
        assert_eq!(element.name(), "");
        assert_eq!(element.kind(), ElementKind::Text);
        assert!(element.attributes()[0].is_reactive());
    }
}
