//! Elements
//!
//! Declarative element descriptions and their materialization into the live
//! DOM.
//!
//! # How Materialization Works
//!
//! 1. Application code builds an [`HtmlElement`]: a tag, a bridge kind and
//!    a list of [`Attribute`]s. Nothing touches the DOM yet.
//! 2. A renderer method (`render`, `children`, `text`, `reactive`, `range`)
//!    turns the description into an [`ElementRenderer`].
//! 3. Calling the renderer with a target and a [`Renderer`] placement
//!    creates the node through the bridge, applies every attribute, wires
//!    reactive attributes into the runtime's event context, and attaches
//!    the node to the target.
//!
//! Reactive attributes update only their own attribute on change. Reactive
//! renders discard and rebuild their content.

mod attribute;
pub mod elements;
mod factory;
mod html_element;
mod materialize;
pub(crate) mod reactive;
mod renderer;
mod style;
pub mod svg;

pub use attribute::{bind_reactive, Attribute, AttributeSetter, AttributeValue, EventCreator};
pub use elements::*;
pub use factory::{
    alt, attr, checked, class, cx, cy, d, disabled, fill, for_, height, hidden, href, id, name, on,
    on_blur, on_change, on_click, on_focus, on_input, on_keydown, on_submit, placeholder, prop, r,
    reference, role, src, stroke, style, tabindex, title, type_, value, view_box, width, x, y,
    AttributeFactory, PropertyFactory,
};
pub use html_element::{ElementKind, HtmlElement, HtmlElementBridge};
pub use renderer::{render_element, renderer, ElementRenderer, Renderer, RendererType};
pub use style::Style;
