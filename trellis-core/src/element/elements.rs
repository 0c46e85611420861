//! HTML tag constructors.
//!
//! ```rust,ignore
//! ul([class().value("todo")]).range(&items, |_, item| li([]).text(item.clone()))
//! ```

use super::attribute::Attribute;
use super::html_element::HtmlElement;
use crate::reactive::Observed;

macro_rules! html_elements {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("A `<", stringify!($name), ">` element.")]
            pub fn $name<I>(attributes: I) -> HtmlElement
            where
                I: IntoIterator<Item = Attribute>,
            {
                HtmlElement::new(stringify!($name)).with_attributes(attributes)
            }
        )*
    };
}

html_elements! {
    div, span, p, a, button, input, label, form, textarea, select, option,
    ul, ol, li, h1, h2, h3, h4, section, article, header, footer, nav, main,
    table, thead, tbody, tr, td, th, img, pre, code, strong, em, hr, br,
}

/// A text node.
pub fn text(text: impl Into<String>) -> HtmlElement {
    HtmlElement::text_node(text)
}

/// A text node following an Observed string. Changes patch the node's data
/// in place.
pub fn text_observed(observed: &Observed<String>) -> HtmlElement {
    HtmlElement::text_node_observed(observed)
}

/// A comment node.
pub fn comment(text: impl Into<String>) -> HtmlElement {
    HtmlElement::comment_node(text)
}

pub fn comment_observed(observed: &Observed<String>) -> HtmlElement {
    HtmlElement::comment_node_observed(observed)
}
