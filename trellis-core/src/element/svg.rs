//! SVG tag constructors. Elements are created in the SVG namespace.

use super::attribute::Attribute;
use super::html_element::HtmlElement;

macro_rules! svg_elements {
    ($($name:ident => $tag:literal),* $(,)?) => {
        $(
            #[doc = concat!("An SVG `<", $tag, ">` element.")]
            pub fn $name<I>(attributes: I) -> HtmlElement
            where
                I: IntoIterator<Item = Attribute>,
            {
                HtmlElement::svg($tag).with_attributes(attributes)
            }
        )*
    };
}

svg_elements! {
    svg => "svg",
    g => "g",
    circle => "circle",
    rect => "rect",
    line => "line",
    path => "path",
    polyline => "polyline",
    text => "text",
}
