//! Inline Styles
//!
//! [`Style`] composes a `style` attribute from individual CSS properties.
//! Each property is fixed, follows one Observed value, or is generated from
//! a group. The attribute is static when every property is fixed, and is
//! rebuilt as a whole when any observed property changes.
//!
//! ```rust,ignore
//! div([Style::new()
//!     .property("display", "flex")
//!     .observed("color", &color)
//!     .generated("width", observe(&width).generate(move || format!("{}px", width.get())))
//!     .into_attribute()])
//! ```

use std::borrow::Cow;
use std::fmt::{self, Display};
use std::rc::Rc;

use super::attribute::Attribute;
use super::factory::style;
use crate::reactive::{Observed, ObservedGenerator, ObservedGroup};

enum PropertyValue {
    Fixed(String),
    Dynamic(Rc<dyn Fn() -> Option<String>>),
}

struct StyleProperty {
    name: Cow<'static, str>,
    value: PropertyValue,
}

impl StyleProperty {
    fn current(&self) -> Option<Cow<'_, str>> {
        match &self.value {
            PropertyValue::Fixed(value) => Some(Cow::Borrowed(value)),
            PropertyValue::Dynamic(generate) => generate().map(Cow::Owned),
        }
    }
}

/// Builder for a `style` attribute.
#[derive(Default)]
pub struct Style {
    properties: Vec<StyleProperty>,
    group: ObservedGroup,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fixed property.
    pub fn property(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        self.properties.push(StyleProperty {
            name: name.into(),
            value: PropertyValue::Fixed(value.into()),
        });
        self
    }

    /// A property following an Observed value. It is left out once the value
    /// is dropped.
    pub fn observed<T>(mut self, name: impl Into<Cow<'static, str>>, observed: &Observed<T>) -> Self
    where
        T: Display + 'static,
    {
        let source = observed.downgrade();
        self.group.push(observed);
        self.properties.push(StyleProperty {
            name: name.into(),
            value: PropertyValue::Dynamic(Rc::new(move || {
                source.upgrade().map(|observed| observed.with(|value| value.to_string()))
            })),
        });
        self
    }

    /// A property computed from a group of Observed values.
    pub fn generated<R>(mut self, name: impl Into<Cow<'static, str>>, generator: ObservedGenerator<R>) -> Self
    where
        R: Display + 'static,
    {
        let (group, generate) = generator.into_parts();
        self.group.extend(group);
        self.properties.push(StyleProperty {
            name: name.into(),
            value: PropertyValue::Dynamic(Rc::new(move || Some(generate().to_string()))),
        });
        self
    }

    /// Whether no property depends on an Observed value.
    pub fn is_static(&self) -> bool {
        self.properties
            .iter()
            .all(|property| matches!(property.value, PropertyValue::Fixed(_)))
    }

    /// Build the attribute. A static style is applied once, any other is
    /// rewritten whenever a property's source changes.
    pub fn into_attribute(self) -> Attribute {
        if self.is_static() {
            return style().value(self.to_string());
        }
        let Style { properties, group } = self;
        style().generated(group.generate(move || write_properties(&properties)))
    }
}

impl From<Style> for Attribute {
    fn from(style: Style) -> Self {
        style.into_attribute()
    }
}

/// The current CSS text, `name:value` pairs joined by `;`.
impl Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&write_properties(&self.properties))
    }
}

fn write_properties(properties: &[StyleProperty]) -> String {
    let mut css = String::new();
    for property in properties {
        let Some(value) = property.current() else {
            continue;
        };
        if !css.is_empty() {
            css.push(';');
        }
        css.push_str(&property.name);
        css.push(':');
        css.push_str(&value);
    }
    css
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dom::{DomHost, MemoryDom};
    use crate::element::div;
    use crate::reactive::observe;
    use crate::runtime::Runtime;

    fn setup() -> (Runtime, MemoryDom) {
        let document = MemoryDom::new();
        let runtime = Runtime::new(Rc::new(document.clone()));
        (runtime, document)
    }

    #[test]
    fn static_properties_join_with_semicolons() {
        let (rt, document) = setup();
        let style = Style::new().property("display", "flex").property("gap", "4px");
        assert!(style.is_static());

        rt.render(&div([style.into_attribute()]).render());
        assert_eq!(
            document.inner_html(document.body()),
            r#"<div style="display:flex;gap:4px"></div>"#
        );
    }

    #[test]
    fn observed_property_rewrites_attribute() {
        let (rt, document) = setup();
        let color = Observed::new(String::from("red"));
        let style = Style::new().property("display", "block").observed("color", &color);
        assert!(!style.is_static());

        rt.render(&div([Attribute::from(style)]).render());
        assert_eq!(
            document.inner_html(document.body()),
            r#"<div style="display:block;color:red"></div>"#
        );

        color.set(String::from("blue"));
        rt.execute_active_events();
        assert_eq!(
            document.inner_html(document.body()),
            r#"<div style="display:block;color:blue"></div>"#
        );
    }

    #[test]
    fn generated_property_follows_group() {
        let (rt, document) = setup();
        let width = Observed::new(10);
        let scale = Observed::new(2);

        let (w, s) = (width.clone(), scale.clone());
        let style = Style::new()
            .generated("width", observe((&width, &scale)).generate(move || format!("{}px", w.get() * s.get())))
            .observed("opacity", &scale);
        rt.render(&div([style.into_attribute()]).render());
        assert_eq!(
            document.inner_html(document.body()),
            r#"<div style="width:20px;opacity:2"></div>"#
        );

        width.set(15);
        scale.set(1);
        rt.execute_active_events();
        assert_eq!(
            document.inner_html(document.body()),
            r#"<div style="width:15px;opacity:1"></div>"#
        );
    }

    #[test]
    fn dropped_source_leaves_property_out() {
        let color = Observed::new(String::from("red"));
        let style = Style::new().observed("color", &color).property("margin", "0");
        assert_eq!(style.to_string(), "color:red;margin:0");

        drop(color);
        assert_eq!(style.to_string(), "margin:0");
    }
}
