//! Attribute Factories
//!
//! Factories turn a key and a value source into an [`Attribute`]:
//!
//! ```rust,ignore
//! div([
//!     class().value("card"),
//!     id().observed(&selected_id),
//!     style().generated(observe(&width).generate(move || format!("width: {}px", width.get()))),
//!     prop("value").observed(&text),
//!     on_click(move |_| clicks.update_with(|n| *n += 1)),
//! ])
//! ```

use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::attribute::{bind_reactive, Attribute, AttributeValue};
use crate::dom::NodeRef;
use crate::reactive::{observe, Observed, ObservedGenerator, ObservedGroup};

/// Builds attributes for one attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeFactory {
    name: &'static str,
}

impl AttributeFactory {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    /// A fixed value.
    pub fn value(self, value: impl Into<AttributeValue>) -> Attribute {
        let name = self.name;
        let value = value.into();
        Attribute::new(move |rt, node| {
            rt.dom().apply_attribute(node, name, value.clone());
        })
    }

    /// A value following an Observed value.
    pub fn observed<T>(self, observed: &Observed<T>) -> Attribute
    where
        T: Clone + Into<AttributeValue> + 'static,
    {
        let source = observed.downgrade();
        self.bound(observe(observed), move || {
            source.upgrade().map(|observed| observed.get().into())
        })
    }

    /// A value computed from a group of Observed values.
    pub fn generated<R>(self, generator: ObservedGenerator<R>) -> Attribute
    where
        R: Into<AttributeValue> + 'static,
    {
        let (group, generate) = generator.into_parts();
        self.bound(group, move || Some(generate().into()))
    }

    fn bound<F>(self, group: ObservedGroup, current: F) -> Attribute
    where
        F: Fn() -> Option<AttributeValue> + 'static,
    {
        let name = self.name;
        let current = Rc::new(current);
        let initial = current.clone();

        Attribute::new(move |rt, node| {
            if let Some(value) = initial() {
                rt.dom().apply_attribute(node, name, value);
            }
        })
        .with_event_creator(move |rt, node| {
            let current = current.clone();
            Some(bind_reactive(rt, node, &group, move |dom, node| match current() {
                Some(value) => dom.apply_attribute(node, name, value),
                None => false,
            }))
        })
    }
}

/// Factory for any attribute key.
pub fn attr(name: &'static str) -> AttributeFactory {
    AttributeFactory::new(name)
}

/// Builds attributes that set script-visible properties instead of markup
/// attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyFactory {
    name: &'static str,
}

impl PropertyFactory {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    /// A fixed value.
    pub fn value(self, value: impl Into<Value>) -> Attribute {
        let name = self.name;
        let value = value.into();
        Attribute::new(move |rt, node| {
            rt.dom().set_property(node, name, value.clone());
        })
    }

    /// A value following an Observed value, serialized to JSON.
    pub fn observed<T>(self, observed: &Observed<T>) -> Attribute
    where
        T: Serialize + 'static,
    {
        let name = self.name;
        let source = observed.downgrade();
        self.bound(observe(observed), move || {
            source
                .upgrade()
                .map(|observed| observed.with(|value| to_property_value(name, value)))
        })
    }

    /// A value computed from a group of Observed values.
    pub fn generated<R>(self, generator: ObservedGenerator<R>) -> Attribute
    where
        R: Serialize + 'static,
    {
        let name = self.name;
        let (group, generate) = generator.into_parts();
        self.bound(group, move || Some(to_property_value(name, &generate())))
    }

    fn bound<F>(self, group: ObservedGroup, current: F) -> Attribute
    where
        F: Fn() -> Option<Value> + 'static,
    {
        let name = self.name;
        let current = Rc::new(current);
        let initial = current.clone();

        Attribute::new(move |rt, node| {
            if let Some(value) = initial() {
                rt.dom().set_property(node, name, value);
            }
        })
        .with_event_creator(move |rt, node| {
            let current = current.clone();
            Some(bind_reactive(rt, node, &group, move |dom, node| match current() {
                Some(value) => dom.set_property(node, name, value),
                None => false,
            }))
        })
    }
}

fn to_property_value<T: Serialize + ?Sized>(name: &str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        error!(property = name, %err, "failed to serialize property value");
        Value::Null
    })
}

/// Factory for any property key.
pub fn prop(name: &'static str) -> PropertyFactory {
    PropertyFactory::new(name)
}

/// Listen to a DOM event.
///
/// After `handler` returns, the runtime's event context is drained so that
/// Observed values changed by the handler are reflected right away.
pub fn on<F>(event: &'static str, handler: F) -> Attribute
where
    F: Fn(&Value) + 'static,
{
    let handler = Rc::new(handler);
    Attribute::new(move |rt, node| {
        let handler = handler.clone();
        let events = rt.events().downgrade();
        rt.dom().add_event_listener(
            node,
            event,
            Rc::new(move |payload: &Value| {
                handler(payload);
                if let Some(events) = events.upgrade() {
                    events.execute_active_events();
                }
            }),
        );
    })
}

/// Hand the node's handle to application code once it is created.
///
/// The handle is weak: it stops resolving when the node is destroyed.
pub fn reference<F>(receive: F) -> Attribute
where
    F: Fn(NodeRef) + 'static,
{
    Attribute::new(move |_, node| receive(node))
}

macro_rules! attributes {
    ($($name:ident => $key:literal),* $(,)?) => {
        $(
            #[doc = concat!("Factory for the `", $key, "` attribute.")]
            pub fn $name() -> AttributeFactory {
                AttributeFactory::new($key)
            }
        )*
    };
}

attributes! {
    id => "id",
    class => "class",
    style => "style",
    title => "title",
    href => "href",
    src => "src",
    alt => "alt",
    name => "name",
    value => "value",
    placeholder => "placeholder",
    disabled => "disabled",
    checked => "checked",
    hidden => "hidden",
    type_ => "type",
    for_ => "for",
    role => "role",
    tabindex => "tabindex",
    width => "width",
    height => "height",
    view_box => "viewBox",
    fill => "fill",
    stroke => "stroke",
    d => "d",
    cx => "cx",
    cy => "cy",
    r => "r",
    x => "x",
    y => "y",
}

macro_rules! event_attributes {
    ($($name:ident => $event:literal),* $(,)?) => {
        $(
            #[doc = concat!("Listen to the `", $event, "` event.")]
            pub fn $name<F>(handler: F) -> Attribute
            where
                F: Fn(&Value) + 'static,
            {
                on($event, handler)
            }
        )*
    };
}

event_attributes! {
    on_click => "click",
    on_input => "input",
    on_change => "change",
    on_submit => "submit",
    on_keydown => "keydown",
    on_focus => "focus",
    on_blur => "blur",
}
