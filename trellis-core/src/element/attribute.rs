//! Attributes
//!
//! An attribute is applied to a node once it is created. It may carry:
//!
//! - string data, read by the text and comment bridges to create their node;
//! - a setter, run once to apply the current value;
//! - an event creator, run once to wire the reactive path. It registers an
//!   event in the runtime's context and returns the id, which the node keeps
//!   so that the binding is removed when the node is destroyed.

use std::fmt;
use std::rc::Rc;

use crate::dom::{Dom, NodeRef};
use crate::event::{Event, EventId};
use crate::reactive::ObservedGroup;
use crate::runtime::Runtime;

/// Value written to a DOM attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Set the attribute. An empty string removes it.
    Text(String),
    /// `true` sets `key="key"`, `false` removes the attribute.
    Flag(bool),
    /// Remove the attribute.
    Remove,
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_owned())
    }
}

impl From<&String> for AttributeValue {
    fn from(value: &String) -> Self {
        AttributeValue::Text(value.clone())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Flag(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Remove)
    }
}

macro_rules! impl_attribute_value_for_numbers {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    AttributeValue::Text(value.to_string())
                }
            }
        )*
    };
}

impl_attribute_value_for_numbers!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

type StringData = Rc<dyn Fn() -> String>;

/// Applies an attribute to a freshly created node.
pub type AttributeSetter = Rc<dyn Fn(&Runtime, NodeRef)>;

/// Wires the reactive path of an attribute and returns the event id.
pub type EventCreator = Rc<dyn Fn(&Runtime, NodeRef) -> Option<EventId>>;

/// One entry of an element description's attribute list.
#[derive(Clone, Default)]
pub struct Attribute {
    data: Option<StringData>,
    setter: Option<AttributeSetter>,
    event_creator: Option<EventCreator>,
}

impl Attribute {
    /// An attribute with only a setter.
    pub fn new<F>(setter: F) -> Self
    where
        F: Fn(&Runtime, NodeRef) + 'static,
    {
        Self {
            setter: Some(Rc::new(setter)),
            ..Self::default()
        }
    }

    /// An attribute carrying fixed string data.
    pub fn string_data(data: impl Into<String>) -> Self {
        let data: String = data.into();
        Self::dynamic_data(move || data.clone())
    }

    /// An attribute whose string data is computed when the node is created.
    pub fn dynamic_data<F>(data: F) -> Self
    where
        F: Fn() -> String + 'static,
    {
        Self {
            data: Some(Rc::new(data)),
            ..Self::default()
        }
    }

    /// Add a reactive wiring step.
    pub fn with_event_creator<F>(mut self, creator: F) -> Self
    where
        F: Fn(&Runtime, NodeRef) -> Option<EventId> + 'static,
    {
        self.event_creator = Some(Rc::new(creator));
        self
    }

    /// Current string data, if any.
    pub fn data(&self) -> Option<String> {
        self.data.as_ref().map(|data| data())
    }

    /// Whether the attribute wires a reactive path.
    pub fn is_reactive(&self) -> bool {
        self.event_creator.is_some()
    }

    /// Apply the value once.
    pub fn set_on(&self, rt: &Runtime, node: NodeRef) {
        if let Some(setter) = &self.setter {
            setter(rt, node);
        }
    }

    /// Wire the reactive path, if any.
    pub fn create_event(&self, rt: &Runtime, node: NodeRef) -> Option<EventId> {
        self.event_creator.as_ref().and_then(|creator| creator(rt, node))
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("data", &self.data())
            .field("setter", &self.setter.is_some())
            .field("reactive", &self.is_reactive())
            .finish()
    }
}

/// Register an event that runs `update` against `node` whenever a member of
/// `group` changes.
///
/// The event is valid while the node is alive, and `update` returning
/// `false` unregisters it.
pub fn bind_reactive<F>(rt: &Runtime, node: NodeRef, group: &ObservedGroup, mut update: F) -> EventId
where
    F: FnMut(&Dom, NodeRef) -> bool + 'static,
{
    let dom = rt.dom().clone();
    let liveness = rt.dom().clone();
    let id = rt.events().register_event(Event::with_validity(
        move |_| update(&dom, node),
        move || liveness.is_alive(node),
    ));
    group.attach_event(rt.events(), id);
    id
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversions() {
        assert_eq!(AttributeValue::from("a"), AttributeValue::Text("a".to_owned()));
        assert_eq!(AttributeValue::from(3u8), AttributeValue::Text("3".to_owned()));
        assert_eq!(AttributeValue::from(1.5f64), AttributeValue::Text("1.5".to_owned()));
        assert_eq!(AttributeValue::from(true), AttributeValue::Flag(true));
        assert_eq!(AttributeValue::from(None::<&str>), AttributeValue::Remove);
        assert_eq!(AttributeValue::from(Some(7)), AttributeValue::Text("7".to_owned()));
    }

    #[test]
    fn dynamic_data_is_read_on_demand() {
        let counter = Rc::new(std::cell::Cell::new(0));
        let counter_clone = counter.clone();
        let attribute = Attribute::dynamic_data(move || counter_clone.get().to_string());

        assert_eq!(attribute.data().as_deref(), Some("0"));
        counter.set(4);
        assert_eq!(attribute.data().as_deref(), Some("4"));
        assert!(!attribute.is_reactive());
    }
}
