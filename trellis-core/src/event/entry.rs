//! Event Implementation
//!
//! An Event is a cancellable unit of work held by the event registry. It is
//! made of two closures:
//!
//! - the action, `FnMut(EventId) -> bool`, whose return value says whether the
//!   event stays registered after running;
//! - the validity predicate, `Fn() -> bool`. An event that is no longer valid
//!   is removed without running its action.
//!
//! Validity is how reactive bindings notice that the node they update has
//! been destroyed: the predicate checks a weak handle instead of holding the
//! node alive.

use std::fmt;

use super::registry::SlotId;

/// Identifier of an event inside an [`EventContext`](super::EventContext).
pub type EventId = SlotId;

type Action = Box<dyn FnMut(EventId) -> bool>;
type Validity = Box<dyn Fn() -> bool>;

/// A registered callback with a keep-alive result and a validity check.
///
/// # Example
///
/// ```rust,ignore
/// let event = Event::with_validity(
///     move |_id| {
///         println!("changed");
///         true // keep
///     },
///     move || node_is_alive(),
/// );
/// let id = ctx.register_event(event);
/// ```
pub struct Event {
    action: Action,
    valid: Validity,
}

impl Event {
    /// Create an event that is always valid.
    pub fn new<F>(action: F) -> Self
    where
        F: FnMut(EventId) -> bool + 'static,
    {
        Self::with_validity(action, || true)
    }

    /// Create an event with a custom validity predicate.
    pub fn with_validity<F, V>(action: F, valid: V) -> Self
    where
        F: FnMut(EventId) -> bool + 'static,
        V: Fn() -> bool + 'static,
    {
        Self {
            action: Box::new(action),
            valid: Box::new(valid),
        }
    }

    /// Check the validity predicate.
    pub fn is_valid(&self) -> bool {
        (self.valid)()
    }

    /// Run the action unconditionally. Returns whether to keep the event.
    pub fn call(&mut self, id: EventId) -> bool {
        (self.action)(id)
    }

    /// Run the action if the event is still valid.
    ///
    /// Returns whether to keep the event; invalid events are never kept.
    pub fn execute(&mut self, id: EventId) -> bool {
        self.is_valid() && self.call(id)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
