//! Observed Value Combinators
//!
//! `observe(..)` groups several Observed values so that one event or side
//! effect is attached to all of them. Any member changing re-runs the shared
//! work.
//!
//! Groups hold their members weakly: a group stored inside a reactive
//! binding never keeps the values alive on its own.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::observed::{Attachable, Observed};
use crate::event::{EventContext, EventId};

/// A set of Observed values of possibly different types.
#[derive(Clone, Default)]
pub struct ObservedGroup {
    members: Vec<Weak<dyn Attachable>>,
}

impl ObservedGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, builder style.
    pub fn with<T: 'static>(mut self, observed: &Observed<T>) -> Self {
        self.push(observed);
        self
    }

    /// Add a member.
    pub fn push<T: 'static>(&mut self, observed: &Observed<T>) {
        self.members.push(observed.attachable());
    }

    /// Append all members of another group.
    pub fn extend(&mut self, other: ObservedGroup) {
        self.members.extend(other.members);
    }

    /// Number of members, alive or not.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn alive(&self) -> impl Iterator<Item = Rc<dyn Attachable>> + '_ {
        self.members.iter().filter_map(Weak::upgrade)
    }

    /// Activate `id` whenever any member changes.
    pub fn attach_event(&self, ctx: &EventContext, id: EventId) {
        for member in self.alive() {
            member.attach_event(ctx, id);
        }
    }

    /// Activate `id` on the next change of any member.
    ///
    /// Every member gets its own one-shot shim; activating an id twice before
    /// a drain still runs it once.
    pub fn attach_oneshot_event(&self, ctx: &EventContext, id: EventId) {
        for member in self.alive() {
            member.attach_oneshot_event(ctx, id);
        }
    }

    /// Attach one side effect to every member. It detaches from a member the
    /// first time it returns `false` for a change of that member.
    pub fn emplace_side_effect<F>(&self, side_effect: F)
    where
        F: FnMut() -> bool + 'static,
    {
        let shared: Rc<RefCell<dyn FnMut() -> bool>> = Rc::new(RefCell::new(side_effect));
        for member in self.alive() {
            member.attach_shared_side_effect(shared.clone());
        }
    }

    /// Pair the group with a generator whose output depends on it.
    pub fn generate<R, F>(self, generator: F) -> ObservedGenerator<R>
    where
        F: Fn() -> R + 'static,
    {
        ObservedGenerator {
            group: self,
            generator: Rc::new(generator),
        }
    }
}

impl fmt::Debug for ObservedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedGroup")
            .field("members", &self.members.len())
            .field("alive", &self.alive().count())
            .finish()
    }
}

/// A group plus a function computing a value from its members.
pub struct ObservedGenerator<R> {
    group: ObservedGroup,
    generator: Rc<dyn Fn() -> R>,
}

impl<R> ObservedGenerator<R> {
    /// Compute the current value.
    pub fn value(&self) -> R {
        (self.generator)()
    }

    /// The observed members.
    pub fn group(&self) -> &ObservedGroup {
        &self.group
    }

    /// Split into the group and the generator.
    pub fn into_parts(self) -> (ObservedGroup, Rc<dyn Fn() -> R>) {
        (self.group, self.generator)
    }
}

impl<R> Clone for ObservedGenerator<R> {
    fn clone(&self) -> Self {
        Self {
            group: self.group.clone(),
            generator: self.generator.clone(),
        }
    }
}

/// Anything that can be turned into an [`ObservedGroup`].
pub trait IntoObservedGroup {
    fn into_group(self) -> ObservedGroup;
}

impl IntoObservedGroup for ObservedGroup {
    fn into_group(self) -> ObservedGroup {
        self
    }
}

impl IntoObservedGroup for &ObservedGroup {
    fn into_group(self) -> ObservedGroup {
        self.clone()
    }
}

impl<T: 'static> IntoObservedGroup for &Observed<T> {
    fn into_group(self) -> ObservedGroup {
        ObservedGroup::new().with(self)
    }
}

macro_rules! impl_into_group_for_tuple {
    ($($name:ident),+) => {
        impl<'a, $($name: 'static),+> IntoObservedGroup for ($(&'a Observed<$name>,)+) {
            #[allow(non_snake_case)]
            fn into_group(self) -> ObservedGroup {
                let ($($name,)+) = self;
                let mut group = ObservedGroup::new();
                $(group.push($name);)+
                group
            }
        }
    };
}

impl_into_group_for_tuple!(A);
impl_into_group_for_tuple!(A, B);
impl_into_group_for_tuple!(A, B, C);
impl_into_group_for_tuple!(A, B, C, D);
impl_into_group_for_tuple!(A, B, C, D, E);
impl_into_group_for_tuple!(A, B, C, D, E, F);

/// Group Observed values.
///
/// # Example
///
/// ```rust,ignore
/// let first = Observed::new(String::from("Ada"));
/// let last = Observed::new(String::from("Lovelace"));
///
/// let full_name = observe((&first, &last)).generate({
///     let (first, last) = (first.clone(), last.clone());
///     move || format!("{} {}", first.value(), last.value())
/// });
/// ```
pub fn observe(values: impl IntoObservedGroup) -> ObservedGroup {
    values.into_group()
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
