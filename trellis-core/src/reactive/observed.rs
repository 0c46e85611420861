//! Observed Value Implementation
//!
//! An Observed value is the fundamental reactive primitive. It holds a value
//! and an ordered list of side effects that run after every mutation.
//!
//! # How Observed Values Work
//!
//! 1. Every mutation path (`set`, `replace`, the guard returned by `modify`,
//!    `update_with`) ends in exactly one notification pass.
//!
//! 2. A notification pass calls every attached side effect once, in
//!    attachment order, with a shared borrow of the new value.
//!
//! 3. A side effect returns `false` to detach itself. There is no other
//!    removal API.
//!
//! 4. Side effects attached by the UI core are thin shims that activate a
//!    slot in an [`EventContext`]. The actual DOM work happens later, when the
//!    host loop drains the context.
//!
//! # Mutations During a Pass
//!
//! Side effects see the value through a shared borrow. `set` and
//! `update_with` called on the same value while its pass runs are queued and
//! applied once the pass is over, each followed by its own pass. `replace`
//! and `modify` need the value unborrowed and panic when called from the
//! value's own side effects.
//!
//! # Failure Isolation
//!
//! Each side effect runs under its own `catch_unwind`. A panicking side effect
//! is logged and stays attached; the remaining side effects of the pass still
//! run.
//!
//! # Memory Layout
//!
//! An Observed value is a reference-counted handle. Clones share the value
//! and the side-effect list. Event shims hold the event context weakly, and
//! reactive bindings hold the Observed value weakly through
//! [`WeakObserved`], so neither keeps the other alive.

use std::any::Any;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::error;

use crate::event::{EventContext, EventId, WeakEventContext};

type SideEffect<T> = Box<dyn FnMut(&T) -> bool>;
type Mutation<T> = Box<dyn FnOnce(&mut T)>;

/// Type-erased view of an Observed value, used to attach events to a group
/// of values with different types.
pub trait Attachable {
    /// Activate `id` on every change until the id is no longer found.
    fn attach_event(&self, ctx: &EventContext, id: EventId);

    /// Activate `id` on the next change only.
    fn attach_oneshot_event(&self, ctx: &EventContext, id: EventId);

    /// Attach a side effect that does not look at the value.
    fn attach_shared_side_effect(&self, effect: Rc<RefCell<dyn FnMut() -> bool>>);
}

pub(crate) struct ObservedInner<T> {
    value: RefCell<T>,
    side_effects: RefCell<Vec<SideEffect<T>>>,
    instant_update: RefCell<Option<WeakEventContext>>,
    notifying: Cell<bool>,
    deferred: RefCell<VecDeque<Mutation<T>>>,
}

impl<T: 'static> ObservedInner<T> {
    fn push_side_effect(&self, effect: SideEffect<T>) {
        self.side_effects.borrow_mut().push(effect);
    }

    fn push_event_shim(&self, ctx: &EventContext, id: EventId, oneshot: bool) {
        let ctx = ctx.downgrade();
        self.push_side_effect(Box::new(move |_| {
            let Some(ctx) = ctx.upgrade() else {
                return false;
            };
            let found = ctx.activate_event(id).is_found();
            found && !oneshot
        }));
    }
}

impl<T: 'static> Attachable for ObservedInner<T> {
    fn attach_event(&self, ctx: &EventContext, id: EventId) {
        self.push_event_shim(ctx, id, false);
    }

    fn attach_oneshot_event(&self, ctx: &EventContext, id: EventId) {
        self.push_event_shim(ctx, id, true);
    }

    fn attach_shared_side_effect(&self, effect: Rc<RefCell<dyn FnMut() -> bool>>) {
        self.push_side_effect(Box::new(move |_| {
            // Already running for another member of the same group.
            match effect.try_borrow_mut() {
                Ok(mut effect) => (&mut *effect)(),
                Err(_) => true,
            }
        }));
    }
}

/// A reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```rust,ignore
/// let count = Observed::new(0);
///
/// count.emplace_side_effect(|value| {
///     println!("count is now {value}");
///     true // stay attached
/// });
///
/// count.set(5);              // prints "count is now 5"
/// *count.modify() += 1;      // prints "count is now 6"
/// ```
pub struct Observed<T: 'static> {
    inner: Rc<ObservedInner<T>>,
}

impl<T: 'static> Observed<T> {
    /// Create a new Observed value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservedInner {
                value: RefCell::new(value),
                side_effects: RefCell::new(Vec::new()),
                instant_update: RefCell::new(None),
                notifying: Cell::new(false),
                deferred: RefCell::new(VecDeque::new()),
            }),
        }
    }

    /// Borrow the current value.
    ///
    /// The borrow must be released before the value is mutated.
    pub fn value(&self) -> Ref<'_, T> {
        self.inner.value.borrow()
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Run `f` with a shared borrow of the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Replace the value and notify.
    ///
    /// Called from a side effect of this value, the write is applied after
    /// the running pass.
    pub fn set(&self, value: T) {
        if self.inner.notifying.get() {
            self.defer(Box::new(move |slot| *slot = value));
            return;
        }
        self.replace(value);
    }

    /// Replace the value, notify, and return the previous value.
    pub fn replace(&self, value: T) -> T {
        let previous = std::mem::replace(&mut *self.inner.value.borrow_mut(), value);
        self.update();
        previous
    }

    /// Mutate the value in place. Notification runs once, when the returned
    /// guard is dropped.
    pub fn modify(&self) -> ModificationGuard<'_, T> {
        ModificationGuard {
            observed: self,
            value: Some(self.inner.value.borrow_mut()),
        }
    }

    /// Mutate the value through a closure and notify once.
    ///
    /// Called from a side effect of this value, `f` runs after the running
    /// pass.
    pub fn update_with(&self, f: impl FnOnce(&mut T) + 'static) {
        if self.inner.notifying.get() {
            self.defer(Box::new(f));
            return;
        }
        let mut guard = self.modify();
        f(&mut guard);
    }

    fn defer(&self, mutation: Mutation<T>) {
        self.inner.deferred.borrow_mut().push_back(mutation);
    }

    /// Append a side effect. It stays attached while it returns `true`.
    pub fn emplace_side_effect<F>(&self, side_effect: F)
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.inner.push_side_effect(Box::new(side_effect));
    }

    /// Activate `id` in `ctx` on every change.
    ///
    /// The shim detaches itself once the id is no longer registered.
    pub fn attach_event(&self, ctx: &EventContext, id: EventId) {
        self.inner.attach_event(ctx, id);
    }

    /// Activate `id` in `ctx` on the next change only.
    pub fn attach_oneshot_event(&self, ctx: &EventContext, id: EventId) {
        self.inner.attach_oneshot_event(ctx, id);
    }

    /// Drain `ctx` right after every notification pass, or stop doing so
    /// when `None` is given.
    pub fn instant_update(&self, ctx: Option<&EventContext>) {
        *self.inner.instant_update.borrow_mut() = ctx.map(EventContext::downgrade);
    }

    /// Number of attached side effects.
    pub fn side_effect_count(&self) -> usize {
        self.inner.side_effects.borrow().len()
    }

    /// Create a non-owning handle.
    pub fn downgrade(&self) -> WeakObserved<T> {
        WeakObserved {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles share the same cell.
    pub fn ptr_eq(&self, other: &Observed<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn attachable(&self) -> Weak<dyn Attachable> {
        Rc::downgrade(&self.inner) as Weak<dyn Attachable>
    }

    /// Run one notification pass, then apply and announce the mutations
    /// queued during it.
    fn update(&self) {
        self.notify();
        loop {
            let next = self.inner.deferred.borrow_mut().pop_front();
            let Some(mutation) = next else {
                break;
            };
            mutation(&mut *self.inner.value.borrow_mut());
            self.notify();
        }
    }

    fn notify(&self) {
        let mut running = std::mem::take(&mut *self.inner.side_effects.borrow_mut());

        {
            let value = self.inner.value.borrow();
            self.inner.notifying.set(true);
            running.retain_mut(|side_effect| {
                match panic::catch_unwind(AssertUnwindSafe(|| side_effect(&*value))) {
                    Ok(keep) => keep,
                    Err(payload) => {
                        error!(
                            panic = panic_message(payload.as_ref()),
                            "side effect panicked during notification"
                        );
                        true
                    }
                }
            });
            self.inner.notifying.set(false);
        }

        // Side effects attached during the pass go after the ones that ran.
        {
            let mut side_effects = self.inner.side_effects.borrow_mut();
            let attached = std::mem::replace(&mut *side_effects, running);
            side_effects.extend(attached);
        }

        let instant = self
            .inner
            .instant_update
            .borrow()
            .as_ref()
            .and_then(WeakEventContext::upgrade);
        if let Some(ctx) = instant {
            ctx.execute_active_events();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl<T: 'static> Clone for Observed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Default + 'static> Default for Observed<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Observed");
        match self.inner.value.try_borrow() {
            Ok(value) => debug.field("value", &*value),
            Err(_) => debug.field("value", &"<borrowed>"),
        };
        debug
            .field("side_effects", &self.side_effect_count())
            .finish()
    }
}

/// Non-owning handle to an [`Observed`] value.
pub struct WeakObserved<T: 'static> {
    inner: Weak<ObservedInner<T>>,
}

impl<T: 'static> WeakObserved<T> {
    /// Get the value handle back if it still exists.
    pub fn upgrade(&self) -> Option<Observed<T>> {
        self.inner.upgrade().map(|inner| Observed { inner })
    }

    /// Whether the Observed value still exists.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T: 'static> Clone for WeakObserved<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Scoped mutable access to an Observed value.
///
/// Dropping the guard releases the borrow and runs one notification pass,
/// also when the scope is left by unwinding.
pub struct ModificationGuard<'a, T: 'static> {
    observed: &'a Observed<T>,
    value: Option<RefMut<'a, T>>,
}

impl<T: 'static> Deref for ModificationGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_deref().expect("modification guard already released")
    }
}

impl<T: 'static> DerefMut for ModificationGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value
            .as_deref_mut()
            .expect("modification guard already released")
    }
}

impl<T: 'static> Drop for ModificationGuard<'_, T> {
    fn drop(&mut self) {
        self.value.take();
        self.observed.update();
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::event::Event;

    fn counter(observed: &Observed<i32>) -> Rc<Cell<i32>> {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        observed.emplace_side_effect(move |_| {
            count_clone.set(count_clone.get() + 1);
            true
        });
        count
    }

    #[test]
    fn observed_get_and_set() {
        let observed = Observed::new(0);
        assert_eq!(observed.get(), 0);

        observed.set(42);
        assert_eq!(observed.get(), 42);
        assert_eq!(*observed.value(), 42);
    }

    #[test]
    fn every_mutation_notifies_once() {
        let observed = Observed::new(0);
        let count = counter(&observed);

        observed.set(1);
        assert_eq!(count.get(), 1);

        *observed.modify() += 1;
        assert_eq!(count.get(), 2);

        {
            let mut guard = observed.modify();
            *guard += 1;
            *guard += 1;
        }
        assert_eq!(count.get(), 3);

        observed.update_with(|value| *value *= 10);
        assert_eq!(count.get(), 4);
        assert_eq!(observed.get(), 40);

        assert_eq!(observed.replace(7), 40);
        assert_eq!(count.get(), 5);
    }

    #[test]
    fn side_effects_run_in_attachment_order() {
        let observed = Observed::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = log.clone();
            observed.emplace_side_effect(move |_| {
                log.borrow_mut().push(name);
                true
            });
        }

        observed.set(1);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn side_effect_returning_false_detaches() {
        let observed = Observed::new(0);
        let seen = Rc::new(Cell::new(0));
        let seen_clone = seen.clone();
        observed.emplace_side_effect(move |value| {
            seen_clone.set(*value);
            *value < 2
        });

        observed.set(1);
        observed.set(2);
        observed.set(3);

        assert_eq!(seen.get(), 2);
        assert_eq!(observed.side_effect_count(), 0);
    }

    #[test]
    fn panicking_side_effect_does_not_block_others() {
        let observed = Observed::new(0);
        observed.emplace_side_effect(|value| {
            if *value == 1 {
                panic!("boom");
            }
            true
        });
        let count = counter(&observed);

        observed.set(1);
        assert_eq!(count.get(), 1);
        assert_eq!(observed.side_effect_count(), 2);

        observed.set(2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn side_effect_writing_its_own_value_is_applied_after_pass() {
        let observed = Observed::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (handle, seen_clone) = (observed.clone(), seen.clone());
        observed.emplace_side_effect(move |value| {
            seen_clone.borrow_mut().push(*value);
            if *value > 10 {
                handle.set(10);
            }
            true
        });
        let count = counter(&observed);

        observed.set(42);
        assert_eq!(observed.get(), 10);
        assert_eq!(*seen.borrow(), vec![42, 10]);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn queued_updates_apply_in_order() {
        let observed = Observed::new(1);
        let handle = observed.clone();
        observed.emplace_side_effect(move |value| {
            if *value == 1 {
                handle.update_with(|v| *v += 10);
                handle.update_with(|v| *v *= 2);
            }
            true
        });
        let count = counter(&observed);

        observed.set(1);
        assert_eq!(observed.get(), 22);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn side_effect_attached_during_pass_runs_next_time() {
        let observed = Observed::new(0);
        let count = Rc::new(Cell::new(0));

        let handle = observed.clone();
        let count_clone = count.clone();
        observed.emplace_side_effect(move |_| {
            let count = count_clone.clone();
            handle.emplace_side_effect(move |_| {
                count.set(count.get() + 1);
                true
            });
            false
        });

        observed.set(1);
        assert_eq!(count.get(), 0);
        observed.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn attached_event_is_activated_on_change() {
        let ctx = EventContext::new();
        let observed = Observed::new(0);
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let id = ctx.register_event(Event::new(move |_| {
            runs_clone.set(runs_clone.get() + 1);
            true
        }));

        observed.attach_event(&ctx, id);
        observed.set(1);
        observed.set(2);
        assert_eq!(runs.get(), 0);

        ctx.execute_active_events();
        assert_eq!(runs.get(), 1);

        ctx.remove_event(id);
        observed.set(3);
        assert_eq!(observed.side_effect_count(), 0);
    }

    #[test]
    fn oneshot_event_detaches_after_first_change() {
        let ctx = EventContext::new();
        let observed = Observed::new(0);
        let id = ctx.register_event(Event::new(|_| true));

        observed.attach_oneshot_event(&ctx, id);
        assert_eq!(observed.side_effect_count(), 1);

        observed.set(1);
        assert_eq!(observed.side_effect_count(), 0);
        assert_eq!(ctx.active_count(), 1);
    }

    #[test]
    fn instant_update_drains_context() {
        let ctx = EventContext::new();
        let observed = Observed::new(0);
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let id = ctx.register_event(Event::new(move |_| {
            runs_clone.set(runs_clone.get() + 1);
            true
        }));

        observed.attach_event(&ctx, id);
        observed.instant_update(Some(&ctx));
        observed.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn weak_handle_tracks_lifetime() {
        let observed = Observed::new(String::from("a"));
        let weak = observed.downgrade();
        assert!(weak.is_alive());
        assert_eq!(weak.upgrade().map(|o| o.get()), Some(String::from("a")));

        drop(observed);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn clone_shares_state() {
        let a = Observed::new(1);
        let b = a.clone();
        b.set(2);
        assert_eq!(a.get(), 2);
        assert!(a.ptr_eq(&b));
    }
}
