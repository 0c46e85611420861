//! Listening to Observed values from application code.

use super::observed::Observed;
use crate::event::{Event, EventContext, EventId};

/// Run `on_change` with the current value whenever `observed` changes and
/// `ctx` is drained.
///
/// The listener stays registered while `on_change` returns `true`. It holds
/// the value weakly and becomes invalid once the value is dropped.
/// `on_change` receives a snapshot, so it may write the value it listens to;
/// that write is picked up by the next drain.
///
/// # Example
///
/// ```rust,ignore
/// let name = Observed::new(String::from("a"));
/// listen(&ctx, &name, |name| {
///     println!("name changed to {name}");
///     true
/// });
/// ```
pub fn listen<T, F>(ctx: &EventContext, observed: &Observed<T>, mut on_change: F) -> EventId
where
    T: Clone + 'static,
    F: FnMut(&T) -> bool + 'static,
{
    let source = observed.downgrade();
    let validity = source.clone();

    let id = ctx.register_event(Event::with_validity(
        move |_| match source.upgrade() {
            Some(observed) => {
                let snapshot = observed.get();
                on_change(&snapshot)
            }
            None => false,
        },
        move || validity.is_alive(),
    ));
    observed.attach_event(ctx, id);
    id
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn listener_runs_only_when_context_drains() {
        let ctx = EventContext::new();
        let observed = Observed::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        listen(&ctx, &observed, move |value| {
            seen_clone.borrow_mut().push(*value);
            true
        });

        observed.set(1);
        assert!(seen.borrow().is_empty());

        ctx.execute_active_events();
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn listener_does_not_run_without_change() {
        let ctx = EventContext::new();
        let observed = Observed::new(0);
        let runs = Rc::new(Cell::new(0));

        let runs_clone = runs.clone();
        listen(&ctx, &observed, move |_| {
            runs_clone.set(runs_clone.get() + 1);
            true
        });

        ctx.execute_active_events();
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn listener_returning_false_is_removed() {
        let ctx = EventContext::new();
        let observed = Observed::new(0);
        let runs = Rc::new(Cell::new(0));

        let runs_clone = runs.clone();
        listen(&ctx, &observed, move |_| {
            runs_clone.set(runs_clone.get() + 1);
            false
        });

        observed.set(1);
        ctx.execute_active_events();
        observed.set(2);
        ctx.execute_active_events();

        assert_eq!(runs.get(), 1);
        assert_eq!(ctx.event_count(), 0);
    }

    #[test]
    fn listener_may_write_its_own_value() {
        let ctx = EventContext::new();
        let value = Observed::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (handle, seen_clone) = (value.clone(), seen.clone());
        let id = listen(&ctx, &value, move |current| {
            seen_clone.borrow_mut().push(*current);
            if *current > 10 {
                handle.set(10);
            }
            true
        });

        value.set(42);
        ctx.execute_active_events();
        assert_eq!(value.get(), 10);
        assert_eq!(*seen.borrow(), vec![42]);

        ctx.execute_active_events();
        assert_eq!(*seen.borrow(), vec![42, 10]);

        value.set(3);
        assert_eq!(ctx.activate_event(id), crate::event::Selection::AlreadySelected);
        ctx.execute_active_events();
        assert_eq!(*seen.borrow(), vec![42, 10, 3]);
    }

    #[test]
    fn listener_of_dropped_value_is_skipped() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let id = {
            let observed = Observed::new(0);
            let runs_clone = runs.clone();
            let id = listen(&ctx, &observed, move |_| {
                runs_clone.set(runs_clone.get() + 1);
                true
            });
            observed.set(1);
            id
        };

        assert!(ctx.activate_event(id).is_found());
        ctx.execute_active_events();
        assert_eq!(runs.get(), 0);
        assert_eq!(ctx.event_count(), 0);
    }
}
