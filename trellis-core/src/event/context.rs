//! Event Context
//!
//! The event context is the manual microtask queue of the UI core. It owns
//! two slot tables:
//!
//! - **events**: reactive bindings registered during materialization;
//! - **after-effects**: work that must observe the settled state after all
//!   events of a drain have run.
//!
//! # How Draining Works
//!
//! 1. Mutating an Observed value activates slots (`activate_event`). Nothing
//!    runs yet.
//!
//! 2. The host loop calls `execute_active_events`. The due events are taken
//!    out of the table in one batch and the table borrow is released, so
//!    actions are free to register, activate or remove events.
//!
//! 3. Each event is validity-checked and run. Events that return `true` are
//!    put back under the same id; the rest are released. Activations made
//!    while a batch runs wait for the next drain, including an event
//!    activating itself. An action that panics is logged and kept.
//!
//! 4. The after-effects table is drained the same way.
//!
//! 5. Every `clean_interval` drains, entries whose validity predicate fails
//!    are swept from both tables.
//!
//! The context is a cheap handle: clones share the same tables.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use super::entry::{Event, EventId};
use super::registry::{Selection, SlotRegistry};

/// Tunables for an [`EventContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventContextConfig {
    /// Sweep invalid events after this many drains. Zero disables the sweep.
    pub clean_interval: u32,
}

impl Default for EventContextConfig {
    fn default() -> Self {
        Self { clean_interval: 64 }
    }
}

/// The two tables of an event context.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: SlotRegistry<Event>,
    after_effects: SlotRegistry<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Events,
    AfterEffects,
}

impl EventRegistry {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary events table.
    pub fn events(&self) -> &SlotRegistry<Event> {
        &self.events
    }

    /// The after-effects table.
    pub fn after_effects(&self) -> &SlotRegistry<Event> {
        &self.after_effects
    }

    fn table(&self, table: Table) -> &SlotRegistry<Event> {
        match table {
            Table::Events => &self.events,
            Table::AfterEffects => &self.after_effects,
        }
    }

    fn table_mut(&mut self, table: Table) -> &mut SlotRegistry<Event> {
        match table {
            Table::Events => &mut self.events,
            Table::AfterEffects => &mut self.after_effects,
        }
    }

    /// Remove invalid idle entries from both tables and return them.
    fn sweep_invalid(&mut self) -> Vec<Event> {
        let mut removed = self.events.retain(|_, event| event.is_valid());
        removed.extend(self.after_effects.retain(|_, event| event.is_valid()));
        removed
    }
}

struct ContextInner {
    registry: RefCell<EventRegistry>,
    config: EventContextConfig,
    drains_since_sweep: Cell<u32>,
}

/// Shared handle to an event registry.
///
/// # Example
///
/// ```rust,ignore
/// let ctx = EventContext::new();
/// let id = ctx.register_event(Event::new(|_| {
///     println!("ran");
///     true
/// }));
///
/// ctx.activate_event(id);
/// ctx.execute_active_events(); // prints "ran"
/// ```
#[derive(Clone)]
pub struct EventContext {
    inner: Rc<ContextInner>,
}

/// Non-owning handle to an [`EventContext`].
#[derive(Clone)]
pub struct WeakEventContext {
    inner: Weak<ContextInner>,
}

impl WeakEventContext {
    /// Get the context back if it is still alive.
    pub fn upgrade(&self) -> Option<EventContext> {
        self.inner.upgrade().map(|inner| EventContext { inner })
    }
}

impl EventContext {
    /// Create a context with default settings.
    pub fn new() -> Self {
        Self::with_config(EventContextConfig::default())
    }

    /// Create a context with the given settings.
    pub fn with_config(config: EventContextConfig) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                registry: RefCell::new(EventRegistry::new()),
                config,
                drains_since_sweep: Cell::new(0),
            }),
        }
    }

    /// The settings this context was created with.
    pub fn config(&self) -> EventContextConfig {
        self.inner.config
    }

    /// Create a non-owning handle.
    pub fn downgrade(&self) -> WeakEventContext {
        WeakEventContext {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles share the same tables.
    pub fn ptr_eq(&self, other: &EventContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register an event. It runs only after being activated.
    pub fn register_event(&self, event: Event) -> EventId {
        self.inner.registry.borrow_mut().events.append(event)
    }

    /// Mark an event as due for the next drain.
    pub fn activate_event(&self, id: EventId) -> Selection {
        self.inner.registry.borrow_mut().events.select(id)
    }

    /// Remove an event. Unknown ids are ignored.
    pub fn remove_event(&self, id: EventId) {
        self.remove(Table::Events, id);
    }

    /// Register an after-effect.
    pub fn register_after_effect(&self, event: Event) -> EventId {
        self.inner.registry.borrow_mut().after_effects.append(event)
    }

    /// Mark an after-effect as due for the next drain.
    pub fn activate_after_effect(&self, id: EventId) -> Selection {
        self.inner.registry.borrow_mut().after_effects.select(id)
    }

    /// Remove an after-effect. Unknown ids are ignored.
    pub fn remove_after_effect(&self, id: EventId) {
        self.remove(Table::AfterEffects, id);
    }

    fn remove(&self, table: Table, id: EventId) {
        let removed = self.inner.registry.borrow_mut().table_mut(table).take(id);
        // Dropped outside the borrow: captured state may call back into us.
        drop(removed);
    }

    /// Run one event right away, whether or not it was activated.
    pub fn execute_event(&self, id: EventId) {
        let taken = self
            .inner
            .registry
            .borrow_mut()
            .events
            .take_for_execution(id);

        if let Some(event) = taken {
            self.run(Table::Events, id, event);
        }
    }

    /// Drain all due events, then all due after-effects.
    pub fn execute_active_events(&self) {
        self.drain(Table::Events);
        self.drain(Table::AfterEffects);
        self.tick_sweep();
    }

    /// Remove every idle entry whose validity predicate fails.
    ///
    /// Validity predicates run while the tables are borrowed and must not
    /// call back into the context.
    pub fn clean_invalid_events(&self) {
        let removed = self.inner.registry.borrow_mut().sweep_invalid();
        if !removed.is_empty() {
            debug!(count = removed.len(), "removed invalid events");
        }
        drop(removed);
    }

    /// Number of live primary events.
    pub fn event_count(&self) -> usize {
        self.inner.registry.borrow().events.len()
    }

    /// Number of live after-effects.
    pub fn after_effect_count(&self) -> usize {
        self.inner.registry.borrow().after_effects.len()
    }

    /// Number of due entries across both tables.
    pub fn active_count(&self) -> usize {
        let registry = self.inner.registry.borrow();
        registry.events.selected_count() + registry.after_effects.selected_count()
    }

    fn drain(&self, table: Table) {
        let batch = self.inner.registry.borrow_mut().table_mut(table).take_selected();
        if batch.is_empty() {
            return;
        }
        trace!(count = batch.len(), ?table, "draining active events");

        for (id, event) in batch {
            let pending = self.inner.registry.borrow().table(table).is_in_flight(id);
            if !pending {
                // Removed by an earlier action of this batch.
                drop(event);
                continue;
            }
            self.run(table, id, event);
        }
    }

    fn run(&self, table: Table, id: EventId, mut event: Event) {
        let keep = match panic::catch_unwind(AssertUnwindSafe(|| event.execute(id))) {
            Ok(keep) => keep,
            Err(_) => {
                error!(%id, ?table, "event action panicked");
                true
            }
        };

        let leftover = {
            let mut registry = self.inner.registry.borrow_mut();
            let slots = registry.table_mut(table);
            if keep {
                slots.restore(id, event).err()
            } else {
                slots.release(id);
                Some(event)
            }
        };
        drop(leftover);
    }

    fn tick_sweep(&self) {
        let interval = self.inner.config.clean_interval;
        if interval == 0 {
            return;
        }

        let drains = self.inner.drains_since_sweep.get() + 1;
        if drains >= interval {
            self.inner.drains_since_sweep.set(0);
            self.clean_invalid_events();
        } else {
            self.inner.drains_since_sweep.set(drains);
        }
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.borrow();
        f.debug_struct("EventContext")
            .field("events", &registry.events.len())
            .field("after_effects", &registry.after_effects.len())
            .field("config", &self.inner.config)
            .finish()
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn counting_event(runs: &Rc<Cell<i32>>, keep: bool) -> Event {
        let runs = runs.clone();
        Event::new(move |_| {
            runs.set(runs.get() + 1);
            keep
        })
    }

    #[test]
    fn drain_without_activation_runs_nothing() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        for _ in 0..5 {
            ctx.register_event(counting_event(&runs, true));
        }

        ctx.execute_active_events();
        assert_eq!(runs.get(), 0);
        assert_eq!(ctx.event_count(), 5);
    }

    #[test]
    fn double_activation_runs_once() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let id = ctx.register_event(counting_event(&runs, true));

        assert_eq!(ctx.activate_event(id), Selection::Selected);
        assert_eq!(ctx.activate_event(id), Selection::AlreadySelected);
        ctx.execute_active_events();

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn only_activated_event_runs() {
        let ctx = EventContext::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let ids: Vec<EventId> = (0..3)
            .map(|i| {
                let log = log.clone();
                ctx.register_event(Event::new(move |_| {
                    log.borrow_mut().push(i);
                    true
                }))
            })
            .collect();

        ctx.activate_event(ids[1]);
        ctx.execute_active_events();
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn returning_false_removes_event() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let id = ctx.register_event(counting_event(&runs, false));

        ctx.activate_event(id);
        ctx.execute_active_events();
        assert_eq!(runs.get(), 1);

        assert_eq!(ctx.activate_event(id), Selection::NotFound);
        ctx.execute_active_events();
        assert_eq!(runs.get(), 1);
        assert_eq!(ctx.event_count(), 0);
    }

    #[test]
    fn returning_true_allows_reactivation() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let id = ctx.register_event(counting_event(&runs, true));

        for _ in 0..3 {
            ctx.activate_event(id);
            ctx.execute_active_events();
        }
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn invalid_event_is_removed_without_running() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let id = ctx.register_event(Event::with_validity(
            move |_| {
                runs_clone.set(runs_clone.get() + 1);
                true
            },
            || false,
        ));

        ctx.activate_event(id);
        ctx.execute_active_events();
        assert_eq!(runs.get(), 0);
        assert_eq!(ctx.event_count(), 0);
    }

    #[test]
    fn clean_invalid_events_sweeps_idle_entries() {
        let ctx = EventContext::with_config(EventContextConfig { clean_interval: 0 });
        let alive = Rc::new(Cell::new(true));
        let alive_clone = alive.clone();
        ctx.register_event(Event::with_validity(|_| true, move || alive_clone.get()));
        ctx.register_after_effect(Event::with_validity(|_| true, || false));

        ctx.clean_invalid_events();
        assert_eq!(ctx.event_count(), 1);
        assert_eq!(ctx.after_effect_count(), 0);

        alive.set(false);
        ctx.clean_invalid_events();
        assert_eq!(ctx.event_count(), 0);
    }

    #[test]
    fn periodic_sweep_follows_interval() {
        let ctx = EventContext::with_config(EventContextConfig { clean_interval: 2 });
        ctx.register_event(Event::with_validity(|_| true, || false));

        ctx.execute_active_events();
        assert_eq!(ctx.event_count(), 1);
        ctx.execute_active_events();
        assert_eq!(ctx.event_count(), 0);
    }

    #[test]
    fn after_effects_run_after_events() {
        let ctx = EventContext::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_after = log.clone();
        let after = ctx.register_after_effect(Event::new(move |_| {
            log_after.borrow_mut().push("after");
            false
        }));
        let log_event = log.clone();
        let event = ctx.register_event(Event::new(move |_| {
            log_event.borrow_mut().push("event");
            true
        }));

        ctx.activate_after_effect(after);
        ctx.activate_event(event);
        ctx.execute_active_events();

        assert_eq!(*log.borrow(), vec!["event", "after"]);
        assert_eq!(ctx.after_effect_count(), 0);
    }

    #[test]
    fn activation_during_drain_waits_for_next_drain() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let second = ctx.register_event(counting_event(&runs, true));

        let weak = ctx.downgrade();
        let first = ctx.register_event(Event::new(move |_| {
            if let Some(ctx) = weak.upgrade() {
                ctx.activate_event(second);
            }
            true
        }));

        ctx.activate_event(first);
        ctx.execute_active_events();
        assert_eq!(runs.get(), 0);
        assert_eq!(ctx.active_count(), 1);

        ctx.execute_active_events();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn event_activating_itself_runs_on_next_drain() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(EventId::INVALID));

        let (weak, runs_clone, own_id_clone) = (ctx.downgrade(), runs.clone(), own_id.clone());
        let id = ctx.register_event(Event::new(move |_| {
            runs_clone.set(runs_clone.get() + 1);
            if runs_clone.get() == 1 {
                if let Some(ctx) = weak.upgrade() {
                    assert_eq!(ctx.activate_event(own_id_clone.get()), Selection::Selected);
                }
            }
            true
        }));
        own_id.set(id);

        ctx.activate_event(id);
        ctx.execute_active_events();
        assert_eq!(runs.get(), 1);
        assert_eq!(ctx.active_count(), 1);

        ctx.execute_active_events();
        assert_eq!(runs.get(), 2);
        assert_eq!(ctx.active_count(), 0);

        ctx.execute_active_events();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn panicking_action_does_not_strand_batch() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let faulty = ctx.register_event(Event::new(|_| panic!("boom")));
        let healthy = ctx.register_event(counting_event(&runs, true));

        ctx.activate_event(faulty);
        ctx.activate_event(healthy);
        ctx.execute_active_events();
        assert_eq!(runs.get(), 1);
        assert_eq!(ctx.event_count(), 2);

        assert_eq!(ctx.activate_event(healthy), Selection::Selected);
        assert_eq!(ctx.activate_event(faulty), Selection::Selected);
        ctx.execute_active_events();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn removal_during_drain_skips_pending_event() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let victim_slot = Rc::new(Cell::new(EventId::INVALID));

        let weak = ctx.downgrade();
        let victim_for_killer = victim_slot.clone();
        let killer = ctx.register_event(Event::new(move |_| {
            if let Some(ctx) = weak.upgrade() {
                ctx.remove_event(victim_for_killer.get());
            }
            true
        }));
        let victim = ctx.register_event(counting_event(&runs, true));
        victim_slot.set(victim);

        ctx.activate_event(killer);
        ctx.activate_event(victim);
        ctx.execute_active_events();

        assert_eq!(runs.get(), 0);
        assert_eq!(ctx.event_count(), 1);
    }

    #[test]
    fn execute_event_runs_immediately() {
        let ctx = EventContext::new();
        let runs = Rc::new(Cell::new(0));
        let id = ctx.register_event(counting_event(&runs, false));

        ctx.execute_event(id);
        assert_eq!(runs.get(), 1);
        assert_eq!(ctx.event_count(), 0);

        ctx.execute_event(id);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EventContextConfig = serde_json::from_str("{}").expect("valid json");
        assert_eq!(config, EventContextConfig::default());

        let config: EventContextConfig =
            serde_json::from_str(r#"{"clean_interval": 8}"#).expect("valid json");
        assert_eq!(config.clean_interval, 8);
    }
}
