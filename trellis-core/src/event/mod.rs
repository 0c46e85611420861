//! Event System
//!
//! This module implements the cooperative event loop that connects Observed
//! values to DOM mutations.
//!
//! # Concepts
//!
//! ## Slot Registry
//!
//! A sparse table with stable ids. Entries can be selected (marked due) and
//! drained in batches. Ids are never reused, so a stale id can only ever
//! resolve to "not found".
//!
//! ## Events
//!
//! An Event is an action that reports whether it wants to stay registered,
//! paired with a validity predicate. Reactive bindings use the predicate to
//! check whether their DOM node still exists.
//!
//! ## Event Context
//!
//! The context owns the events table and the after-effects table. Observed
//! values activate entries when they change; the host loop drains them by
//! calling `execute_active_events`. Nothing here runs on a background thread.

mod context;
mod entry;
mod registry;

pub use context::{EventContext, EventContextConfig, EventRegistry, WeakEventContext};
pub use entry::{Event, EventId};
pub use registry::{Selection, SlotId, SlotRegistry};
