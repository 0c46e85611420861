//! Reactive Primitives
//!
//! This module implements Observed values and the helpers that connect them
//! to the event system.
//!
//! # Concepts
//!
//! ## Observed Values
//!
//! An Observed value is a mutable cell with a list of side effects. Every
//! completed mutation runs one notification pass over the side effects, in
//! the order they were attached.
//!
//! ## Groups
//!
//! `observe(..)` bundles several Observed values so that one event is
//! activated when any of them changes. `generate` pairs a group with a
//! function computing a value (a string, an attribute, a subtree) from it.
//!
//! ## Listening
//!
//! `listen` registers application code that runs with the new value on the
//! next drain of the event context.
//!
//! # Implementation Notes
//!
//! Dependencies are declared explicitly. Nothing is tracked through a
//! thread-local context: the UI core receives the values it depends on as
//! arguments and attaches events to them during materialization.

mod combinator;
mod listen;
mod observed;

pub use combinator::{observe, IntoObservedGroup, ObservedGenerator, ObservedGroup};
pub use listen::listen;
pub use observed::{Attachable, ModificationGuard, Observed, WeakObserved};
