//! Composition
//!
//! Combinators that declare "this part of the tree depends on these Observed
//! values" without manual event wiring.
//!
//! | Combinator | Renders |
//! |---|---|
//! | [`fragment`] | several renderers into the target, without a wrapper |
//! | [`fragment_reactive`] | a generator's output into the target, again on every change |
//! | [`conditional`] / [`show`] | one of two renderers, following a `bool` |
//! | [`switch_`] | the renderer of the case matching an Observed value |
//! | [`range`] | one renderer per item of an Observed list |
//! | [`stabilize`] | a subtree that survives re-renders of its enclosing block |
//! | [`delocalized_slot`] | a [`Delocalized`] subtree while its slot is active, a placeholder otherwise |
//! | [`nil`] | nothing |
//!
//! Reactive combinators replace their whole output on change. Only attribute
//! and text bindings patch nodes in place.

mod conditional;
mod delocalized;
mod fragment;
mod range;
mod stabilize;
mod switch;

pub use conditional::{conditional, conditional_on, show};
pub use delocalized::{delocalized_slot, delocalized_slot_or, Delocalized};
pub use fragment::{fragment, fragment_reactive, nil};
pub use range::range;
pub(crate) use range::range_generator;
pub use stabilize::{stabilize, StableElement};
pub use switch::{switch_, Switch};
