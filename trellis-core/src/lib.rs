//! Trellis Core
//!
//! This crate provides the core of the Trellis declarative UI framework:
//!
//! - Observed values, mutable cells that notify attached side effects
//! - An event context, the manual microtask queue that reactive bindings run on
//! - Element descriptions and their materialization into a DOM
//! - Composition helpers for conditional, switched and list rendering
//! - An RPC client for named-function calls across a host boundary
//!
//! Elements are created once. When an Observed value changes, only the
//! attributes and text nodes bound to it are patched; reactive blocks
//! rebuild their whole content. There is no virtual DOM and no diffing.
//!
//! # Architecture
//!
//! - `event`: slot registry and event context
//! - `reactive`: Observed values and grouping
//! - `dom`: native host abstraction, node arena, in-memory host
//! - `element`: attributes, element descriptions, placements, materialization
//! - `compose`: fragment, conditional, switch, range, stabilize, delocalized slots
//! - `rpc`: named-function channel with back-channel responses
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use trellis_core::dom::MemoryDom;
//! use trellis_core::element::{button, div, on_click, span};
//! use trellis_core::reactive::Observed;
//! use trellis_core::Runtime;
//!
//! let document = MemoryDom::new();
//! let runtime = Runtime::new(Rc::new(document.clone()));
//!
//! let count = Observed::new(0);
//! let label = count.clone();
//! let clicks = count.clone();
//!
//! runtime.render(&div([]).children([
//!     span([]).reactive_text(&count, move || label.get().to_string()),
//!     button([on_click(move |_| clicks.update_with(|n| *n += 1))]).text("+"),
//! ]));
//!
//! // A click runs the handler, then drains the event context:
//! // the span now reads "1".
//! ```

pub mod compose;
pub mod dom;
pub mod element;
pub mod error;
pub mod event;
pub mod reactive;
pub mod rpc;
mod runtime;

pub use runtime::{Runtime, RuntimeConfig, WeakRuntime};
