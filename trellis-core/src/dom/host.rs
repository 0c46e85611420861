//! Native DOM Host
//!
//! The UI core never touches a browser directly. It talks to a [`DomHost`],
//! which owns the real nodes and hands out opaque [`NativeHandle`]s. A host
//! can be a browser engine in the same process, a proxy forwarding calls to
//! a remote WebView, or the in-memory [`MemoryDom`](super::MemoryDom).
//!
//! Hosts use interior mutability: every method takes `&self`, so a handler
//! dispatched by the host may call back into the core.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::DomError;

/// Namespace used for SVG elements.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Opaque handle to a node owned by a [`DomHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Wrap a raw host identifier.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw host identifier.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native#{}", self.0)
    }
}

/// Callback attached to a native DOM event. Receives the event payload.
pub type DomListener = Rc<dyn Fn(&Value)>;

/// The primitives the UI core needs from a DOM implementation.
pub trait DomHost {
    /// The document body, used as the mount point.
    fn body(&self) -> NativeHandle;

    fn create_element(&self, tag: &str) -> NativeHandle;

    fn create_element_ns(&self, namespace: &str, tag: &str) -> NativeHandle;

    fn create_text_node(&self, text: &str) -> NativeHandle;

    fn create_comment(&self, text: &str) -> NativeHandle;

    fn set_attribute(&self, node: NativeHandle, key: &str, value: &str);

    fn remove_attribute(&self, node: NativeHandle, key: &str);

    /// Set a script-visible property (`node[key] = value`).
    fn set_property(&self, node: NativeHandle, key: &str, value: Value);

    /// Read a script-visible property. Missing properties read as `Null`.
    fn get_property(&self, node: NativeHandle, key: &str) -> Value;

    fn append_child(&self, parent: NativeHandle, child: NativeHandle);

    /// Insert `child` before `reference`, or append it when `reference` is
    /// not a child of `parent`.
    fn insert_before(&self, parent: NativeHandle, child: NativeHandle, reference: NativeHandle);

    /// Put `replacement` where `node` is. A detached `node` is left alone.
    fn replace_with(&self, node: NativeHandle, replacement: NativeHandle);

    /// Detach a node from its parent.
    fn remove(&self, node: NativeHandle);

    fn set_text_content(&self, node: NativeHandle, text: &str);

    /// Set the data of a text or comment node.
    fn set_node_value(&self, node: NativeHandle, value: &str);

    fn add_event_listener(&self, node: NativeHandle, event: &str, listener: DomListener);

    /// Invoke a method on the node.
    fn call_method(&self, node: NativeHandle, method: &str, args: &[Value]) -> Result<Value, DomError>;

    /// The core no longer refers to this handle.
    fn release(&self, node: NativeHandle);

    /// Print a warning on the host console.
    fn warn(&self, message: &str);
}
