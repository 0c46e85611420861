//! Live DOM
//!
//! This module owns the live side of the UI: the native host and the arena
//! that tracks which native nodes the core created and how they nest.
//!
//! # Ownership
//!
//! A node exclusively owns its children and its fragment members. Destroying
//! a node destroys its whole subtree: arena entries are removed (expiring
//! every `NodeRef` to them), the subtree root is detached natively, and all
//! native handles are released. Stable nodes are the exception: they are
//! unlinked from their parent but stay alive until destroyed explicitly.
//!
//! Reactive bindings never own nodes. They keep a `NodeRef` and check
//! [`Dom::is_alive`] before touching the node.

mod arena;
mod host;
mod memory;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use smallvec::SmallVec;

pub use arena::NodeRef;
pub use host::{DomHost, DomListener, NativeHandle, SVG_NAMESPACE};
pub use memory::MemoryDom;

use arena::{NodeArena, NodeEntry};
use crate::element::{AttributeValue, ElementKind};
use crate::error::DomError;
use crate::event::EventId;

struct DomInner {
    host: Rc<dyn DomHost>,
    arena: RefCell<NodeArena>,
}

/// Shared handle to the native host and the node arena.
#[derive(Clone)]
pub struct Dom {
    inner: Rc<DomInner>,
}

impl Dom {
    /// Wrap a host with an empty arena.
    pub fn new(host: Rc<dyn DomHost>) -> Self {
        Self {
            inner: Rc::new(DomInner {
                host,
                arena: RefCell::new(NodeArena::default()),
            }),
        }
    }

    /// The native host.
    pub fn host(&self) -> &dyn DomHost {
        &*self.inner.host
    }

    /// Track a host node the core did not create, such as the body.
    ///
    /// Destroying the returned node clears its tracked subtree but leaves the
    /// host node itself in place.
    pub fn adopt(&self, native: NativeHandle) -> NodeRef {
        let mut entry = NodeEntry::new(native, String::new(), ElementKind::Regular);
        entry.adopted = true;
        self.inner.arena.borrow_mut().insert(entry)
    }

    /// Whether the node has not been destroyed.
    pub fn is_alive(&self, node: NodeRef) -> bool {
        self.inner.arena.borrow().contains(node)
    }

    /// Number of live nodes, adopted ones included.
    pub fn node_count(&self) -> usize {
        self.inner.arena.borrow().len()
    }

    fn read<R>(&self, node: NodeRef, f: impl FnOnce(&NodeEntry) -> R) -> Option<R> {
        self.inner.arena.borrow().get(node).map(f)
    }

    fn write<R>(&self, node: NodeRef, f: impl FnOnce(&mut NodeEntry) -> R) -> Option<R> {
        self.inner.arena.borrow_mut().get_mut(node).map(f)
    }

    pub fn native(&self, node: NodeRef) -> Option<NativeHandle> {
        self.read(node, |entry| entry.native)
    }

    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.read(node, |entry| entry.parent).flatten()
    }

    /// Tag name the node was created with. Empty for text, comment and
    /// adopted nodes.
    pub fn tag(&self, node: NodeRef) -> Option<String> {
        self.read(node, |entry| entry.tag.clone())
    }

    pub fn kind(&self, node: NodeRef) -> Option<ElementKind> {
        self.read(node, |entry| entry.kind)
    }

    /// Indexed children.
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.read(node, |entry| entry.children.clone())
            .unwrap_or_default()
    }

    pub fn child(&self, node: NodeRef, index: usize) -> Option<NodeRef> {
        self.read(node, |entry| entry.children.get(index).copied())
            .flatten()
    }

    pub fn child_count(&self, node: NodeRef) -> usize {
        self.read(node, |entry| entry.children.len()).unwrap_or(0)
    }

    /// Fragment members owned by the node.
    pub fn fragment_members(&self, node: NodeRef) -> Vec<NodeRef> {
        self.read(node, |entry| entry.fragments.clone())
            .unwrap_or_default()
    }

    /// Counter bumped each time the node's children are cleared.
    pub fn epoch(&self, node: NodeRef) -> Option<u32> {
        self.read(node, |entry| entry.epoch)
    }

    pub fn is_stable(&self, node: NodeRef) -> bool {
        self.read(node, |entry| entry.stable).unwrap_or(false)
    }

    /// Apply an attribute value. Returns `false` if the node is gone.
    pub fn apply_attribute(&self, node: NodeRef, key: &str, value: AttributeValue) -> bool {
        let Some(native) = self.native(node) else {
            return false;
        };
        match value {
            AttributeValue::Text(text) if !text.is_empty() => {
                self.host().set_attribute(native, key, &text)
            }
            AttributeValue::Flag(true) => self.host().set_attribute(native, key, key),
            _ => self.host().remove_attribute(native, key),
        }
        true
    }

    /// Set a script-visible property. Returns `false` if the node is gone.
    pub fn set_property(&self, node: NodeRef, key: &str, value: Value) -> bool {
        match self.native(node) {
            Some(native) => {
                self.host().set_property(native, key, value);
                true
            }
            None => false,
        }
    }

    /// Replace the node's content with text. Returns `false` if the node is
    /// gone.
    pub fn set_text_content(&self, node: NodeRef, text: &str) -> bool {
        match self.native(node) {
            Some(native) => {
                self.host().set_text_content(native, text);
                true
            }
            None => false,
        }
    }

    /// Patch the data of a text or comment node. Returns `false` if the node
    /// is gone.
    pub fn set_node_value(&self, node: NodeRef, value: &str) -> bool {
        match self.native(node) {
            Some(native) => {
                self.host().set_node_value(native, value);
                true
            }
            None => false,
        }
    }

    pub fn add_event_listener(&self, node: NodeRef, event: &str, listener: DomListener) -> bool {
        match self.native(node) {
            Some(native) => {
                self.host().add_event_listener(native, event, listener);
                true
            }
            None => false,
        }
    }

    /// Invoke a method on the node and convert its return value.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let has_id: bool = dom.call(node, "hasAttribute", &[json!("id")])?;
    /// ```
    pub fn call<R: DeserializeOwned>(
        &self,
        node: NodeRef,
        method: &str,
        args: &[Value],
    ) -> Result<R, DomError> {
        let native = self.native(node).ok_or(DomError::StaleNode(node))?;
        let value = self.host().call_method(native, method, args)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Read a script-visible property and convert it.
    pub fn property<R: DeserializeOwned>(&self, node: NodeRef, key: &str) -> Result<R, DomError> {
        let native = self.native(node).ok_or(DomError::StaleNode(node))?;
        Ok(serde_json::from_value(self.host().get_property(native, key))?)
    }

    // ---- Structure, used by materialization ----

    pub(crate) fn insert(&self, native: NativeHandle, tag: &str, kind: ElementKind) -> NodeRef {
        self.inner
            .arena
            .borrow_mut()
            .insert(NodeEntry::new(native, tag.to_owned(), kind))
    }

    /// Record `child` under `parent`, at `index` or at the end.
    pub(crate) fn link_child(&self, parent: NodeRef, child: NodeRef, index: Option<usize>) {
        let mut arena = self.inner.arena.borrow_mut();
        let Some(entry) = arena.get_mut(parent) else {
            return;
        };
        match index {
            Some(index) if index < entry.children.len() => entry.children.insert(index, child),
            _ => entry.children.push(child),
        }
        if let Some(entry) = arena.get_mut(child) {
            entry.parent = Some(parent);
        }
    }

    /// Record `member` as a fragment member of `parent`.
    pub(crate) fn link_fragment(&self, parent: NodeRef, member: NodeRef) {
        let mut arena = self.inner.arena.borrow_mut();
        let Some(entry) = arena.get_mut(parent) else {
            return;
        };
        entry.fragments.push(member);
        if let Some(entry) = arena.get_mut(member) {
            entry.parent = Some(parent);
        }
    }

    /// Put `replacement` where `node` is in its parent's lists.
    pub(crate) fn splice(&self, node: NodeRef, replacement: NodeRef) {
        let mut arena = self.inner.arena.borrow_mut();
        let Some(parent) = arena.get_mut(node).and_then(|entry| entry.parent.take()) else {
            return;
        };
        if let Some(entry) = arena.get_mut(parent) {
            for slot in entry.children.iter_mut().chain(entry.fragments.iter_mut()) {
                if *slot == node {
                    *slot = replacement;
                }
            }
        }
        if let Some(entry) = arena.get_mut(replacement) {
            entry.parent = Some(parent);
        }
    }

    /// Move fragment members of `parent` in front of `anchor`, natively and
    /// in the member list, keeping their relative order.
    pub(crate) fn move_before(&self, parent: NodeRef, nodes: &[NodeRef], anchor: NodeRef) {
        let (Some(parent_native), Some(anchor_native)) = (self.native(parent), self.native(anchor)) else {
            return;
        };
        for node in nodes {
            if let Some(native) = self.native(*node) {
                self.host().insert_before(parent_native, native, anchor_native);
            }
        }

        self.write(parent, |entry| {
            let moved: Vec<NodeRef> = entry
                .fragments
                .iter()
                .copied()
                .filter(|member| nodes.contains(member))
                .collect();
            entry.fragments.retain(|member| !nodes.contains(member));
            let index = entry
                .fragments
                .iter()
                .position(|member| *member == anchor)
                .unwrap_or(entry.fragments.len());
            entry.fragments.splice(index..index, moved);
        });
    }

    /// Forget the parent link of `node` on both sides.
    pub(crate) fn unlink(&self, node: NodeRef) {
        let mut arena = self.inner.arena.borrow_mut();
        unlink_in(&mut arena, node);
    }

    pub(crate) fn attach_event(&self, node: NodeRef, id: EventId) {
        self.write(node, |entry| entry.events.push(id));
    }

    pub(crate) fn take_events(&self, node: NodeRef) -> SmallVec<[EventId; 4]> {
        self.write(node, |entry| std::mem::take(&mut entry.events))
            .unwrap_or_default()
    }

    pub(crate) fn set_stable(&self, node: NodeRef, stable: bool) {
        self.write(node, |entry| entry.stable = stable);
    }

    /// Swap the native node behind `node`, keeping the handle. Returns the
    /// previous native node.
    pub(crate) fn swap_native(
        &self,
        node: NodeRef,
        native: NativeHandle,
        tag: &str,
        kind: ElementKind,
    ) -> Option<NativeHandle> {
        self.write(node, |entry| {
            entry.tag = tag.to_owned();
            entry.kind = kind;
            std::mem::replace(&mut entry.native, native)
        })
    }

    /// Detach children and fragment members from `node` and bump its epoch.
    pub(crate) fn take_children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.write(node, |entry| {
            entry.epoch = entry.epoch.wrapping_add(1);
            let mut taken = std::mem::take(&mut entry.children);
            taken.append(&mut entry.fragments);
            taken
        })
        .unwrap_or_default()
    }

    /// Destroy `node` and its subtree.
    ///
    /// Returns the reactive bindings that were attached to destroyed nodes;
    /// the caller removes them from the event context.
    pub(crate) fn destroy(&self, node: NodeRef) -> Vec<EventId> {
        let mut events = Vec::new();
        let mut released = Vec::new();

        let root = {
            let mut arena = self.inner.arena.borrow_mut();
            unlink_in(&mut arena, node);
            let Some(root) = arena.remove(node) else {
                return events;
            };

            let mut pending: Vec<NodeRef> = root.children.iter().chain(&root.fragments).copied().collect();
            while let Some(child) = pending.pop() {
                let stable = match arena.get_mut(child) {
                    Some(entry) if entry.stable => {
                        entry.parent = None;
                        true
                    }
                    Some(_) => false,
                    None => continue,
                };
                if stable {
                    continue;
                }
                if let Some(entry) = arena.remove(child) {
                    events.extend(entry.events);
                    released.push(entry.native);
                    pending.extend(entry.children);
                    pending.extend(entry.fragments);
                }
            }
            root
        };

        events.extend(root.events);
        if !root.adopted {
            self.host().remove(root.native);
            self.host().release(root.native);
        }
        for native in released {
            self.host().release(native);
        }
        events
    }
}

fn unlink_in(arena: &mut NodeArena, node: NodeRef) {
    let Some(parent) = arena.get_mut(node).and_then(|entry| entry.parent.take()) else {
        return;
    };
    if let Some(entry) = arena.get_mut(parent) {
        entry.children.retain(|child| *child != node);
        entry.fragments.retain(|member| *member != node);
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.node_count())
            .finish_non_exhaustive()
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
