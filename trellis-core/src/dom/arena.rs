//! Node Arena
//!
//! Live nodes are stored in a generational arena. A [`NodeRef`] is an index
//! plus the generation of the slot at the time the node was inserted. When a
//! node is destroyed, its slot's generation is bumped, so every outstanding
//! `NodeRef` to it resolves to "not found" from then on, even after the slot
//! is reused.
//!
//! This is the weak back-reference used by reactive bindings: holding a
//! `NodeRef` never keeps a node alive.

use std::fmt;

use smallvec::SmallVec;

use super::host::NativeHandle;
use crate::element::ElementKind;
use crate::event::EventId;

/// Generational handle to a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    index: u32,
    generation: u32,
}

impl NodeRef {
    /// Slot index inside the arena.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot this handle was issued for.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}v{}", self.index, self.generation)
    }
}

/// Bookkeeping for one live node.
#[derive(Debug)]
pub(crate) struct NodeEntry {
    pub native: NativeHandle,
    pub tag: String,
    pub kind: ElementKind,
    pub parent: Option<NodeRef>,

    /// Indexed children, in native order.
    pub children: Vec<NodeRef>,

    /// Nodes materialized straight into this node as fragment members. They
    /// are owned here but do not take part in index-based placement.
    pub fragments: Vec<NodeRef>,

    /// Reactive bindings to tear down with the node.
    pub events: SmallVec<[EventId; 4]>,

    /// Bumped whenever the children are cleared.
    pub epoch: u32,

    /// Stable nodes survive their parent being cleared or destroyed.
    pub stable: bool,

    /// Wraps a host node the core did not create (the body).
    pub adopted: bool,
}

impl NodeEntry {
    pub fn new(native: NativeHandle, tag: String, kind: ElementKind) -> Self {
        Self {
            native,
            tag,
            kind,
            parent: None,
            children: Vec::new(),
            fragments: Vec::new(),
            events: SmallVec::new(),
            epoch: 0,
            stable: false,
            adopted: false,
        }
    }
}

#[derive(Debug)]
struct ArenaSlot {
    generation: u32,
    entry: Option<NodeEntry>,
}

/// Storage for all live nodes of a [`Dom`](super::Dom).
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    slots: Vec<ArenaSlot>,
    free: Vec<u32>,
    live: usize,
}

impl NodeArena {
    pub fn insert(&mut self, entry: NodeEntry) -> NodeRef {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return NodeRef {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(ArenaSlot {
            generation: 0,
            entry: Some(entry),
        });
        NodeRef {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, node: NodeRef) -> Option<NodeEntry> {
        let slot = self.slots.get_mut(node.index as usize)?;
        if slot.generation != node.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index);
        self.live -= 1;
        Some(entry)
    }

    pub fn get(&self, node: NodeRef) -> Option<&NodeEntry> {
        let slot = self.slots.get(node.index as usize)?;
        if slot.generation != node.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn get_mut(&mut self, node: NodeRef) -> Option<&mut NodeEntry> {
        let slot = self.slots.get_mut(node.index as usize)?;
        if slot.generation != node.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.get(node).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(raw: u64) -> NodeEntry {
        NodeEntry::new(NativeHandle::from_raw(raw), "div".to_owned(), ElementKind::Regular)
    }

    #[test]
    fn stale_handle_does_not_resolve_after_reuse() {
        let mut arena = NodeArena::default();
        let first = arena.insert(entry(1));
        assert!(arena.remove(first).is_some());

        let second = arena.insert(entry(2));
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());

        assert!(!arena.contains(first));
        assert!(arena.remove(first).is_none());
        assert_eq!(arena.get(second).map(|e| e.native.raw()), Some(2));
    }

    #[test]
    fn tracks_live_count() {
        let mut arena = NodeArena::default();
        let a = arena.insert(entry(1));
        let _b = arena.insert(entry(2));
        assert_eq!(arena.len(), 2);

        arena.remove(a);
        arena.remove(a);
        assert_eq!(arena.len(), 1);
    }
}
