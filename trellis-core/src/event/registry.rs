//! Slot Registry
//!
//! A sparse table of items addressed by stable ids. Items can be "selected"
//! (marked due) and later drained in one pass. The event context builds its
//! two tables (events and after-effects) on top of this structure.
//!
//! # How the Table Works
//!
//! 1. `append` pushes `(id, item)` at the end of a vector. Ids grow
//!    monotonically, so the vector stays sorted and lookups are a binary
//!    search.
//!
//! 2. `select` moves the item out of its slot into the `selected` map and
//!    leaves a `Selected` marker behind. Selecting twice is harmless.
//!
//! 3. A drain takes the whole `selected` map. While the items are out, their
//!    slots read as "in flight". Each item is either restored under its old
//!    id or released. Selecting an in-flight item marks it, and restoring it
//!    puts it straight back into the due set for the next drain.
//!
//! 4. Erasing leaves a `Vacant` marker. When fewer than half of the slots are
//!    live, vacant markers are compacted away. Ids are never reused, so a
//!    stale id resolves to "not found" and never to a different item.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of an entry in a [`SlotRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    /// An id that is never issued.
    pub const INVALID: SlotId = SlotId(u64::MAX);

    /// Get the raw numeric value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of [`SlotRegistry::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The entry was idle and is now due.
    Selected,
    /// The entry was already due (or is currently being executed).
    AlreadySelected,
    /// No live entry has this id.
    NotFound,
}

impl Selection {
    /// Whether the id referred to a live entry.
    pub fn is_found(self) -> bool {
        !matches!(self, Selection::NotFound)
    }
}

enum Slot<T> {
    Occupied(T),
    /// Item is in the `selected` map, or taken out by a running drain.
    Selected,
    Vacant,
}

/// A sparse, stable-identity collection with selection support.
pub struct SlotRegistry<T> {
    /// Sorted by id.
    items: Vec<(SlotId, Slot<T>)>,

    /// Items that are due, keyed by id.
    selected: BTreeMap<SlotId, T>,

    /// In-flight items selected again before they were restored.
    reselected: BTreeSet<SlotId>,

    /// Number of slots that are not vacant.
    live: usize,

    next_id: u64,
}

impl<T> SlotRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: BTreeMap::new(),
            reselected: BTreeSet::new(),
            live: 0,
            next_id: 0,
        }
    }

    /// Insert an item and return its id.
    pub fn append(&mut self, item: T) -> SlotId {
        let id = SlotId(self.next_id);
        self.next_id += 1;
        debug_assert!(self.next_id != u64::MAX, "slot ids exhausted");

        self.items.push((id, Slot::Occupied(item)));
        self.live += 1;
        id
    }

    fn position(&self, id: SlotId) -> Option<usize> {
        self.items
            .binary_search_by_key(&id, |(slot_id, _)| *slot_id)
            .ok()
    }

    /// Whether `id` refers to a live entry (idle, due, or in flight).
    pub fn contains(&self, id: SlotId) -> bool {
        self.position(id)
            .map(|pos| !matches!(self.items[pos].1, Slot::Vacant))
            .unwrap_or(false)
    }

    /// Whether `id` is due or currently being executed.
    pub fn is_selected(&self, id: SlotId) -> bool {
        self.position(id)
            .map(|pos| matches!(self.items[pos].1, Slot::Selected))
            .unwrap_or(false)
    }

    /// Whether `id` was taken out by a drain and not yet put back.
    pub fn is_in_flight(&self, id: SlotId) -> bool {
        self.is_selected(id) && !self.selected.contains_key(&id)
    }

    /// Borrow an item. Items taken out by a running drain are not visible.
    pub fn get(&self, id: SlotId) -> Option<&T> {
        let pos = self.position(id)?;
        match &self.items[pos].1 {
            Slot::Occupied(item) => Some(item),
            Slot::Selected => self.selected.get(&id),
            Slot::Vacant => None,
        }
    }

    /// Mutably borrow an item.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        let pos = self.position(id)?;
        match &mut self.items[pos].1 {
            Slot::Occupied(item) => Some(item),
            Slot::Selected => self.selected.get_mut(&id),
            Slot::Vacant => None,
        }
    }

    /// Mark an entry as due.
    pub fn select(&mut self, id: SlotId) -> Selection {
        let Some(pos) = self.position(id) else {
            return Selection::NotFound;
        };

        match std::mem::replace(&mut self.items[pos].1, Slot::Selected) {
            Slot::Occupied(item) => {
                self.selected.insert(id, item);
                Selection::Selected
            }
            Slot::Selected if self.selected.contains_key(&id) => Selection::AlreadySelected,
            Slot::Selected => {
                if self.reselected.insert(id) {
                    Selection::Selected
                } else {
                    Selection::AlreadySelected
                }
            }
            Slot::Vacant => {
                self.items[pos].1 = Slot::Vacant;
                Selection::NotFound
            }
        }
    }

    /// Vacate a slot. The inner option is `None` when the item is in flight.
    fn vacate(&mut self, id: SlotId) -> Option<Option<T>> {
        let pos = self.position(id)?;
        let item = match std::mem::replace(&mut self.items[pos].1, Slot::Vacant) {
            Slot::Vacant => return None,
            Slot::Occupied(item) => Some(item),
            Slot::Selected => {
                self.reselected.remove(&id);
                self.selected.remove(&id)
            }
        };
        self.live -= 1;
        Some(item)
    }

    /// Remove an entry. Returns `false` if the id was not live.
    pub fn erase(&mut self, id: SlotId) -> bool {
        let removed = self.vacate(id).is_some();
        if removed {
            self.condense();
        }
        removed
    }

    /// Remove an entry and hand the item back.
    ///
    /// Returns `None` for unknown ids and for items currently taken out by a
    /// drain; in the latter case the slot is still vacated and the drain will
    /// not put the item back.
    pub fn take(&mut self, id: SlotId) -> Option<T> {
        let item = self.vacate(id)?;
        self.condense();
        item
    }

    /// Take every due item out of the table, leaving their slots in flight.
    pub fn take_selected(&mut self) -> Vec<(SlotId, T)> {
        std::mem::take(&mut self.selected).into_iter().collect()
    }

    /// Take a single item out for immediate execution, whether it is due or
    /// idle. Its slot is left in flight.
    pub fn take_for_execution(&mut self, id: SlotId) -> Option<T> {
        let pos = self.position(id)?;
        match std::mem::replace(&mut self.items[pos].1, Slot::Selected) {
            Slot::Occupied(item) => Some(item),
            Slot::Selected => self.selected.remove(&id),
            Slot::Vacant => {
                self.items[pos].1 = Slot::Vacant;
                None
            }
        }
    }

    /// Put an in-flight item back under its id. An item selected while in
    /// flight goes back into the due set.
    ///
    /// Fails (returning the item) when the slot was erased in the meantime.
    pub fn restore(&mut self, id: SlotId, item: T) -> Result<(), T> {
        if !self.is_in_flight(id) {
            return Err(item);
        }
        let Some(pos) = self.position(id) else {
            return Err(item);
        };
        if self.reselected.remove(&id) {
            self.selected.insert(id, item);
        } else {
            self.items[pos].1 = Slot::Occupied(item);
        }
        Ok(())
    }

    /// Release an in-flight slot whose item will not come back.
    pub fn release(&mut self, id: SlotId) -> bool {
        if !self.is_in_flight(id) {
            return false;
        }
        let released = self.vacate(id).is_some();
        self.condense();
        released
    }

    /// Drain all due items through `callback`. Items for which it returns
    /// `true` are kept under the same id, the rest are removed.
    ///
    /// Returns the number of items kept.
    pub fn deselect_all<F>(&mut self, mut callback: F) -> usize
    where
        F: FnMut(SlotId, &mut T) -> bool,
    {
        let mut kept = 0;
        for (id, mut item) in self.take_selected() {
            if callback(id, &mut item) {
                if self.restore(id, item).is_ok() {
                    kept += 1;
                }
            } else {
                self.release(id);
            }
        }
        kept
    }

    /// Drain a single due item through `callback`.
    ///
    /// Returns `false` if the item was not due.
    pub fn deselect<F>(&mut self, id: SlotId, callback: F) -> bool
    where
        F: FnOnce(SlotId, &mut T) -> bool,
    {
        let Some(mut item) = self.selected.remove(&id) else {
            return false;
        };
        if callback(id, &mut item) {
            let _ = self.restore(id, item);
        } else {
            self.release(id);
        }
        true
    }

    /// Remove idle items rejected by `keep` and return them.
    ///
    /// Due and in-flight items are left alone.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<T>
    where
        F: FnMut(SlotId, &T) -> bool,
    {
        let mut removed = Vec::new();
        for (id, slot) in self.items.iter_mut() {
            let reject = matches!(slot, Slot::Occupied(item) if !keep(*id, item));
            if reject {
                if let Slot::Occupied(item) = std::mem::replace(slot, Slot::Vacant) {
                    removed.push(item);
                }
            }
        }
        self.live -= removed.len();
        self.condense();
        removed
    }

    /// Iterate over idle items.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.items.iter().filter_map(|(id, slot)| match slot {
            Slot::Occupied(item) => Some((*id, item)),
            _ => None,
        })
    }

    /// Number of live entries (idle, due, or in flight).
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the registry has no live entries.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of entries currently due, counting in-flight entries that were
    /// selected again.
    pub fn selected_count(&self) -> usize {
        self.selected.len() + self.reselected.len()
    }

    /// Remove everything. Ids keep counting from where they were.
    pub fn clear(&mut self) {
        self.items.clear();
        self.selected.clear();
        self.reselected.clear();
        self.live = 0;
    }

    /// Drop vacant markers once they dominate the storage.
    fn condense(&mut self) {
        if self.live < self.items.len() / 2 {
            self.items.retain(|(_, slot)| !matches!(slot, Slot::Vacant));
        }
    }
}

impl<T> Default for SlotRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SlotRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotRegistry")
            .field("live", &self.live)
            .field("selected", &self.selected.len())
            .field("storage", &self.items.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}


// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
