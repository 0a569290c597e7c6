// Slot arena - generation-tagged storage behind every Event
//
// Entries live in a Slab, whose vacant list is the free list: a released index
// is handed out again by the next insert (most recently freed first). Slab keys
// never move, so an index is a stable name for a slot for the arena's lifetime.
//
// Each slot also carries a generation counter in a parallel Vec. It starts at 1
// for a brand new slot and is bumped every time the slot is released, so a
// (index, generation) pair names at most one subscription ever stored in this
// arena. Generations are u64 and never wrap in practice.
//
// Entries are shared with in-flight dispatches through Arc. Releasing a slot
// clears the entry's `active` flag before dropping the arena's reference, which
// is how a dispatch running on another thread learns about the removal.

use slab::Slab;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One subscription: the callback plus the generation it was stored under.
pub struct SlotEntry<F: ?Sized> {
    callback: Arc<F>,
    generation: u64,
    active: AtomicBool,
}

impl<F: ?Sized> SlotEntry<F> {
    fn new(callback: Arc<F>, generation: u64) -> Self {
        Self {
            callback,
            generation,
            active: AtomicBool::new(true),
        }
    }

    /// The stored callback
    pub fn callback(&self) -> &F {
        &self.callback
    }

    /// False once the slot holding this entry has been released
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Index-stable storage for subscription entries.
///
/// Not synchronized on its own; `Event` wraps it in a `RwLock`.
pub struct SlotArena<F: ?Sized> {
    entries: Slab<Arc<SlotEntry<F>>>,
    generations: Vec<u64>,
}

impl<F: ?Sized> SlotArena<F> {
    /// Create an empty arena
    pub const fn new() -> Self {
        Self {
            entries: Slab::new(),
            generations: Vec::new(),
        }
    }

    /// Number of active entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Store a callback and return the (index, generation) pair naming it.
    ///
    /// Reuses the most recently released slot if there is one, otherwise
    /// appends a new slot at generation 1.
    pub fn insert(&mut self, callback: Arc<F>) -> (usize, u64) {
        let vacant = self.entries.vacant_entry();
        let index = vacant.key();
        if index < self.generations.len() {
            cov_mark::hit!(slot_recycled);
        } else {
            self.generations.resize(index + 1, 1);
        }
        let generation = self.generations[index];
        vacant.insert(Arc::new(SlotEntry::new(callback, generation)));
        (index, generation)
    }

    /// True if `index` currently holds an active entry stored under `generation`
    pub fn contains(&self, index: usize, generation: u64) -> bool {
        self.entries
            .get(index)
            .is_some_and(|entry| entry.generation == generation && entry.is_active())
    }

    /// Release the slot at `index` if it still holds `generation`.
    ///
    /// Returns false (and changes nothing) for out-of-range indices, vacant
    /// slots and generation mismatches.
    pub fn remove(&mut self, index: usize, generation: u64) -> bool {
        if !self.contains(index, generation) {
            return false;
        }

        let entry = self.entries.remove(index);
        entry.deactivate();
        self.generations[index] += 1;
        true
    }

    /// Release every slot. Generations of occupied slots are bumped so that no
    /// outstanding (index, generation) pair survives.
    #[cfg(any(test, feature = "test-util"))]
    pub fn clear(&mut self) {
        for (index, entry) in self.entries.iter() {
            entry.deactivate();
            self.generations[index] += 1;
        }
        self.entries.clear();
    }

    /// Current generation of `index`, if the slot has ever been allocated
    #[cfg(test)]
    pub fn generation(&self, index: usize) -> Option<u64> {
        self.generations.get(index).copied()
    }

    /// Clone the handles to all active entries in ascending slot order.
    pub fn snapshot(&self) -> Vec<Arc<SlotEntry<F>>> {
        self.entries
            .iter()
            .map(|(_, entry)| Arc::clone(entry))
            .collect()
    }

    /// Build an independent arena holding the same callbacks at the same
    /// indices and generations. Entries are fresh, so releasing a slot in one
    /// arena never deactivates the other's.
    pub fn duplicate(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(index, entry)| {
                let copy = SlotEntry::new(Arc::clone(&entry.callback), entry.generation);
                (index, Arc::new(copy))
            })
            .collect();
        Self {
            entries,
            generations: self.generations.clone(),
        }
    }
}

impl<F: ?Sized> Default for SlotArena<F> {
    fn default() -> Self {
        Self::new()
    }
}
