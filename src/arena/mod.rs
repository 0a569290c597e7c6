// Arena-based storage for subscription entries
//
// Each Event owns one SlotArena behind a parking_lot RwLock. The arena hands
// out (index, generation) pairs that Subscription handles carry around; the
// Event checks them against the arena before touching a slot.

pub mod slot_arena;

pub use slot_arena::SlotArena;
