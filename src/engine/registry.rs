// src/engine/registry.rs

//! Generational slot arena.
//!
//! Async supervisors and open dialogs have no owner other than the event
//! loop that will eventually call back into them. The registry is that
//! owner: an entry lives exactly from `acquire` to `release`.
//!
//! - Free slots are reused first-fit, lowest index first, so repeated
//!   create/destroy cycles never grow the arena.
//! - Every release bumps the slot's generation. A `SlotId` held past its
//!   release (a late pipe event, a double teardown) no longer matches and
//!   is rejected instead of reaching the slot's next occupant.

use std::fmt;

/// Handle to one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    index: usize,
    generation: u64,
}

impl SlotId {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    value: Option<T>,
}

#[derive(Debug)]
pub struct SlotRegistry<T> {
    slots: Vec<Slot<T>>,
    live: usize,
}

impl<T> Default for SlotRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Store `value` in the lowest free slot, growing only when none is free.
    pub fn acquire(&mut self, value: T) -> SlotId {
        self.live += 1;

        if let Some(index) = self.slots.iter().position(|s| s.value.is_none()) {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return SlotId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Free the slot and hand back its value.
    ///
    /// Returns `None` if `id` is stale or was already released, so callers
    /// may release from several code paths without double-freeing.
    pub fn release(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation += 1;
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated (occupied or free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    SlotId {
                        index,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn ids(&self) -> Vec<SlotId> {
        self.iter().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_are_reused_lowest_first() {
        let mut reg = SlotRegistry::new();
        let a = reg.acquire("a");
        let b = reg.acquire("b");
        let c = reg.acquire("c");
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));

        reg.release(c);
        reg.release(a);

        let d = reg.acquire("d");
        assert_eq!(d.index(), 0);
        assert_eq!(d.generation(), 1);
        let e = reg.acquire("e");
        assert_eq!(e.index(), 2);
        assert_eq!(reg.capacity(), 3);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn release_is_idempotent() {
        let mut reg = SlotRegistry::new();
        let a = reg.acquire(1);
        assert_eq!(reg.release(a), Some(1));
        assert_eq!(reg.release(a), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn stale_ids_do_not_reach_the_next_occupant() {
        let mut reg = SlotRegistry::new();
        let old = reg.acquire("old");
        reg.release(old);
        let new = reg.acquire("new");

        assert_eq!(old.index(), new.index());
        assert_eq!(reg.get(old), None);
        assert_eq!(reg.release(old), None);
        assert_eq!(reg.get(new), Some(&"new"));
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut reg = SlotRegistry::new();
        let a = reg.acquire('a');
        let b = reg.acquire('b');
        reg.release(a);
        let ids = reg.ids();
        assert_eq!(ids, vec![b]);
    }
}
