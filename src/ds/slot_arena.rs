//! Generational slot arena.
//!
//! Backs every linked structure in the crate (frequency bucket lists, skip
//! list levels). Links are plain [`SlotId`] values instead of pointers, so a
//! node that is reachable from several lists or levels is still owned by
//! exactly one arena slot.
//!
//! Each slot carries a generation that is bumped when the slot is freed. A
//! `SlotId` captured before the free no longer resolves, which is what lets
//! [`RangeList`](crate::ds::RangeList) treat stale cursors as "start from the
//! head" instead of following a recycled node.
//!
//! ```text
//!   slots:  [ g0: A ] [ g2: -- ] [ g0: C ] [ g1: D ]
//!   free:   [ 1 ]
//!
//!   SlotId { index: 1, generation: 1 } -> None (freed, now g2)
//!   SlotId { index: 3, generation: 1 } -> Some(D)
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    /// Id that no arena ever hands out; used before real links exist.
    pub(crate) const DANGLING: SlotId = SlotId {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Position of the slot inside the arena.
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Stores `value` and returns its id, reusing a freed slot if one exists.
    pub fn insert(&mut self, value: T) -> SlotId {
        let index = match self.free_list.pop() {
            Some(index) => {
                self.slots[index as usize].value = Some(value);
                index
            },
            None => {
                let index = u32::try_from(self.slots.len()).expect("slot arena exceeded u32 slots");
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                index
            },
        };
        self.len += 1;
        SlotId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Frees the slot behind `id`; later lookups with the same id miss.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every value. Generations survive so old ids stay dead.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index as u32);
        }
        self.free_list.reverse();
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arena_insert_get_remove() {
        let mut arena = SlotArena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert!(!arena.contains(a));
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn slot_arena_stale_id_misses_after_reuse() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn slot_arena_clear_invalidates_ids() {
        let mut arena = SlotArena::with_capacity(4);
        let ids: Vec<_> = (0..4).map(|i| arena.insert(i)).collect();
        arena.clear();
        assert!(arena.is_empty());
        assert!(ids.iter().all(|&id| !arena.contains(id)));
        let fresh = arena.insert(9);
        assert_eq!(fresh.index(), 0);
        assert_eq!(arena.iter().count(), 1);
    }
}
