//! Multi-hand clock ring with per-slot vitality.
//!
//! A power-of-two array of slots split into equal, disjoint shards, one per
//! hand. Each occupied slot holds a key and a vitality counter. A sweep
//! started from a hand walks forward inside that hand's shard only, aging
//! every live slot it passes, and stops at the first slot that is empty or
//! whose vitality reaches zero.
//!
//! ## Architecture
//!
//! ```text
//!   capacity = 8, hands = 2, slots_per_hand = 4
//!
//!            shard 0                      shard 1
//!   ┌──────┬──────┬──────┬──────┐┌──────┬──────┬──────┬──────┐
//!   │ A:3  │ B:1  │  --  │ C:16 ││ D:2  │ E:5  │ F:1  │ G:4  │
//!   └──────┴──────┴──────┴──────┘└──────┴──────┴──────┴──────┘
//!              ▲                                  ▲
//!            hand 0                             hand 1
//!
//!   sweep(hand 0, decrement 1):
//!     B: 1 - 1 = 0  -> evict B, slot 1 is free, hand stays on it
//!
//!   sweep(hand 1, decrement 1):
//!     F: 1 - 1 = 0  -> evict F
//! ```
//!
//! ## Bounded cost
//!
//! A sweep never leaves its shard and never visits a slot twice, so the
//! worst case is exactly `slots_per_hand` probes no matter how large the
//! ring is. When every probe leaves a survivor the sweep reports
//! [`Sweep::Saturated`] and the caller drops the insert.
//!
//! ## Notes
//! - The ring never looks keys up; a store maps keys to slot positions.
//! - `check_invariants()` verifies occupancy, hand bounds and the vitality cap.

use log::trace;

use crate::error::InvariantError;

/// Smallest ring the constructors will build.
pub const MIN_CAPACITY: usize = 1 << 5;
/// Largest ring the constructors will build.
pub const MAX_CAPACITY: usize = 1 << 30;
/// Lower bound of the vitality cap.
pub const MIN_VITALITY: u32 = 1;
/// Upper bound of the vitality cap.
pub const MAX_VITALITY: u32 = 1 << 14;
/// Every ring has at least this many hands.
pub const MIN_HANDS: usize = 2;

/// Clamps `n` into `[min, max)`; values at or above `max` become `max - 1`.
pub(crate) fn bound<T>(n: T, min: T, max: T) -> T
where
    T: PartialOrd + Copy + std::ops::Sub<Output = T> + From<u8>,
{
    if n < min {
        min
    } else if n >= max {
        max - T::from(1)
    } else {
        n
    }
}

/// Rounds `n` to the nearest power of two (`2^round(log2(n))`).
pub(crate) fn nearest_pow2(n: usize) -> usize {
    let n = n.max(1);
    let exp = (n as f64).log2().round() as u32;
    1usize << exp.min(usize::BITS - 1)
}

/// Outcome of a single bounded sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sweep<K> {
    /// The hand already rests on an empty slot.
    Free,
    /// A slot ran out of vitality; its key is returned and the slot is empty.
    Evicted(K),
    /// One full pass over the shard freed nothing.
    Saturated,
}

#[derive(Debug)]
struct Slot<K> {
    key: K,
    vitality: u32,
}

/// Fixed-size ring of vitality slots swept by independent hands.
#[derive(Debug)]
pub struct ClockRing<K> {
    slots: Vec<Option<Slot<K>>>,
    // offset of each hand inside its own shard
    hands: Vec<usize>,
    slots_per_hand: usize,
    max_vitality: u32,
    len: usize,
}

impl<K> ClockRing<K> {
    /// Creates a ring of roughly `capacity` slots.
    ///
    /// `capacity` is clamped to `[2^5, 2^30]` and rounded to the nearest power
    /// of two; `slots_per_hand` is rounded the same way and used to derive
    /// the hand count, which is never below two. `max_vitality` is clamped to
    /// `[1, 2^14)`.
    ///
    /// # Example
    ///
    /// ```
    /// use lfukit::ds::ClockRing;
    ///
    /// let ring: ClockRing<u64> = ClockRing::new(1000, 256, 16);
    /// assert_eq!(ring.capacity(), 1024);
    /// assert_eq!(ring.hand_count(), 4);
    /// assert_eq!(ring.slots_per_hand(), 256);
    /// ```
    pub fn new(capacity: usize, slots_per_hand: usize, max_vitality: u32) -> Self {
        let capacity = nearest_pow2(bound(capacity, MIN_CAPACITY, MAX_CAPACITY));
        let per_hand = nearest_pow2(slots_per_hand);
        let hand_count = ((capacity as f64 / per_hand as f64).round() as usize).max(MIN_HANDS);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            hands: vec![0; hand_count],
            slots_per_hand: capacity / hand_count,
            max_vitality: bound(max_vitality, MIN_VITALITY, MAX_VITALITY),
            len: 0,
        }
    }

    /// Total number of slots (always a power of two).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    /// Width of each hand's shard.
    pub fn slots_per_hand(&self) -> usize {
        self.slots_per_hand
    }

    pub fn max_vitality(&self) -> u32 {
        self.max_vitality
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute slot position `hand` currently rests on.
    ///
    /// Out-of-range hands are clamped to the last hand.
    pub fn head(&self, hand: usize) -> usize {
        let hand = hand.min(self.hands.len() - 1);
        hand * self.slots_per_hand + self.hands[hand]
    }

    fn advance(&mut self, hand: usize) {
        self.hands[hand] = (self.hands[hand] + 1) % self.slots_per_hand;
    }

    /// Ages the shard of `hand` until a slot frees up or one pass completes.
    ///
    /// Every live slot visited loses `decrement` vitality; the first one to
    /// reach zero is evicted and the hand stays on it. A `decrement` of zero
    /// only finds slots that are already empty or already at zero vitality.
    ///
    /// # Example
    ///
    /// ```
    /// use lfukit::ds::{ClockRing, Sweep};
    ///
    /// let mut ring = ClockRing::new(32, 16, 4);
    /// assert_eq!(ring.sweep(0, 1), Sweep::Free);
    /// let pos = ring.occupy(0, "a", 1).unwrap();
    /// assert_eq!(pos, 0);
    ///
    /// // walk the hand back around to "a" by filling the rest of the shard
    /// for _ in 1..16 {
    ///     assert_eq!(ring.sweep(0, 0), Sweep::Free);
    ///     ring.occupy(0, "filler", 8).unwrap();
    /// }
    /// assert_eq!(ring.sweep(0, 1), Sweep::Evicted("a"));
    /// ```
    pub fn sweep(&mut self, hand: usize, decrement: u32) -> Sweep<K> {
        let hand = hand.min(self.hands.len() - 1);
        let start = self.head(hand);
        loop {
            let pos = self.head(hand);
            match self.slots[pos].as_mut() {
                None => return Sweep::Free,
                Some(slot) => {
                    slot.vitality = slot.vitality.saturating_sub(decrement);
                    if slot.vitality == 0 {
                        let slot = self.slots[pos].take().expect("occupied slot missing");
                        self.len -= 1;
                        trace!("clock ring: hand {hand} freed slot {pos}");
                        return Sweep::Evicted(slot.key);
                    }
                },
            }
            self.advance(hand);
            if self.head(hand) == start {
                trace!("clock ring: hand {hand} completed a pass without a free slot");
                return Sweep::Saturated;
            }
        }
    }

    /// Places `key` in the slot under `hand` if that slot is empty.
    ///
    /// The stored vitality is `min(vitality, max_vitality)`. On success the
    /// hand moves past the new entry and the slot position is returned.
    pub fn occupy(&mut self, hand: usize, key: K, vitality: u32) -> Option<usize> {
        let hand = hand.min(self.hands.len() - 1);
        let pos = self.head(hand);
        if self.slots[pos].is_some() {
            return None;
        }
        self.slots[pos] = Some(Slot {
            key,
            vitality: vitality.min(self.max_vitality),
        });
        self.len += 1;
        self.advance(hand);
        Some(pos)
    }

    /// Adds `amount` to the vitality at `pos`, capped at `max_vitality`.
    pub fn boost(&mut self, pos: usize, amount: u32) -> Option<u32> {
        let cap = self.max_vitality;
        let slot = self.slots.get_mut(pos)?.as_mut()?;
        slot.vitality = slot.vitality.saturating_add(amount).min(cap);
        Some(slot.vitality)
    }

    pub fn vitality(&self, pos: usize) -> Option<u32> {
        self.slots.get(pos)?.as_ref().map(|slot| slot.vitality)
    }

    pub fn key(&self, pos: usize) -> Option<&K> {
        self.slots.get(pos)?.as_ref().map(|slot| &slot.key)
    }

    /// Empties the slot at `pos` and returns its key.
    pub fn remove(&mut self, pos: usize) -> Option<K> {
        let slot = self.slots.get_mut(pos)?.take()?;
        self.len -= 1;
        Some(slot.key)
    }

    /// Empties every slot and parks all hands at the start of their shard.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.hands.iter_mut().for_each(|hand| *hand = 0);
        self.len = 0;
    }

    /// Occupied slots as `(position, key, vitality)` in ring order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &K, u32)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.as_ref().map(|s| (pos, &s.key, s.vitality)))
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if !self.capacity().is_power_of_two() {
            return Err(InvariantError::new(format!(
                "ring capacity {} is not a power of two",
                self.capacity()
            )));
        }
        if self.hands.len() < MIN_HANDS || self.hands.len() * self.slots_per_hand != self.capacity() {
            return Err(InvariantError::new(format!(
                "{} hands of {} slots do not tile a ring of {}",
                self.hands.len(),
                self.slots_per_hand,
                self.capacity()
            )));
        }
        if let Some(hand) = self.hands.iter().position(|&h| h >= self.slots_per_hand) {
            return Err(InvariantError::new(format!("hand {hand} left its shard")));
        }
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();
        if occupied != self.len {
            return Err(InvariantError::new(format!(
                "len {} but {} occupied slots",
                self.len, occupied
            )));
        }
        if let Some((pos, _, vitality)) = self.iter().find(|&(_, _, v)| v > self.max_vitality) {
            return Err(InvariantError::new(format!(
                "slot {pos} vitality {vitality} exceeds cap {}",
                self.max_vitality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_ring_shape_is_normalized() {
        let ring: ClockRing<u32> = ClockRing::new(1, 256, 16);
        assert_eq!(ring.capacity(), 32);
        assert_eq!(ring.hand_count(), 2);
        assert_eq!(ring.slots_per_hand(), 16);

        let ring: ClockRing<u32> = ClockRing::new(3000, 100, 0);
        assert_eq!(ring.capacity(), 4096);
        // 100 rounds to 128 slots per hand
        assert_eq!(ring.hand_count(), 32);
        assert_eq!(ring.slots_per_hand(), 128);
        assert_eq!(ring.max_vitality(), MIN_VITALITY);

        let ring: ClockRing<u32> = ClockRing::new(64, 8, u32::MAX);
        assert_eq!(ring.max_vitality(), MAX_VITALITY - 1);
        ring.check_invariants().unwrap();
    }

    #[test]
    fn clock_ring_hands_start_at_shard_bases() {
        let ring: ClockRing<u32> = ClockRing::new(64, 16, 4);
        assert_eq!(ring.hand_count(), 4);
        for hand in 0..4 {
            assert_eq!(ring.head(hand), hand * 16);
        }
        // out-of-range hand clamps to the last one
        assert_eq!(ring.head(99), 48);
    }

    #[test]
    fn clock_ring_occupy_advances_hand() {
        let mut ring = ClockRing::new(32, 16, 4);
        assert_eq!(ring.occupy(1, "a", 2), Some(16));
        assert_eq!(ring.head(1), 17);
        assert_eq!(ring.key(16), Some(&"a"));
        assert_eq!(ring.vitality(16), Some(2));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn clock_ring_occupy_caps_vitality() {
        let mut ring = ClockRing::new(32, 16, 4);
        let pos = ring.occupy(0, "a", 100).unwrap();
        assert_eq!(ring.vitality(pos), Some(4));
        assert_eq!(ring.boost(pos, 100), Some(4));
    }

    #[test]
    fn clock_ring_sweep_saturates_after_one_pass() {
        let mut ring = ClockRing::new(32, 16, 8);
        for i in 0..16 {
            assert_eq!(ring.sweep(0, 0), Sweep::Free);
            ring.occupy(0, i, 8).unwrap();
        }
        let before = ring.head(0);
        assert_eq!(ring.sweep(0, 1), Sweep::Saturated);
        assert_eq!(ring.head(0), before);
        assert!(ring.iter().all(|(_, _, v)| v == 7));
        ring.check_invariants().unwrap();
    }

    #[test]
    fn clock_ring_sweep_evicts_first_exhausted_slot() {
        let mut ring = ClockRing::new(32, 16, 8);
        for i in 0..16u32 {
            ring.occupy(0, i, if i == 5 { 1 } else { 3 }).unwrap();
        }
        assert_eq!(ring.sweep(0, 1), Sweep::Evicted(5));
        assert_eq!(ring.head(0), 5);
        assert_eq!(ring.len(), 15);
        // slots 0..5 were aged on the way
        for pos in 0..5 {
            assert_eq!(ring.vitality(pos), Some(2));
        }
        assert_eq!(ring.vitality(6), Some(3));
    }

    #[test]
    fn clock_ring_zero_vitality_slot_is_reclaimed_without_aging() {
        let mut ring = ClockRing::new(32, 16, 8);
        ring.occupy(0, "zero", 0).unwrap();
        for _ in 1..16 {
            ring.occupy(0, "live", 3).unwrap();
        }
        assert_eq!(ring.sweep(0, 0), Sweep::Evicted("zero"));
    }

    #[test]
    fn clock_ring_shards_are_independent() {
        let mut ring = ClockRing::new(32, 16, 8);
        for _ in 0..16 {
            ring.occupy(0, "left", 8).unwrap();
        }
        assert_eq!(ring.sweep(0, 1), Sweep::Saturated);
        assert_eq!(ring.sweep(1, 1), Sweep::Free);
        assert_eq!(ring.occupy(1, "right", 1), Some(16));
    }

    #[test]
    fn clock_ring_remove_and_clear() {
        let mut ring = ClockRing::new(32, 16, 8);
        let pos = ring.occupy(0, "a", 1).unwrap();
        ring.occupy(1, "b", 1).unwrap();
        assert_eq!(ring.remove(pos), Some("a"));
        assert_eq!(ring.remove(pos), None);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.head(1), 16);
        ring.check_invariants().unwrap();
    }

    #[test]
    fn helpers_round_and_bound() {
        assert_eq!(nearest_pow2(0), 1);
        assert_eq!(nearest_pow2(3), 4);
        assert_eq!(nearest_pow2(5), 4);
        assert_eq!(nearest_pow2(6), 8);
        assert_eq!(bound(0usize, 4, 128), 4);
        assert_eq!(bound(500usize, 4, 128), 127);
        assert_eq!(bound(16usize, 4, 128), 16);
    }
}
