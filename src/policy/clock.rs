//! Clock: approximate LFU over a ring of vitality counters.
//!
//! Each entry owns one slot of a power-of-two [`ClockRing`]. A slot carries
//! a *vitality* ("lives") counter instead of a reference bit: hits add to
//! it, sweeps subtract from it, and a slot whose vitality reaches zero is
//! reclaimed. The ring is split into contiguous shards, each swept by its
//! own hand, so the cost of one insert is bounded by a shard's width no
//! matter how large the ring is.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                          Clock<K, V, S> Layout                           │
//! │                                                                          │
//! │   store: S   (key -> ClockEntry { value, pos })                          │
//! │                                                                          │
//! │   ring:  ClockRing<K>                                                    │
//! │        hand 0                 hand 1                 hand 2  ...         │
//! │          ▼                      ▼                      ▼                 │
//! │   ┌────┬────┬────┬────┐ ┌────┬────┬────┬────┐ ┌────┬────┬────┬────┐      │
//! │   │ A:3│ B:1│    │ C:9│ │ D:2│ E:2│ F:1│ G:4│ │    │    │ H:1│    │      │
//! │   └────┴────┴────┴────┘ └────┴────┴────┴────┘ └────┴────┴────┴────┘      │
//! │        shard 0                shard 1                shard 2             │
//! │                                                                          │
//! │   entry at pos p in the store  <=>  slot p holds that key                │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! PUT(key, value, boost):
//!   1. key in store: overwrite value, vitality += boost (capped)
//!   2. pick a hand uniformly at random
//!   3. sweep that hand's shard, subtracting `boost` from every live slot,
//!      until a slot is empty or drops to zero (evict its key from the store)
//!   4. slot under the hand is free: occupy it with vitality min(boost, max)
//!      otherwise: one full pass freed nothing, drop the insert (false)
//!
//! VAL(key, boost):
//!   hit: vitality += boost (capped), return value
//! ```
//!
//! ## Performance Characteristics
//!
//! | Operation | Time              | Notes                              |
//! |-----------|-------------------|------------------------------------|
//! | `val`     | O(1)              | Store lookup + counter bump        |
//! | `put`     | O(slots_per_hand) | Worst case one pass over a shard   |
//! | `contains`| O(1)              | Store lookup only                  |
//!
//! ## Example Usage
//!
//! ```
//! use lfukit::policy::clock::Clock;
//! use lfukit::store::HashMapStore;
//!
//! let mut clock = Clock::new(64, HashMapStore::new());
//! assert!(clock.put("a", 1, 1));
//! assert_eq!(clock.val(&"a", 1), Some(&1));
//! assert_eq!(clock.capacity(), 64);
//! ```

use std::marker::PhantomData;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::builder::ClockOptions;
use crate::ds::{ClockRing, Sweep};
use crate::error::InvariantError;
use crate::store::traits::{SearchStore, StoreMut};
use crate::traits::{CursorSearch, FrequencyEngine};

/// Store entry of a [`Clock`]: the value plus the ring slot it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockEntry<V> {
    pub value: V,
    pos: usize,
}

impl<V> ClockEntry<V> {
    /// Ring slot holding this entry's key.
    pub fn pos(&self) -> usize {
        self.pos
    }
}

/// Ring-of-hands approximate LFU backed by a pluggable store.
///
/// # Type Parameters
///
/// - `K`: Key type; a copy lives in the ring, so it must be `Clone`
/// - `V`: Value type
/// - `S`: Store mapping `K` to [`ClockEntry<V>`]
#[derive(Debug)]
pub struct Clock<K, V, S> {
    ring: ClockRing<K>,
    store: S,
    rng: SmallRng,
    _value: PhantomData<V>,
}

impl<K, V, S> Clock<K, V, S>
where
    K: Clone,
    S: StoreMut<K, ClockEntry<V>>,
{
    /// Creates a clock of about `capacity` slots with 256 slots per hand and
    /// a vitality cap of 16.
    pub fn new(capacity: usize, store: S) -> Self {
        Self::with_options(
            &ClockOptions {
                capacity,
                ..ClockOptions::default()
            },
            store,
        )
    }

    /// Creates a clock from explicit options, clamping out-of-range values.
    pub fn with_options(options: &ClockOptions, store: S) -> Self {
        let rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        let ring = ClockRing::new(options.capacity, options.slots_per_hand, options.max_vitality);
        debug!(
            "clock: {} slots, {} hands of {}, vitality cap {}",
            ring.capacity(),
            ring.hand_count(),
            ring.slots_per_hand(),
            ring.max_vitality()
        );
        Self {
            ring,
            store,
            rng,
            _value: PhantomData,
        }
    }

    /// Inserts or updates `key`.
    ///
    /// Returns `false` when the randomly chosen shard is saturated with
    /// entries that survive a full sweep; the insert is dropped.
    pub fn put(&mut self, key: K, value: V, boost: u32) -> bool {
        self.try_put(key, value, boost).is_ok()
    }

    /// Like [`put`](Self::put), but hands the key and value back when the
    /// insert is dropped so the caller can try elsewhere.
    pub fn try_put(&mut self, key: K, value: V, boost: u32) -> Result<(), (K, V)> {
        if let Some(entry) = self.store.get_mut(&key) {
            entry.value = value;
            self.ring.boost(entry.pos, boost);
            return Ok(());
        }

        let hand = self.rng.random_range(0..self.ring.hand_count());
        match self.ring.sweep(hand, boost) {
            Sweep::Evicted(victim) => {
                self.store.remove(&victim);
            },
            Sweep::Saturated => {
                debug!("clock: hand {hand} saturated, dropping insert");
                return Err((key, value));
            },
            Sweep::Free => {},
        }

        match self.ring.occupy(hand, key.clone(), boost) {
            Some(pos) => {
                self.store.set(key, ClockEntry { value, pos });
                Ok(())
            },
            None => Err((key, value)),
        }
    }

    /// Returns the value for `key`, adding `boost` to its vitality on a hit.
    pub fn val(&mut self, key: &K, boost: u32) -> Option<&V> {
        let entry = self.store.get(key)?;
        self.ring.boost(entry.pos, boost);
        Some(&entry.value)
    }

    /// Returns the value without touching vitality.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.store.get(key).map(|entry| &entry.value)
    }

    /// Current vitality of `key`, if cached.
    pub fn vitality(&self, key: &K) -> Option<u32> {
        let entry = self.store.get(key)?;
        self.ring.vitality(entry.pos)
    }

    /// Drops `key` from both the ring and the store.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.store.remove(key)?;
        self.ring.remove(entry.pos);
        Some(entry.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Total slots in the ring (a power of two).
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn hand_count(&self) -> usize {
        self.ring.hand_count()
    }

    pub fn max_vitality(&self) -> u32 {
        self.ring.max_vitality()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached `(key, value)` pairs in the store's order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.store.entries().map(|(key, entry)| (key, &entry.value))
    }

    pub fn clear(&mut self) {
        self.ring.clear();
        self.store.clear();
    }

    /// Verifies the ring and the store describe the same entries.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.ring.check_invariants()?;
        if self.ring.len() != self.store.len() {
            return Err(InvariantError::new(format!(
                "ring holds {} keys, store holds {}",
                self.ring.len(),
                self.store.len()
            )));
        }
        for (pos, key, vitality) in self.ring.iter() {
            if vitality > self.ring.max_vitality() {
                return Err(InvariantError::new(format!(
                    "slot {pos} vitality {vitality} exceeds cap {}",
                    self.ring.max_vitality()
                )));
            }
            match self.store.get(key) {
                Some(entry) if entry.pos == pos => {},
                Some(entry) => {
                    return Err(InvariantError::new(format!(
                        "slot {pos} key maps to slot {} in the store",
                        entry.pos
                    )));
                },
                None => {
                    return Err(InvariantError::new(format!(
                        "slot {pos} key is missing from the store"
                    )));
                },
            }
        }
        Ok(())
    }
}

impl<K, V, S> Clock<K, V, S>
where
    K: Clone,
    S: SearchStore<K, ClockEntry<V>>,
{
    /// Looks `key` up near `cursor`, boosting vitality on a hit.
    pub fn search(
        &mut self,
        key: &K,
        cursor: Option<S::Cursor>,
        boost: u32,
    ) -> (Option<&V>, S::Cursor) {
        let (entry, cursor) = self.store.search(key, cursor);
        match entry {
            Some(entry) => {
                self.ring.boost(entry.pos, boost);
                (Some(&entry.value), cursor)
            },
            None => (None, cursor),
        }
    }
}

impl<K, V, S> FrequencyEngine<K, V> for Clock<K, V, S>
where
    K: Clone,
    S: StoreMut<K, ClockEntry<V>>,
{
    fn put(&mut self, key: K, value: V, boost: u32) -> bool {
        Clock::put(self, key, value, boost)
    }

    fn val(&mut self, key: &K, boost: u32) -> Option<&V> {
        Clock::val(self, key, boost)
    }

    fn contains(&self, key: &K) -> bool {
        Clock::contains(self, key)
    }

    fn len(&self) -> usize {
        Clock::len(self)
    }

    fn capacity(&self) -> usize {
        Clock::capacity(self)
    }

    fn clear(&mut self) {
        Clock::clear(self);
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        Clock::check_invariants(self)
    }
}

impl<K, V, S> CursorSearch<K, V> for Clock<K, V, S>
where
    K: Clone,
    S: SearchStore<K, ClockEntry<V>>,
{
    type Cursor = S::Cursor;

    fn search(&mut self, key: &K, cursor: Option<S::Cursor>, boost: u32) -> (Option<&V>, S::Cursor) {
        Clock::search(self, key, cursor, boost)
    }
}
