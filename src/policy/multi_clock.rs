//! MultiClock: capacity that grows by adding whole clocks.
//!
//! A single [`Clock`] bounds the cost of an insert by one shard's width,
//! but a huge ring still means huge shards. `MultiClock` keeps every clock
//! at a fixed size (`slots_per_hand * hands_per_clock`) and allocates more
//! clocks, up to a limit derived from the total capacity, as the cache
//! fills. Each clock owns its own store, created on demand by a
//! [`StoreFactory`].
//!
//! ## Architecture
//!
//! ```text
//!   MultiClock { max_shards = 4 }
//!
//!   order:   [ 1, 0 ]                    (ShardOrder, reshuffled 1 in 2 lookups)
//!
//!   shards:  ┌──────────┐ ┌──────────┐ ┌ ─ ─ ─ ─ ─┐ ┌ ─ ─ ─ ─ ─┐
//!            │ clock 0  │ │ clock 1  │  not yet      not yet
//!            │ store 0  │ │ store 1  │ │allocated │ │allocated │
//!            └──────────┘ └──────────┘  ─ ─ ─ ─ ─    ─ ─ ─ ─ ─
//!
//!   a key lives in at most one shard at a time
//! ```
//!
//! ## Insert path
//!
//! ```text
//! PUT(key, value, boost):
//!   1. key already in some shard          -> update it there
//!   2. down = growth possible ? 0 : boost
//!   3. probe up to probe_budget() shards with put(key, value, down)
//!        accepted and down != boost       -> val(key, boost) on that shard
//!        accepted                         -> true
//!   4. allocate a new shard if allowed    -> put(key, value, boost) there
//!   5. otherwise                          -> false
//! ```
//!
//! While new shards can still be allocated, existing shards are probed
//! without aging (`down = 0`), so incumbents keep their vitality until the
//! cache is genuinely full. The zero-aging insert and the follow-up boost
//! are two separate operations on the shard.

use log::debug;

use crate::builder::{ClockOptions, MultiClockOptions};
use crate::ds::clock_ring::{MAX_CAPACITY, MIN_CAPACITY, bound, nearest_pow2};
use crate::ds::shard::{ShardOrder, probe_budget};
use crate::error::InvariantError;
use crate::policy::clock::{Clock, ClockEntry};
use crate::store::traits::{SearchStore, StoreFactory};
use crate::traits::{CursorSearch, FrequencyEngine};

/// Horizontally sharded [`Clock`] engine.
pub struct MultiClock<K, V, F>
where
    F: StoreFactory<K, ClockEntry<V>>,
{
    shards: Vec<Clock<K, V, F::Store>>,
    order: ShardOrder,
    factory: F,
    // template for every shard; only the seed changes per shard
    shard_options: ClockOptions,
    max_shards: usize,
    seed: Option<u64>,
}

impl<K, V, F> MultiClock<K, V, F>
where
    K: Clone,
    F: StoreFactory<K, ClockEntry<V>>,
{
    /// Creates an engine for about `capacity` entries with default shard
    /// geometry (2 hands of 256 slots, vitality cap 32).
    pub fn new(capacity: usize, factory: F) -> Self {
        Self::with_options(
            &MultiClockOptions {
                capacity,
                ..MultiClockOptions::default()
            },
            factory,
        )
    }

    /// Creates an engine from explicit options. Zero-sized geometry is
    /// raised to one; use [`MultiClockOptions::validate`] to reject it.
    pub fn with_options(options: &MultiClockOptions, factory: F) -> Self {
        let slots_per_hand = options.slots_per_hand.max(1);
        let hands_per_clock = options.hands_per_clock.max(1);
        // the ring each shard actually gets
        let clock_capacity = nearest_pow2(bound(
            slots_per_hand.saturating_mul(hands_per_clock),
            MIN_CAPACITY,
            MAX_CAPACITY,
        ));
        let total_capacity = nearest_pow2(options.capacity);
        let max_shards = ((total_capacity as f64 / clock_capacity as f64).round() as usize).max(1);

        let order = match options.seed {
            Some(seed) => ShardOrder::with_seed(seed),
            None => ShardOrder::new(),
        };
        let mut engine = Self {
            shards: Vec::with_capacity(max_shards),
            order,
            factory,
            shard_options: ClockOptions {
                capacity: clock_capacity,
                slots_per_hand,
                max_vitality: options.max_vitality,
                seed: None,
            },
            max_shards,
            seed: options.seed,
        };
        engine.expand();
        debug!(
            "multi clock: total {total_capacity}, up to {max_shards} shards of {clock_capacity}"
        );
        engine
    }

    /// `true` while another shard may still be allocated.
    pub fn expandable(&self) -> bool {
        self.shards.len() < self.max_shards
    }

    fn expand(&mut self) -> Option<usize> {
        if !self.expandable() {
            debug!("multi clock: cannot expand past {} shards", self.shards.len());
            return None;
        }
        let index = self.shards.len();
        let options = ClockOptions {
            seed: self.seed.map(|seed| seed.wrapping_add(index as u64 + 1)),
            ..self.shard_options.clone()
        };
        let store = self.factory.create(options.capacity);
        self.shards.push(Clock::with_options(&options, store));
        self.order.push();
        debug!("multi clock: allocated shard {}/{}", index + 1, self.max_shards);
        Some(index)
    }

    /// Shard currently holding `key`, probing in shuffled order.
    fn locate(&mut self, key: &K) -> Option<usize> {
        self.order.maybe_shuffle();
        let shards = &self.shards;
        self.order.iter().find(|&i| shards[i].contains(key))
    }

    /// Inserts or updates `key`; `false` once every shard is allocated and
    /// none of the probed shards could free a slot.
    pub fn put(&mut self, key: K, value: V, boost: u32) -> bool {
        if let Some(i) = self.locate(&key) {
            return self.shards[i].put(key, value, boost);
        }

        let expandable = self.expandable();
        let down = if expandable { 0 } else { boost };
        let probes = probe_budget(self.max_shards, expandable).min(self.order.len());
        let lookup = key.clone();
        let (mut key, mut value) = (key, value);
        for n in 0..probes {
            let Some(i) = self.order.at(n) else {
                break;
            };
            match self.shards[i].try_put(key, value, down) {
                Ok(()) => {
                    if down != boost {
                        self.shards[i].val(&lookup, boost);
                    }
                    return true;
                },
                Err(rejected) => (key, value) = rejected,
            }
        }

        match self.expand() {
            Some(i) => self.shards[i].put(key, value, boost),
            None => {
                debug!("multi clock: {probes} shards saturated, dropping insert");
                false
            },
        }
    }

    /// Returns the value for `key`, boosting its vitality in whichever shard
    /// holds it.
    pub fn val(&mut self, key: &K, boost: u32) -> Option<&V> {
        self.xval(key, boost).map(|(_, value)| value)
    }

    /// Same as [`val`](Self::val).
    pub fn search(&mut self, key: &K, boost: u32) -> Option<&V> {
        self.val(key, boost)
    }

    /// Like [`val`](Self::val), also reporting the shard index of the hit.
    pub fn xval(&mut self, key: &K, boost: u32) -> Option<(usize, &V)> {
        let i = self.locate(key)?;
        self.shards[i].val(key, boost).map(|value| (i, value))
    }

    /// Returns the value without touching vitality.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.shards.iter().find_map(|shard| shard.peek(key))
    }

    /// Drops `key` from whichever shard holds it.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.shards.iter_mut().find_map(|shard| shard.remove(key))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.shards.iter().any(|shard| shard.contains(key))
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(Clock::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Clock::is_empty)
    }

    /// Capacity once every shard is allocated.
    pub fn capacity(&self) -> usize {
        self.max_shards * self.shards[0].capacity()
    }

    /// Shards allocated so far.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn max_shards(&self) -> usize {
        self.max_shards
    }

    pub fn shards(&self) -> &[Clock<K, V, F::Store>] {
        &self.shards
    }

    /// Cached `(key, value)` pairs, shard by shard.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.shards.iter().flat_map(|shard| shard.iter())
    }

    /// Drops every entry and releases every shard but the first.
    pub fn clear(&mut self) {
        self.shards.truncate(1);
        self.shards[0].clear();
        self.order.clear();
        self.order.push();
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.shards.is_empty() || self.shards.len() > self.max_shards {
            return Err(InvariantError::new(format!(
                "{} shards allocated, limit {}",
                self.shards.len(),
                self.max_shards
            )));
        }
        if self.order.len() != self.shards.len() {
            return Err(InvariantError::new(format!(
                "probe order covers {} of {} shards",
                self.order.len(),
                self.shards.len()
            )));
        }
        for (i, shard) in self.shards.iter().enumerate() {
            shard.check_invariants()?;
            for (key, _) in shard.iter() {
                if let Some(j) = (0..self.shards.len()).find(|&j| j != i && self.shards[j].contains(key)) {
                    return Err(InvariantError::new(format!(
                        "key present in shards {i} and {j}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<K, V, F> MultiClock<K, V, F>
where
    K: Clone,
    F: StoreFactory<K, ClockEntry<V>>,
    F::Store: SearchStore<K, ClockEntry<V>>,
{
    /// Cursor-resumable lookup across shards.
    ///
    /// The cursor is tried against each shard's store in probe order; the
    /// returned cursor belongs to the shard that answered (or the last one
    /// probed on a miss). Other shards read it as a foreign cursor, which
    /// only changes where their descent starts.
    pub fn find(
        &mut self,
        key: &K,
        cursor: Option<<F::Store as SearchStore<K, ClockEntry<V>>>::Cursor>,
        boost: u32,
    ) -> (Option<&V>, Option<<F::Store as SearchStore<K, ClockEntry<V>>>::Cursor>) {
        self.order.maybe_shuffle();
        let mut last = cursor;
        let mut hit = None;
        for i in self.order.iter() {
            let (found, next) = self.shards[i].search(key, cursor, 0);
            last = Some(next);
            if found.is_some() {
                hit = Some(i);
                break;
            }
        }
        match hit {
            Some(i) => {
                let (value, next) = self.shards[i].search(key, last, boost);
                (value, Some(next))
            },
            None => (None, last),
        }
    }
}

impl<K, V, F> FrequencyEngine<K, V> for MultiClock<K, V, F>
where
    K: Clone,
    F: StoreFactory<K, ClockEntry<V>>,
{
    fn put(&mut self, key: K, value: V, boost: u32) -> bool {
        MultiClock::put(self, key, value, boost)
    }

    fn val(&mut self, key: &K, boost: u32) -> Option<&V> {
        MultiClock::val(self, key, boost)
    }

    fn contains(&self, key: &K) -> bool {
        MultiClock::contains(self, key)
    }

    fn len(&self) -> usize {
        MultiClock::len(self)
    }

    fn capacity(&self) -> usize {
        MultiClock::capacity(self)
    }

    fn clear(&mut self) {
        MultiClock::clear(self);
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        MultiClock::check_invariants(self)
    }
}

impl<K, V, F> CursorSearch<K, V> for MultiClock<K, V, F>
where
    K: Clone,
    F: StoreFactory<K, ClockEntry<V>>,
    F::Store: SearchStore<K, ClockEntry<V>>,
{
    type Cursor = Option<<F::Store as SearchStore<K, ClockEntry<V>>>::Cursor>;

    fn search(&mut self, key: &K, cursor: Option<Self::Cursor>, boost: u32) -> (Option<&V>, Self::Cursor) {
        MultiClock::find(self, key, cursor.flatten(), boost)
    }
}

impl<K, V, F> std::fmt::Debug for MultiClock<K, V, F>
where
    F: StoreFactory<K, ClockEntry<V>>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiClock")
            .field("shards", &self.shards.len())
            .field("max_shards", &self.max_shards)
            .field("shard_options", &self.shard_options)
            .finish()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::store::HashMapStoreFactory;
    use proptest::prelude::*;

    proptest! {
        /// A key is never held by two shards, whatever the mix of puts,
        /// lookups and removals.
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_keys_live_in_one_shard(
            seed in any::<u64>(),
            ops in prop::collection::vec((0u8..3, 0u64..300, 0u32..4), 0..500)
        ) {
            let mut engine: MultiClock<u64, u64, _> = MultiClock::with_options(
                &MultiClockOptions {
                    capacity: 256,
                    slots_per_hand: 16,
                    hands_per_clock: 2,
                    max_vitality: 8,
                    seed: Some(seed),
                },
                HashMapStoreFactory,
            );
            for (op, key, boost) in ops {
                match op {
                    0 => {
                        engine.put(key, key, boost);
                    },
                    1 => {
                        engine.val(&key, boost);
                    },
                    _ => {
                        engine.remove(&key);
                    },
                }
                prop_assert!(engine.len() <= engine.capacity());
            }
            prop_assert!(engine.check_invariants().is_ok());
        }
    }
}
