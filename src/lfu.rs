//! Ready-made caches: one engine wired to one store.
//!
//! | Facade          | Engine       | Store                  | Keys          |
//! |-----------------|--------------|------------------------|---------------|
//! | `LfuCache`      | `O1`         | `HashMapStore`         | any hashable  |
//! | `RangeLfu`      | `O1`         | `RangeList`            | `i64` points  |
//! | `ClockLfu`      | `MultiClock` | `HashMapStore` / shard | any hashable  |
//! | `RangeClockLfu` | `MultiClock` | `RangeList` / shard    | `i64` points  |
//!
//! Every `get` counts as one access and every `put` credits one. The range
//! facades store values under inclusive `[lo, hi]` ranges and answer point
//! queries; `find` additionally returns a cursor so a run of nearby lookups
//! can resume where the last one ended.
//!
//! ## Example Usage
//!
//! ```
//! use lfukit::lfu::RangeLfu;
//!
//! let mut zones = RangeLfu::new(1024);
//! zones.put(0, 9, "a");
//! zones.put(20, 29, "b");
//! assert_eq!(zones.get(5), Some(&"a"));
//! assert_eq!(zones.get(15), None);
//!
//! let first = zones.find(21, None);
//! assert_eq!(first.value, Some(&"b"));
//! let cursor = first.cursor;
//! let next = zones.find(28, Some(cursor));
//! assert_eq!(next.value, Some(&"b"));
//! ```

use std::hash::Hash;

use crate::builder::{MultiClockOptions, O1Options};
use crate::ds::{Cursor, Range, RangeList};
use crate::error::InvariantError;
use crate::policy::multi_clock::MultiClock;
use crate::policy::o1::{O1, O1Entry};
use crate::store::{HashMapStore, HashMapStoreFactory, RangeListFactory};

/// Result of a cursor-resumable lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found<C, T> {
    /// Pass back into the next `find` to resume near this result.
    pub cursor: C,
    pub value: Option<T>,
}

/// Exact LFU cache keyed by any hashable type.
#[derive(Debug)]
pub struct LfuCache<K, V> {
    engine: O1<K, V, HashMapStore<K, O1Entry<V>>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self::with_options(&O1Options {
            capacity,
            ..O1Options::default()
        })
    }

    pub fn with_options(options: &O1Options) -> Self {
        Self {
            engine: O1::from_factory(options, &HashMapStoreFactory),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.engine.val(key, 1)
    }

    /// Returns `false` if the cache is full and nothing could be evicted.
    pub fn put(&mut self, key: K, value: V) -> bool {
        self.engine.put(key, value, 1)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.engine.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.engine.contains(key)
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.engine.capacity()
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    pub fn engine(&self) -> &O1<K, V, HashMapStore<K, O1Entry<V>>> {
        &self.engine
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.engine.check_invariants()
    }
}

/// Exact LFU cache over disjoint integer ranges.
#[derive(Debug)]
pub struct RangeLfu<V> {
    engine: O1<Range, V, RangeList<O1Entry<V>>>,
}

impl<V> RangeLfu<V> {
    pub fn new(capacity: usize) -> Self {
        Self::with_factory(
            &O1Options {
                capacity,
                ..O1Options::default()
            },
            &RangeListFactory::new(),
        )
    }

    /// Builds the cache with a list produced by `factory`.
    pub fn with_factory(options: &O1Options, factory: &RangeListFactory) -> Self {
        Self {
            engine: O1::from_factory(options, factory),
        }
    }

    /// Value of the range containing `point`.
    pub fn get(&mut self, point: i64) -> Option<&V> {
        self.engine.val(&Range::point(point), 1)
    }

    /// Caches `value` for `[lo, hi]`.
    ///
    /// The range must not overlap a cached range other than one starting in
    /// the same place; a put whose `lo` falls inside a cached range updates
    /// that entry and keeps its bounds. An inverted range (`lo > hi`) is
    /// rejected with `false`.
    pub fn put(&mut self, lo: i64, hi: i64, value: V) -> bool {
        if lo > hi {
            return false;
        }
        self.engine.put(Range::new(lo, hi), value, 1)
    }

    /// Point lookup resuming near `cursor`.
    pub fn find(&mut self, point: i64, cursor: Option<Cursor>) -> Found<Cursor, &V> {
        let (value, cursor) = self.engine.search(&Range::point(point), cursor, 1);
        Found { cursor, value }
    }

    /// Removes the range containing `point`.
    pub fn remove(&mut self, point: i64) -> Option<V> {
        self.engine.remove(&Range::point(point))
    }

    pub fn contains(&self, point: i64) -> bool {
        self.engine.contains(&Range::point(point))
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.engine.capacity()
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    pub fn engine(&self) -> &O1<Range, V, RangeList<O1Entry<V>>> {
        &self.engine
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.engine.check_invariants()?;
        self.engine.store().check_invariants()
    }
}

/// Approximate LFU cache keyed by any hashable type.
pub struct ClockLfu<K, V>
where
    K: Eq + Hash,
{
    engine: MultiClock<K, V, HashMapStoreFactory>,
}

impl<K, V> ClockLfu<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self::with_options(&MultiClockOptions {
            capacity,
            ..MultiClockOptions::default()
        })
    }

    pub fn with_options(options: &MultiClockOptions) -> Self {
        Self {
            engine: MultiClock::with_options(options, HashMapStoreFactory),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.engine.val(key, 1)
    }

    /// Returns `false` once every shard exists and none could free a slot.
    pub fn put(&mut self, key: K, value: V) -> bool {
        self.engine.put(key, value, 1)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.engine.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.engine.contains(key)
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.engine.capacity()
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    pub fn engine(&self) -> &MultiClock<K, V, HashMapStoreFactory> {
        &self.engine
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.engine.check_invariants()
    }
}

impl<K, V> std::fmt::Debug for ClockLfu<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockLfu").field("engine", &self.engine).finish()
    }
}

/// Approximate LFU cache over disjoint integer ranges.
pub struct RangeClockLfu<V> {
    engine: MultiClock<Range, V, RangeListFactory>,
}

impl<V> RangeClockLfu<V> {
    pub fn new(capacity: usize) -> Self {
        Self::with_factory(
            &MultiClockOptions {
                capacity,
                ..MultiClockOptions::default()
            },
            RangeListFactory::new(),
        )
    }

    /// Builds the cache with one list per shard, each produced by `factory`.
    pub fn with_factory(options: &MultiClockOptions, factory: RangeListFactory) -> Self {
        Self {
            engine: MultiClock::with_options(options, factory),
        }
    }

    pub fn get(&mut self, point: i64) -> Option<&V> {
        self.engine.val(&Range::point(point), 1)
    }

    /// Caches `value` for `[lo, hi]`; `false` for an inverted range or when
    /// every shard is saturated.
    pub fn put(&mut self, lo: i64, hi: i64, value: V) -> bool {
        if lo > hi {
            return false;
        }
        self.engine.put(Range::new(lo, hi), value, 1)
    }

    /// Point lookup resuming near `cursor`. The returned cursor is `None`
    /// only when the engine has no shards to search.
    pub fn find(
        &mut self,
        point: i64,
        cursor: Option<Cursor>,
    ) -> Found<Option<Cursor>, &V> {
        let (value, cursor) = self.engine.find(&Range::point(point), cursor, 1);
        Found { cursor, value }
    }

    pub fn remove(&mut self, point: i64) -> Option<V> {
        self.engine.remove(&Range::point(point))
    }

    pub fn contains(&self, point: i64) -> bool {
        self.engine.contains(&Range::point(point))
    }

    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.engine.capacity()
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }

    pub fn engine(&self) -> &MultiClock<Range, V, RangeListFactory> {
        &self.engine
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.engine.check_invariants()?;
        for shard in self.engine.shards() {
            shard.store().check_invariants()?;
        }
        Ok(())
    }
}

impl<V> std::fmt::Debug for RangeClockLfu<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeClockLfu")
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod lfu_cache {
        use super::*;

        #[test]
        fn get_put_and_evict_least_frequent() {
            let mut cache = LfuCache::new(32);
            for k in 0..32u32 {
                assert!(cache.put(k, k * 10));
            }
            for k in 1..32u32 {
                cache.get(&k);
            }
            assert!(cache.put(99, 990));
            assert!(!cache.contains(&0));
            assert_eq!(cache.get(&99), Some(&990));
            assert_eq!(cache.len(), 32);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn put_overwrites() {
            let mut cache = LfuCache::new(64);
            cache.put("k", 1);
            cache.put("k", 2);
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.get(&"k"), Some(&2));
            assert_eq!(cache.remove(&"k"), Some(2));
            assert!(cache.is_empty());
        }
    }

    mod range_lfu {
        use super::*;

        #[test]
        fn point_lookups_hit_covering_range() {
            let mut zones = RangeLfu::new(64);
            zones.put(0, 9, "a");
            zones.put(20, 29, "b");
            assert_eq!(zones.get(0), Some(&"a"));
            assert_eq!(zones.get(9), Some(&"a"));
            assert_eq!(zones.get(25), Some(&"b"));
            assert_eq!(zones.get(15), None);
            assert_eq!(zones.get(-1), None);
            assert_eq!(zones.remove(3), Some("a"));
            assert_eq!(zones.get(5), None);
            zones.check_invariants().unwrap();
        }

        #[test]
        fn inverted_range_is_rejected() {
            let mut zones = RangeLfu::new(64);
            assert!(!zones.put(10, 5, "bad"));
            assert!(zones.is_empty());
            assert_eq!(zones.get(7), None);
            assert!(zones.put(5, 5, "point"));
            assert_eq!(zones.get(5), Some(&"point"));
            zones.check_invariants().unwrap();
        }

        #[test]
        fn find_walks_forward_with_cursor() {
            let mut zones = RangeLfu::with_factory(
                &O1Options {
                    capacity: 512,
                    ..O1Options::default()
                },
                &RangeListFactory::with_seed(4),
            );
            for i in 0..256i64 {
                assert!(zones.put(i * 8, i * 8 + 3, i));
            }
            let mut cursor = None;
            for i in 0..256i64 {
                let hit = zones.find(i * 8 + 2, cursor);
                assert_eq!(hit.value, Some(&i));
                let resume = hit.cursor;
                let miss = zones.find(i * 8 + 5, Some(resume));
                assert_eq!(miss.value, None);
                cursor = Some(miss.cursor);
            }
            zones.check_invariants().unwrap();
        }
    }

    mod clock_lfu {
        use super::*;

        #[test]
        fn owned_string_keys_and_debug() {
            let mut cache: ClockLfu<String, usize> = ClockLfu::new(512);
            for word in ["alpha", "beta", "gamma"] {
                assert!(cache.put(word.to_string(), word.len()));
            }
            assert_eq!(cache.get(&"beta".to_string()), Some(&4));
            assert!(format!("{cache:?}").starts_with("ClockLfu"));
            cache.check_invariants().unwrap();
        }

        #[test]
        fn get_and_put() {
            let mut cache = ClockLfu::new(1024);
            for k in 0..100u64 {
                assert!(cache.put(k, k + 1));
            }
            for k in 0..100u64 {
                assert_eq!(cache.get(&k), Some(&(k + 1)));
            }
            assert!(cache.len() <= cache.capacity());
            assert_eq!(cache.remove(&7), Some(8));
            assert!(!cache.contains(&7));
            cache.check_invariants().unwrap();
            cache.clear();
            assert!(cache.is_empty());
        }
    }

    mod range_clock_lfu {
        use super::*;

        #[test]
        fn inverted_range_is_rejected() {
            let mut zones = RangeClockLfu::new(256);
            assert!(!zones.put(-1, -9, 1));
            assert!(zones.is_empty());
            assert!(zones.put(-9, -1, 2));
            assert_eq!(zones.get(-4), Some(&2));
            zones.check_invariants().unwrap();
        }

        #[test]
        fn find_agrees_with_get() {
            let mut zones = RangeClockLfu::with_factory(
                &MultiClockOptions {
                    capacity: 1024,
                    slots_per_hand: 32,
                    seed: Some(8),
                    ..MultiClockOptions::default()
                },
                RangeListFactory::with_seed(8),
            );
            for i in 0..64i64 {
                assert!(zones.put(i * 100, i * 100 + 49, i));
            }
            let mut cursor = None;
            for i in 0..64i64 {
                let found = zones.find(i * 100 + 10, cursor);
                assert_eq!(found.value, Some(&i));
                cursor = found.cursor;
            }
            assert_eq!(zones.get(60), None);
            zones.check_invariants().unwrap();
        }
    }
}
