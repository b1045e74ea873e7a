//! HashMap-backed store.
//!
//! ## Architecture
//! - Entries live in an `FxHashMap<K, E>` for O(1) lookup.
//! - No capacity limit of its own: the owning engine decides when to evict.
//! - Metrics are plain `Cell` counters; the store is single-threaded.
//!
//! ## Example Usage
//! ```rust
//! use lfukit::store::hashmap::HashMapStore;
//! use lfukit::store::traits::{StoreCore, StoreMut};
//!
//! let mut store: HashMapStore<u64, String> = HashMapStore::new();
//! store.set(1, "a".to_string());
//! assert!(store.contains(&1));
//! assert_eq!(store.metrics().inserts, 1);
//! ```
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::store::traits::{StoreCore, StoreCounters, StoreFactory, StoreMetrics, StoreMut};

/// Single-threaded HashMap-backed store.
#[derive(Debug)]
pub struct HashMapStore<K, E> {
    map: FxHashMap<K, E>,
    metrics: StoreCounters,
}

impl<K, E> HashMapStore<K, E>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty store with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            metrics: StoreCounters::default(),
        }
    }
}

impl<K, E> Default for HashMapStore<K, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> StoreCore<K, E> for HashMapStore<K, E>
where
    K: Eq + Hash,
{
    fn get(&self, key: &K) -> Option<&E> {
        match self.map.get(key) {
            Some(entry) => {
                self.metrics.inc_hit();
                Some(entry)
            },
            None => {
                self.metrics.inc_miss();
                None
            },
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &E)> + '_> {
        Box::new(self.map.iter())
    }

    fn metrics(&self) -> StoreMetrics {
        self.metrics.snapshot()
    }
}

impl<K, E> StoreMut<K, E> for HashMapStore<K, E>
where
    K: Eq + Hash,
{
    fn get_mut(&mut self, key: &K) -> Option<&mut E> {
        match self.map.get_mut(key) {
            Some(entry) => {
                self.metrics.inc_hit();
                Some(entry)
            },
            None => {
                self.metrics.inc_miss();
                None
            },
        }
    }

    fn set(&mut self, key: K, entry: E) -> Option<E> {
        let previous = self.map.insert(key, entry);
        if previous.is_some() {
            self.metrics.inc_update();
        } else {
            self.metrics.inc_insert();
        }
        previous
    }

    fn remove(&mut self, key: &K) -> Option<E> {
        let removed = self.map.remove(key);
        if removed.is_some() {
            self.metrics.inc_remove();
        }
        removed
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

/// Builds a fresh [`HashMapStore`] per call, pre-sized to the hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashMapStoreFactory;

impl<K, E> StoreFactory<K, E> for HashMapStoreFactory
where
    K: Eq + Hash,
{
    type Store = HashMapStore<K, E>;

    fn create(&self, capacity_hint: usize) -> Self::Store {
        HashMapStore::with_capacity(capacity_hint)
    }
}
