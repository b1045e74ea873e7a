//! Storage capability consumed by the eviction engines.
//!
//! Stores own the key → entry mapping; engines own eviction order. An
//! engine is generic over the store it writes through, so the same
//! [`Clock`](crate::policy::clock::Clock) or [`O1`](crate::policy::o1::O1)
//! runs on a plain hash map or on a [`RangeList`](crate::ds::RangeList)
//! keyed by integer ranges.
//!
//! ## Capability tiers
//!
//! ```text
//!   StoreCore     get / contains / len / entries / metrics      (read)
//!       │
//!   StoreMut      get_mut / set / remove / delete / clear       (write)
//!       │
//!   SearchStore   search(key, cursor) -> (entry, cursor)        (proximity)
//!
//!   StoreFactory  create(capacity_hint) -> Store                (one per shard)
//! ```
//!
//! Only ordered stores implement [`SearchStore`]; a hash map has no notion
//! of "near the previous lookup".

use std::cell::Cell;

/// Snapshot of store-level metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub updates: u64,
    pub removes: u64,
}

/// Metric counters for single-threaded stores.
#[derive(Debug, Default)]
pub(crate) struct StoreCounters {
    hits: Cell<u64>,
    misses: Cell<u64>,
    inserts: Cell<u64>,
    updates: Cell<u64>,
    removes: Cell<u64>,
}

impl StoreCounters {
    pub(crate) fn snapshot(&self) -> StoreMetrics {
        StoreMetrics {
            hits: self.hits.get(),
            misses: self.misses.get(),
            inserts: self.inserts.get(),
            updates: self.updates.get(),
            removes: self.removes.get(),
        }
    }

    pub(crate) fn inc_hit(&self) {
        self.hits.set(self.hits.get() + 1);
    }

    pub(crate) fn inc_miss(&self) {
        self.misses.set(self.misses.get() + 1);
    }

    pub(crate) fn inc_insert(&self) {
        self.inserts.set(self.inserts.get() + 1);
    }

    pub(crate) fn inc_update(&self) {
        self.updates.set(self.updates.get() + 1);
    }

    pub(crate) fn inc_remove(&self) {
        self.removes.set(self.removes.get() + 1);
    }
}

/// Read-side store operations.
pub trait StoreCore<K, E> {
    /// Fetch an entry by key.
    fn get(&self, key: &K) -> Option<&E>;

    /// Check if a key exists.
    fn contains(&self, key: &K) -> bool;

    /// Current number of entries.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every `(key, entry)` pair, in the store's natural order.
    fn entries(&self) -> Box<dyn Iterator<Item = (&K, &E)> + '_>;

    /// Snapshot the store's current metrics.
    fn metrics(&self) -> StoreMetrics {
        StoreMetrics::default()
    }
}

/// Write-side store operations.
pub trait StoreMut<K, E>: StoreCore<K, E> {
    /// Fetch an entry for in-place update.
    fn get_mut(&mut self, key: &K) -> Option<&mut E>;

    /// Insert or replace. Returns the previous entry if there was one.
    fn set(&mut self, key: K, entry: E) -> Option<E>;

    /// Remove an entry by key.
    fn remove(&mut self, key: &K) -> Option<E>;

    /// Remove an entry by key; `false` if it was absent.
    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Remove all entries.
    fn clear(&mut self);
}

/// Stores that can resume a lookup near a previous one.
pub trait SearchStore<K, E>: StoreMut<K, E> {
    /// Opaque position handed back by [`search`](Self::search).
    type Cursor: Copy + std::fmt::Debug;

    /// Looks up `key`, starting near `cursor` when given.
    ///
    /// Always returns a cursor, hit or miss, for the caller's next search.
    fn search(&mut self, key: &K, cursor: Option<Self::Cursor>) -> (Option<&mut E>, Self::Cursor);
}

/// Creates stores for engines that own more than one (one per shard).
pub trait StoreFactory<K, E> {
    type Store: StoreMut<K, E>;

    /// Create a new store expected to hold about `capacity_hint` entries.
    fn create(&self, capacity_hint: usize) -> Self::Store;
}
