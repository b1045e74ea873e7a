//! O1: constant-time LFU over frequency-class buckets.
//!
//! Every entry's node sits in exactly one of `max_frequency` doubly linked
//! lists ([`FrequencyBuckets`]), chosen by its clamped access count. Hits
//! move the node to the front of its new class; nothing is ever sorted.
//! Think of it as S4LRU with a configurable number of segments.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          O1<K, V, S> Layout                          │
//! │                                                                      │
//! │   store: S  (key -> O1Entry { value, node, freq })                   │
//! │                                                                      │
//! │   buckets: FrequencyBuckets<K>                                       │
//! │     class 0   [H]─► E ─► D ─►[T]      freq 1       <- victims here   │
//! │     class 1   [H]─► A ─►[T]           freq 2                         │
//! │     class 2   [H]─► C ─► B ─►[T]      freq 3                         │
//! │     ...                                                              │
//! │     class 15  [H]─►[T]                freq >= 16                     │
//! │                                                                      │
//! │   invariant: class(entry) == clamp(freq - 1, 0, max_frequency - 1)   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction
//!
//! ```text
//! PUT(new key, freq f) at capacity:
//!   1. age down: for class c in 1..max_frequency (ascending)
//!        pop the oldest node of c, relink it at the front of clamp(c - f)
//!   2. evict:    pop the oldest node of class 0; none -> put fails
//!   3. insert:   push the new node at the front of class(f)
//! ```
//!
//! Step 1 costs O(max_frequency) rather than O(n): only the tail of each
//! class is aged, which is enough to keep stale high-frequency entries from
//! living forever. A demoted entry's frequency is reset to match its new
//! class.
//!
//! ## Performance Characteristics
//!
//! | Operation | Time              | Notes                              |
//! |-----------|-------------------|------------------------------------|
//! | `val`     | O(1)              | Store lookup + list relink         |
//! | `put`     | O(max_frequency)  | Only when evicting, otherwise O(1) |
//! | `search`  | store-dependent   | O(log d) on a `RangeList` store    |
//!
//! ## Example Usage
//!
//! ```
//! use lfukit::policy::o1::O1;
//! use lfukit::store::HashMapStore;
//!
//! let mut cache = O1::new(32, HashMapStore::new());
//! cache.put("a", 1, 1);
//! assert_eq!(cache.val(&"a", 1), Some(&1));
//! assert_eq!(cache.frequency(&"a"), Some(2));
//! ```

use std::marker::PhantomData;

use log::{debug, trace};

use crate::builder::O1Options;
use crate::ds::FrequencyBuckets;
use crate::ds::clock_ring::bound;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;
use crate::store::traits::{SearchStore, StoreFactory, StoreMut};
use crate::traits::{CursorSearch, FrequencyEngine};

/// Smallest capacity an O1 cache is built with.
pub const MIN_CAPACITY: usize = 1 << 5;
/// Largest capacity an O1 cache is built with.
pub const MAX_CAPACITY: usize = 1 << 30;
/// Fewest frequency classes.
pub const MIN_FREQUENCY: usize = 1 << 2;
/// Most frequency classes.
pub const MAX_FREQUENCY: usize = 1 << 7;

/// Store entry of an [`O1`] cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct O1Entry<V> {
    pub value: V,
    node: SlotId,
    freq: u64,
}

impl<V> O1Entry<V> {
    /// Accumulated access count (unbounded, unlike the class index).
    pub fn freq(&self) -> u64 {
        self.freq
    }
}

/// Exact constant-time LFU backed by a pluggable store.
#[derive(Debug)]
pub struct O1<K, V, S> {
    buckets: FrequencyBuckets<K>,
    store: S,
    capacity: usize,
    _value: PhantomData<V>,
}

impl<K, V, S> O1<K, V, S>
where
    K: Clone,
    S: StoreMut<K, O1Entry<V>>,
{
    /// Creates a cache of `capacity` entries with 16 frequency classes.
    pub fn new(capacity: usize, store: S) -> Self {
        Self::with_options(
            &O1Options {
                capacity,
                ..O1Options::default()
            },
            store,
        )
    }

    /// Creates a cache from explicit options. Capacity is clamped to
    /// `[2^5, 2^30)` and the class count to `[4, 128)`.
    pub fn with_options(options: &O1Options, store: S) -> Self {
        let capacity = bound(options.capacity, MIN_CAPACITY, MAX_CAPACITY);
        let classes = bound(options.max_frequency, MIN_FREQUENCY, MAX_FREQUENCY);
        debug!("o1: capacity {capacity}, {classes} frequency classes");
        Self {
            buckets: FrequencyBuckets::with_capacity(classes, capacity),
            store,
            capacity,
            _value: PhantomData,
        }
    }

    /// Creates a cache whose store comes from `factory`, sized to the
    /// clamped capacity.
    pub fn from_factory<F>(options: &O1Options, factory: &F) -> Self
    where
        F: StoreFactory<K, O1Entry<V>, Store = S>,
    {
        let capacity = bound(options.capacity, MIN_CAPACITY, MAX_CAPACITY);
        Self::with_options(options, factory.create(capacity))
    }

    /// Inserts or updates `key`, adding `freq` to its access count.
    ///
    /// Returns `false` only if the cache is full and class 0 stays empty
    /// even after aging.
    pub fn put(&mut self, key: K, value: V, freq: u32) -> bool {
        let f = u64::from(freq);
        if let Some(entry) = self.store.get_mut(&key) {
            entry.freq = entry.freq.saturating_add(f);
            entry.value = value;
            self.buckets.move_to_front(entry.node, entry.freq);
            return true;
        }

        if self.store.len() >= self.capacity {
            self.age_down(f);
            let Some(victim) = self.buckets.pop_back(0) else {
                debug!("o1: full with nothing evictable, dropping insert");
                return false;
            };
            if let Some(victim_key) = self.buckets.release(victim) {
                self.store.remove(&victim_key);
                trace!("o1: evicted least frequent entry");
            }
        }

        let node = self.buckets.push_front(f, key.clone());
        self.store.set(key, O1Entry { value, node, freq: f });
        true
    }

    /// Moves the oldest node of every class above 0 down by `f` classes.
    fn age_down(&mut self, f: u64) {
        let step = usize::try_from(f).unwrap_or(usize::MAX);
        for class in 1..self.buckets.classes() {
            let Some(id) = self.buckets.pop_back(class) else {
                continue;
            };
            let target = class.saturating_sub(step);
            self.buckets.link_front(target, id);
            if let Some(key) = self.buckets.key(id)
                && let Some(entry) = self.store.get_mut(key)
            {
                entry.freq = target as u64 + 1;
            }
        }
    }

    /// Returns the value for `key`, adding `freq` to its access count.
    pub fn val(&mut self, key: &K, freq: u32) -> Option<&V> {
        let entry = self.store.get_mut(key)?;
        entry.freq = entry.freq.saturating_add(u64::from(freq));
        self.buckets.move_to_front(entry.node, entry.freq);
        Some(&entry.value)
    }

    /// Returns the value without counting an access.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.store.get(key).map(|entry| &entry.value)
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.store.get(key).map(O1Entry::freq)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.store.remove(key)?;
        self.buckets.release(entry.node);
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of frequency classes.
    pub fn max_frequency(&self) -> usize {
        self.buckets.classes()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Keys of one frequency class, newest first.
    pub fn class_keys(&self, class: usize) -> impl Iterator<Item = &K> + '_ {
        self.buckets.iter_bucket(class).map(|(_, key)| key)
    }

    /// Cached `(key, value)` pairs in the store's order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.store.entries().map(|(key, entry)| (key, &entry.value))
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.store.clear();
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.buckets.check_invariants()?;
        if self.buckets.len() != self.store.len() {
            return Err(InvariantError::new(format!(
                "{} linked nodes for {} stored entries",
                self.buckets.len(),
                self.store.len()
            )));
        }
        if self.store.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.store.len(),
                self.capacity
            )));
        }
        for (_, entry) in self.store.entries() {
            let expected = self.buckets.class_for(entry.freq);
            match self.buckets.class_of(entry.node) {
                Some(class) if class == expected => {},
                Some(class) => {
                    return Err(InvariantError::new(format!(
                        "entry with freq {} linked in class {class}, expected {expected}",
                        entry.freq
                    )));
                },
                None => {
                    return Err(InvariantError::new("stored entry has no linked node"));
                },
            }
        }
        Ok(())
    }
}

impl<K, V, S> O1<K, V, S>
where
    K: Clone,
    S: SearchStore<K, O1Entry<V>>,
{
    /// Looks `key` up through the store's cursor search, counting an access
    /// on a hit exactly like [`val`](Self::val).
    pub fn search(
        &mut self,
        key: &K,
        cursor: Option<S::Cursor>,
        freq: u32,
    ) -> (Option<&V>, S::Cursor) {
        let (entry, cursor) = self.store.search(key, cursor);
        let Some(entry) = entry else {
            return (None, cursor);
        };
        entry.freq = entry.freq.saturating_add(u64::from(freq));
        self.buckets.move_to_front(entry.node, entry.freq);
        (Some(&entry.value), cursor)
    }
}

impl<K, V, S> FrequencyEngine<K, V> for O1<K, V, S>
where
    K: Clone,
    S: StoreMut<K, O1Entry<V>>,
{
    fn put(&mut self, key: K, value: V, boost: u32) -> bool {
        O1::put(self, key, value, boost)
    }

    fn val(&mut self, key: &K, boost: u32) -> Option<&V> {
        O1::val(self, key, boost)
    }

    fn contains(&self, key: &K) -> bool {
        O1::contains(self, key)
    }

    fn len(&self) -> usize {
        O1::len(self)
    }

    fn capacity(&self) -> usize {
        O1::capacity(self)
    }

    fn clear(&mut self) {
        O1::clear(self);
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        O1::check_invariants(self)
    }
}

impl<K, V, S> CursorSearch<K, V> for O1<K, V, S>
where
    K: Clone,
    S: SearchStore<K, O1Entry<V>>,
{
    type Cursor = S::Cursor;

    fn search(&mut self, key: &K, cursor: Option<S::Cursor>, boost: u32) -> (Option<&V>, S::Cursor) {
        O1::search(self, key, cursor, boost)
    }
}
