//! [`RangeList`] as a store keyed by [`Range`].
//!
//! Lookups resolve the key's `lo` bound, so `get(&Range::point(n))` finds
//! the stored range containing `n`. [`SearchStore`] is backed by the skip
//! list's cursor-resumable search, which is what lets
//! [`O1::search`](crate::policy::o1::O1::search) and the range facades
//! serve runs of nearby lookups cheaply.
//!
//! ## Example Usage
//! ```rust
//! use lfukit::ds::{Range, RangeList};
//! use lfukit::store::traits::{SearchStore, StoreCore, StoreMut};
//!
//! let mut store: RangeList<&str> = RangeList::new();
//! store.set(Range::new(0, 9), "a");
//! store.set(Range::new(20, 29), "b");
//! assert_eq!(StoreCore::get(&store, &Range::point(25)), Some(&"b"));
//!
//! let (hit, cursor) = SearchStore::search(&mut store, &Range::point(3), None);
//! assert_eq!(hit.copied(), Some("a"));
//! let (hit, _) = SearchStore::search(&mut store, &Range::point(21), Some(cursor));
//! assert_eq!(hit.copied(), Some("b"));
//! ```

use std::cell::Cell;

use crate::ds::range_list::{Cursor, DEFAULT_MAX_LEVEL, Range, RangeList};
use crate::store::traits::{SearchStore, StoreCore, StoreFactory, StoreMetrics, StoreMut};

impl<E> StoreCore<Range, E> for RangeList<E> {
    fn get(&self, key: &Range) -> Option<&E> {
        RangeList::get(self, key)
    }

    fn contains(&self, key: &Range) -> bool {
        RangeList::contains(self, key)
    }

    fn len(&self) -> usize {
        RangeList::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&Range, &E)> + '_> {
        Box::new(self.iter())
    }

    fn metrics(&self) -> StoreMetrics {
        RangeList::metrics(self)
    }
}

impl<E> StoreMut<Range, E> for RangeList<E> {
    fn get_mut(&mut self, key: &Range) -> Option<&mut E> {
        RangeList::get_mut(self, key)
    }

    fn set(&mut self, key: Range, entry: E) -> Option<E> {
        self.upsert(key, entry)
    }

    fn remove(&mut self, key: &Range) -> Option<E> {
        RangeList::remove(self, key)
    }

    fn clear(&mut self) {
        RangeList::clear(self);
    }
}

impl<E> SearchStore<Range, E> for RangeList<E> {
    type Cursor = Cursor;

    fn search(&mut self, key: &Range, cursor: Option<Cursor>) -> (Option<&mut E>, Cursor) {
        self.search_mut(key, cursor)
    }
}

/// Builds one [`RangeList`] per call.
///
/// Lists get `max(16, round(log2(capacity_hint)))` levels unless a fixed
/// level count is set with [`with_max_level`](Self::with_max_level). With a seed,
/// the n-th list created draws its levels from `seed + n`, so a sharded
/// engine is reproducible without every shard sharing one sequence.
#[derive(Debug, Default)]
pub struct RangeListFactory {
    seed: Option<u64>,
    max_level: Option<usize>,
    created: Cell<u64>,
}

impl RangeListFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Gives every created list exactly `max_level` levels (still clamped by
    /// the list itself).
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = Some(max_level);
        self
    }

    /// Number of levels a list sized for `capacity_hint` entries gets.
    pub fn levels_for(capacity_hint: usize) -> usize {
        let fit = (capacity_hint.max(1) as f64).log2().round() as usize;
        fit.max(DEFAULT_MAX_LEVEL)
    }
}

impl<E> StoreFactory<Range, E> for RangeListFactory {
    type Store = RangeList<E>;

    fn create(&self, capacity_hint: usize) -> RangeList<E> {
        let levels = self
            .max_level
            .unwrap_or_else(|| Self::levels_for(capacity_hint));
        let n = self.created.get();
        self.created.set(n + 1);
        match self.seed {
            Some(seed) => RangeList::with_seed(levels, seed.wrapping_add(n)),
            None => RangeList::with_max_level(levels),
        }
    }
}
