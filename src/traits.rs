//! # Engine Traits
//!
//! The seam between eviction engines and the facades built on top of them.
//! Every engine ([`Clock`], [`MultiClock`], [`O1`]) implements
//! [`FrequencyEngine`]; engines whose store supports proximity lookups also
//! implement [`CursorSearch`].
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────┐
//!   │         FrequencyEngine<K, V>           │
//!   │                                         │
//!   │  put(&mut, K, V, boost) → bool          │
//!   │  val(&mut, &K, boost) → Option<&V>      │
//!   │  contains / len / is_empty / capacity   │
//!   │  clear / check_invariants               │
//!   └────────────────────┬────────────────────┘
//!                        │
//!                        ▼
//!   ┌─────────────────────────────────────────┐
//!   │           CursorSearch<K, V>            │
//!   │                                         │
//!   │  type Cursor: Copy                      │
//!   │  search(&mut, &K, Option<Cursor>, boost)│
//!   │         → (Option<&V>, Cursor)          │
//!   └─────────────────────────────────────────┘
//! ```
//!
//! ## Boost
//!
//! `boost` means the same thing everywhere: the amount of "survival" a hit
//! or insert buys. Clock-family engines add it to the slot's vitality
//! (capped); [`O1`] adds it to the entry's access count. A boost of 0 is a
//! plain lookup with no promotion.
//!
//! ## Failure
//!
//! `put` returning `false` is backpressure, not an error: the engine was
//! full and could not free room without evicting entries it considers too
//! valuable. Callers may retry, drop the value, or size the cache up.
//!
//! ## Example Usage
//!
//! ```
//! use lfukit::policy::o1::O1;
//! use lfukit::store::HashMapStore;
//! use lfukit::traits::FrequencyEngine;
//!
//! fn warm<E: FrequencyEngine<u32, String>>(engine: &mut E) {
//!     for k in 0..8 {
//!         engine.put(k, format!("v{k}"), 1);
//!     }
//! }
//!
//! let mut engine = O1::new(32, HashMapStore::new());
//! warm(&mut engine);
//! assert_eq!(engine.len(), 8);
//! assert!(engine.check_invariants().is_ok());
//! ```
//!
//! [`Clock`]: crate::policy::clock::Clock
//! [`MultiClock`]: crate::policy::multi_clock::MultiClock
//! [`O1`]: crate::policy::o1::O1

use std::fmt::Debug;

use crate::error::InvariantError;

/// Operations every frequency-based eviction engine supports.
pub trait FrequencyEngine<K, V> {
    /// Inserts or updates `key`, crediting it with `boost`.
    ///
    /// Returns `false` when the engine is full and refuses to evict.
    fn put(&mut self, key: K, value: V, boost: u32) -> bool;

    /// Returns the value for `key`, crediting it with `boost` on a hit.
    fn val(&mut self, key: &K, boost: u32) -> Option<&V>;

    /// Membership check that does not count as an access.
    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most entries the engine will hold.
    fn capacity(&self) -> usize;

    fn clear(&mut self);

    /// Verifies the engine's internal bookkeeping.
    fn check_invariants(&self) -> Result<(), InvariantError>;
}

/// Engines whose store can resume a lookup near a previous one.
///
/// The cursor is opaque. Passing a stale cursor, or one from a different
/// store, is allowed and only costs speed: the search then starts from the
/// head or from some unrelated node of this store, and the result is the
/// same as a search without a cursor.
pub trait CursorSearch<K, V>: FrequencyEngine<K, V> {
    type Cursor: Copy + Debug;

    /// Looks `key` up starting near `cursor`, crediting `boost` on a hit,
    /// and returns a cursor for the next nearby search.
    fn search(&mut self, key: &K, cursor: Option<Self::Cursor>, boost: u32)
    -> (Option<&V>, Self::Cursor);
}
