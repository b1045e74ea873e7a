//! Probe ordering over a growing set of shards.
//!
//! [`MultiClock`](crate::policy::multi_clock::MultiClock) looks keys up by
//! trying its clock shards one after another. Always probing in creation
//! order would make shard 0 absorb every boost and every eviction attempt,
//! so the order is a permutation that is reshuffled (Fisher-Yates) on
//! roughly every other lookup.
//!
//! ## Architecture
//!
//! ```text
//!   shards:  [ clock 0 ] [ clock 1 ] [ clock 2 ] [ clock 3 ]
//!
//!   order:   [ 2, 0, 3, 1 ]      probe clock 2 first, then 0, ...
//!              │
//!              └── maybe_shuffle(): with odds 1/2, permute in place
//!
//!   push():  [ 2, 0, 3, 1, 4 ]   a new shard is probed last until the
//!                                next shuffle moves it
//! ```
//!
//! ## Probe budget
//!
//! Inserts only try a fraction of the shards before giving up on existing
//! ones: 10% (rounded up) while more shards may still be created, 5% once
//! the set is full, and never fewer than one. See [`probe_budget`].
//!
//! ## Example Usage
//!
//! ```
//! use lfukit::ds::ShardOrder;
//!
//! let mut order = ShardOrder::with_seed(7);
//! order.push();
//! order.push();
//! order.push();
//! order.maybe_shuffle();
//!
//! let mut seen: Vec<usize> = order.iter().collect();
//! seen.sort_unstable();
//! assert_eq!(seen, vec![0, 1, 2]);
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Permutation of shard indices that is periodically reshuffled.
#[derive(Debug)]
pub struct ShardOrder {
    order: Vec<usize>,
    rng: SmallRng,
}

impl ShardOrder {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    /// Creates an empty ordering with a deterministic shuffle sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            order: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Registers the next shard index (`len()` before the call) and returns it.
    pub fn push(&mut self) -> usize {
        let index = self.order.len();
        self.order.push(index);
        index
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Shuffles the whole order with probability 1/2.
    pub fn maybe_shuffle(&mut self) {
        if self.rng.random_bool(0.5) {
            self.shuffle();
        }
    }

    /// Unconditional Fisher-Yates shuffle.
    pub fn shuffle(&mut self) {
        for i in (1..self.order.len()).rev() {
            let j = self.rng.random_range(0..=i);
            self.order.swap(i, j);
        }
    }

    /// Shard probed `n`-th.
    pub fn at(&self, n: usize) -> Option<usize> {
        self.order.get(n).copied()
    }

    /// Shard indices in probe order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    /// Drops every shard index.
    pub fn clear(&mut self) {
        self.order.clear();
    }
}

impl Default for ShardOrder {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of shards an insert may try before falling back to growth.
///
/// ```
/// use lfukit::ds::shard::probe_budget;
///
/// assert_eq!(probe_budget(4, true), 1);
/// assert_eq!(probe_budget(64, true), 7);
/// assert_eq!(probe_budget(64, false), 4);
/// ```
pub fn probe_budget(max_shards: usize, expandable: bool) -> usize {
    let percent = if expandable { 10 } else { 5 };
    (max_shards * percent).div_ceil(100).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_order_push_assigns_sequential_indices() {
        let mut order = ShardOrder::with_seed(1);
        assert!(order.is_empty());
        assert_eq!(order.push(), 0);
        assert_eq!(order.push(), 1);
        assert_eq!(order.iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn shard_order_shuffle_is_a_permutation() {
        let mut order = ShardOrder::with_seed(99);
        for _ in 0..32 {
            order.push();
        }
        let mut moved = false;
        for _ in 0..8 {
            order.shuffle();
            let mut seen: Vec<_> = order.iter().collect();
            if seen != (0..32).collect::<Vec<_>>() {
                moved = true;
            }
            seen.sort_unstable();
            assert_eq!(seen, (0..32).collect::<Vec<_>>());
        }
        assert!(moved);
    }

    #[test]
    fn shard_order_maybe_shuffle_sometimes_skips() {
        let mut order = ShardOrder::with_seed(5);
        for _ in 0..16 {
            order.push();
        }
        let mut unchanged = 0;
        for _ in 0..200 {
            let before: Vec<_> = order.iter().collect();
            order.maybe_shuffle();
            if before == order.iter().collect::<Vec<_>>() {
                unchanged += 1;
            }
        }
        assert!((50..150).contains(&unchanged), "unchanged {unchanged}");
    }

    #[test]
    fn probe_budget_never_drops_below_one() {
        assert_eq!(probe_budget(0, true), 1);
        assert_eq!(probe_budget(1, false), 1);
        assert_eq!(probe_budget(100, true), 10);
        assert_eq!(probe_budget(101, true), 11);
        assert_eq!(probe_budget(100, false), 5);
    }
}
