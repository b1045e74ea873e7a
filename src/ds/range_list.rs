//! Skip list keyed by disjoint integer ranges.
//!
//! Stores values against inclusive ranges `[lo, hi]` and answers "which
//! range contains point `n`?" in expected O(log n). Ranges must not overlap:
//! inserting `[5, 15]` into a list that holds `[1, 10]` through
//! [`RangeList::insert`] is a contract violation that is not detected. Use
//! [`RangeList::try_insert`] when the input is not already known to be
//! disjoint.
//!
//! ## Architecture
//!
//! ```text
//!   level 2:  [HEAD] ─────────────────────────► [40,49] ───────────► [TAIL]
//!   level 1:  [HEAD] ────────► [10,19] ───────► [40,49] ───────────► [TAIL]
//!   level 0:  [HEAD] ► [0,9] ► [10,19] ► [20,29] ► [40,49] ► [60,69] ► [TAIL]
//!
//!   every link is doubled by a `prev` link on the same level;
//!   HEAD holds [MIN, MIN+1] and TAIL holds [MAX-1, MAX] forever
//! ```
//!
//! Nodes live in a generational [`SlotArena`]; each node owns one `next` and
//! one `prev` vector of [`SlotId`]s, one entry per level it participates in.
//!
//! ## Cursor-resumable search
//!
//! [`RangeList::search`] takes the [`Cursor`] returned by a previous search.
//! It walks backwards from the cursor over top-level `prev` links to the
//! nearest node that ends before the target, then descends from there
//! instead of from the head. The descent climbs to a node's top level every
//! time it advances, so a nearby target costs O(log distance).
//!
//! ```text
//!   search(25, cursor @ [10,19])
//!     lca:    [10,19].hi < 25          -> start at [10,19]
//!     xget:   [10,19] -L1-> [40,49]    40 > 25, drop to L0
//!             [10,19] -L0-> [20,29]    contains 25 -> found
//! ```
//!
//! ## Level assignment
//!
//! Random levels come from a single draw in `[0, 2^(max_level-1))` whose
//! leading set bits are counted, so `P(level >= k) = 2^-k`. With
//! `self_correct`, the level whose population lags furthest behind the
//! expected `2^-(i+1) * len` is chosen instead; [`RangeList::balanced_copy`]
//! replays a list that way.
//!
//! ## Corruption guard
//!
//! Descents are capped at `max_level^2` iterations. Exceeding the cap means
//! the links are corrupt and the operation panics.

use std::cell::Cell;
use std::fmt;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::{InvariantError, RangeOverlapError};
use crate::store::traits::{StoreCounters, StoreMetrics};

/// Default number of levels.
pub const DEFAULT_MAX_LEVEL: usize = 16;
/// Fewest levels a list is built with.
pub const MIN_MAX_LEVEL: usize = 4;
/// Most levels a list is built with.
pub const MAX_MAX_LEVEL: usize = 48;

/// Smallest bound a stored range may use; anything lower collides with the head.
pub const MIN_BOUND: i64 = i64::MIN + 2;
/// Largest bound a stored range may use; anything higher collides with the tail.
pub const MAX_BOUND: i64 = i64::MAX - 2;

/// Inclusive integer range `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    pub lo: i64,
    pub hi: i64,
}

impl Range {
    /// Creates `[lo, hi]`. `lo` must not exceed `hi`.
    #[inline]
    pub const fn new(lo: i64, hi: i64) -> Self {
        debug_assert!(lo <= hi, "range lo exceeds hi");
        Self { lo, hi }
    }

    /// The single-point range `[n, n]`, used as a lookup key.
    #[inline]
    pub const fn point(n: i64) -> Self {
        Self { lo: n, hi: n }
    }

    #[inline]
    pub const fn contains(&self, n: i64) -> bool {
        self.lo <= n && n <= self.hi
    }

    #[inline]
    pub const fn overlaps(&self, other: &Range) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    /// `true` if the whole range lies strictly below `n`.
    #[inline]
    const fn ends_before(&self, n: i64) -> bool {
        self.hi < n
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// Opaque position inside a [`RangeList`] for resuming searches.
///
/// A cursor whose node was deleted is detected and treated as the head. A
/// cursor taken from another list may land on any live node of this one;
/// lookups stay correct and only lose the locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor(SlotId);

#[derive(Debug)]
struct Node<V> {
    range: Range,
    // `None` only for the head and tail sentinels
    value: Option<V>,
    next: Vec<SlotId>,
    prev: Vec<SlotId>,
}

impl<V> Node<V> {
    fn top(&self) -> usize {
        self.next.len() - 1
    }
}

/// Result of a descent: the containing node, if any, and where it stopped.
#[derive(Debug, Clone, Copy)]
struct Descent {
    found: Option<SlotId>,
    cursor: SlotId,
}

/// Point-in-time view of a list's shape and search cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeListStats {
    pub len: usize,
    pub level: usize,
    pub max_level: usize,
    pub max_flips: u64,
    pub max_iters: usize,
    pub avg_get_iters: usize,
    pub level_histogram: Vec<usize>,
}

/// Skip list of disjoint inclusive ranges.
#[derive(Debug)]
pub struct RangeList<V> {
    arena: SlotArena<Node<V>>,
    head: SlotId,
    tail: SlotId,
    max_level: usize,
    max_iters: usize,
    max_flips: u64,
    bitmask: u64,
    // highest level in use
    level: usize,
    len: usize,
    // nodes present at each level (a level-3 node counts on 0..=3)
    level_histogram: Vec<usize>,
    avg_get_iters: Cell<usize>,
    counters: StoreCounters,
    rng: SmallRng,
}

impl<V> RangeList<V> {
    /// Creates an empty list with [`DEFAULT_MAX_LEVEL`] levels.
    pub fn new() -> Self {
        Self::with_max_level(DEFAULT_MAX_LEVEL)
    }

    /// Creates an empty list with `max_level` levels (clamped to `[4, 48]`).
    pub fn with_max_level(max_level: usize) -> Self {
        Self::with_rng(max_level, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Creates an empty list whose random levels are drawn from `seed`.
    pub fn with_seed(max_level: usize, seed: u64) -> Self {
        Self::with_rng(max_level, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(max_level: usize, rng: SmallRng) -> Self {
        let max_level = max_level.clamp(MIN_MAX_LEVEL, MAX_MAX_LEVEL);
        let mut list = Self {
            arena: SlotArena::new(),
            // placeholders until `init` allocates the sentinels
            head: SlotId::DANGLING,
            tail: SlotId::DANGLING,
            max_level,
            max_iters: max_level * max_level,
            max_flips: 1u64 << (max_level - 1),
            bitmask: 1u64 << (max_level - 2),
            level: 0,
            len: 0,
            level_histogram: vec![0; max_level],
            avg_get_iters: Cell::new(0),
            counters: StoreCounters::default(),
            rng,
        };
        list.init();
        debug!(
            "range list: created with {} levels, iteration cap {}",
            list.max_level, list.max_iters
        );
        list
    }

    fn init(&mut self) {
        self.arena.clear();
        let head = self.arena.insert(Node {
            range: Range::new(i64::MIN, i64::MIN + 1),
            value: None,
            next: Vec::new(),
            prev: Vec::new(),
        });
        let tail = self.arena.insert(Node {
            range: Range::new(i64::MAX - 1, i64::MAX),
            value: None,
            next: Vec::new(),
            prev: Vec::new(),
        });
        // every level of an empty list is HEAD <-> TAIL
        let levels = self.max_level;
        let h = self.node_mut(head);
        h.next = vec![tail; levels];
        h.prev = vec![tail; levels];
        let t = self.node_mut(tail);
        t.next = vec![head; levels];
        t.prev = vec![head; levels];

        self.head = head;
        self.tail = tail;
        self.level = 0;
        self.len = 0;
        self.level_histogram.iter_mut().for_each(|n| *n = 0);
        self.avg_get_iters.set(0);
    }

    /// Number of stored ranges.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest level currently in use (0-based).
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Nodes present at each level, bottom first.
    pub fn level_histogram(&self) -> &[usize] {
        &self.level_histogram
    }

    pub fn metrics(&self) -> StoreMetrics {
        self.counters.snapshot()
    }

    /// Inserts `range -> value` and returns a cursor at the new node.
    ///
    /// `range` must not overlap any stored range; this is not checked. With
    /// `self_correct` the node's level is chosen to fill the most
    /// under-populated level instead of being drawn at random.
    pub fn insert(&mut self, range: Range, value: V, self_correct: bool) -> Cursor {
        let lr = self.random_level(self_correct);

        // predecessor at every level currently in use
        let mut slots = vec![self.head; self.level + 1];
        let mut cur = self.head;
        for i in (0..=self.level).rev() {
            loop {
                let next = self.node(cur).next[i];
                if self.node(next).range.ends_before(range.lo) {
                    cur = next;
                } else {
                    break;
                }
            }
            slots[i] = cur;
        }

        // levels above the current height splice in between HEAD and TAIL
        let preds: Vec<SlotId> = (0..=lr)
            .map(|i| slots.get(i).copied().unwrap_or(self.head))
            .collect();
        let succs: Vec<SlotId> = preds
            .iter()
            .enumerate()
            .map(|(i, &pred)| self.node(pred).next[i])
            .collect();

        let id = self.arena.insert(Node {
            range,
            value: Some(value),
            next: succs.clone(),
            prev: preds.clone(),
        });
        for i in 0..=lr {
            self.node_mut(preds[i]).next[i] = id;
            self.node_mut(succs[i]).prev[i] = id;
            self.level_histogram[i] += 1;
        }
        if lr > self.level {
            debug!("range list: level raised {} -> {}", self.level, lr);
            self.level = lr;
        }
        self.len += 1;
        self.counters.inc_insert();
        Cursor(id)
    }

    /// Inserts `range -> value` only if it overlaps nothing already stored.
    ///
    /// Ranges reaching into the sentinel bounds (below [`MIN_BOUND`] or above
    /// [`MAX_BOUND`]) are rejected as overlapping the head or tail.
    ///
    /// # Example
    ///
    /// ```
    /// use lfukit::ds::{Range, RangeList};
    ///
    /// let mut list = RangeList::new();
    /// list.try_insert(Range::new(1, 10), "a").unwrap();
    /// let err = list.try_insert(Range::new(5, 15), "b").unwrap_err();
    /// assert_eq!(err.existing, Range::new(1, 10));
    /// assert_eq!(list.len(), 1);
    /// ```
    pub fn try_insert(&mut self, range: Range, value: V) -> Result<Cursor, RangeOverlapError> {
        let head_range = self.node(self.head).range;
        if range.lo <= head_range.hi {
            return Err(RangeOverlapError {
                existing: head_range,
                incoming: range,
            });
        }
        let mut cur = self.head;
        for i in (0..=self.level).rev() {
            loop {
                let next = self.node(cur).next[i];
                if self.node(next).range.ends_before(range.lo) {
                    cur = next;
                } else {
                    break;
                }
            }
        }
        // first node that does not end before `range.lo` (maybe the tail)
        let candidate = self.node(self.node(cur).next[0]).range;
        if candidate.overlaps(&range) {
            return Err(RangeOverlapError {
                existing: candidate,
                incoming: range,
            });
        }
        Ok(self.insert(range, value, false))
    }

    /// Value of the range containing `range.lo`.
    ///
    /// # Panics
    ///
    /// Panics if the descent exceeds `max_level^2` iterations.
    pub fn get(&self, range: &Range) -> Option<&V> {
        let found = self.xget(range.lo, self.head).found;
        self.record_lookup(found.is_some());
        found.and_then(|id| self.node(id).value.as_ref())
    }

    /// Value of the range containing point `n`.
    pub fn get_point(&self, n: i64) -> Option<&V> {
        self.get(&Range::point(n))
    }

    pub fn get_mut(&mut self, range: &Range) -> Option<&mut V> {
        let found = self.xget(range.lo, self.head).found;
        self.record_lookup(found.is_some());
        let id = found?;
        self.node_mut(id).value.as_mut()
    }

    /// Stored range containing `range.lo`, if any.
    pub fn find_range(&self, range: &Range) -> Option<Range> {
        let id = self.xget(range.lo, self.head).found?;
        Some(self.node(id).range)
    }

    pub fn contains(&self, range: &Range) -> bool {
        self.xget(range.lo, self.head).found.is_some()
    }

    /// Looks up `range.lo`, resuming near `cursor` when one is given.
    ///
    /// Returns the value (if any) and a cursor for the next nearby search.
    ///
    /// # Example
    ///
    /// ```
    /// use lfukit::ds::{Range, RangeList};
    ///
    /// let mut list = RangeList::with_seed(16, 7);
    /// for i in 0..100 {
    ///     list.insert(Range::new(i * 10, i * 10 + 9), i, false);
    /// }
    /// let (v, cursor) = list.search(&Range::point(405), None);
    /// assert_eq!(v, Some(&40));
    /// let (v, _) = list.search(&Range::point(431), Some(cursor));
    /// assert_eq!(v, Some(&43));
    /// ```
    pub fn search(&self, range: &Range, cursor: Option<Cursor>) -> (Option<&V>, Cursor) {
        let start = self.search_start(range.lo, cursor);
        let descent = self.xget(range.lo, start);
        self.record_lookup(descent.found.is_some());
        let value = descent.found.and_then(|id| self.node(id).value.as_ref());
        (value, Cursor(descent.cursor))
    }

    pub fn search_mut(&mut self, range: &Range, cursor: Option<Cursor>) -> (Option<&mut V>, Cursor) {
        let start = self.search_start(range.lo, cursor);
        let descent = self.xget(range.lo, start);
        self.record_lookup(descent.found.is_some());
        let value = match descent.found {
            Some(id) => self.node_mut(id).value.as_mut(),
            None => None,
        };
        (value, Cursor(descent.cursor))
    }

    fn search_start(&self, n: i64, cursor: Option<Cursor>) -> SlotId {
        match cursor {
            Some(Cursor(id)) => self.lca(id, n),
            None => self.head,
        }
    }

    /// Range under `cursor`, or `None` for sentinels and stale cursors.
    pub fn cursor_range(&self, cursor: Cursor) -> Option<Range> {
        let node = self.arena.get(cursor.0)?;
        node.value.as_ref().map(|_| node.range)
    }

    /// Replaces the value of the range containing `range.lo`, or inserts
    /// `range` with a random level when no stored range contains it.
    ///
    /// The stored range keeps its original bounds on replacement.
    pub fn upsert(&mut self, range: Range, value: V) -> Option<V> {
        if let Some(id) = self.xget(range.lo, self.head).found {
            self.counters.inc_update();
            return self.node_mut(id).value.replace(value);
        }
        self.insert(range, value, false);
        None
    }

    /// Removes the range containing `range.lo` and returns its value.
    pub fn remove(&mut self, range: &Range) -> Option<V> {
        let id = self.xget(range.lo, self.head).found?;
        let node = self.arena.remove(id)?;
        for i in 0..node.next.len() {
            let (pred, succ) = (node.prev[i], node.next[i]);
            self.node_mut(pred).next[i] = succ;
            self.node_mut(succ).prev[i] = pred;
            self.level_histogram[i] -= 1;
        }
        while self.level > 0 && self.node(self.head).next[self.level] == self.tail {
            self.level -= 1;
        }
        self.len -= 1;
        self.counters.inc_remove();
        node.value
    }

    /// Removes the range containing `range.lo`; `false` if there is none.
    pub fn delete(&mut self, range: &Range) -> bool {
        self.remove(range).is_some()
    }

    /// Drops every range. The level configuration is kept.
    pub fn clear(&mut self) {
        self.init();
    }

    /// Stored ranges in ascending order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            list: self,
            current: self.node(self.head).next[0],
        }
    }

    pub fn stats(&self) -> RangeListStats {
        RangeListStats {
            len: self.len,
            level: self.level,
            max_level: self.max_level,
            max_flips: self.max_flips,
            max_iters: self.max_iters,
            avg_get_iters: self.avg_get_iters.get(),
            level_histogram: self.level_histogram.clone(),
        }
    }

    /// Copies every entry into a new list with self-correcting levels.
    ///
    /// The copy has `round(log2(len))` levels (clamped) and its per-level
    /// populations track the ideal `2^-(i+1) * len` far closer than random
    /// levels do.
    pub fn balanced_copy(&self) -> RangeList<V>
    where
        V: Clone,
    {
        let levels = (self.len.max(1) as f64).log2().round() as usize;
        let mut copy = RangeList::with_max_level(levels);
        for (range, value) in self.iter() {
            copy.insert(*range, value.clone(), true);
        }
        copy
    }

    /// Finds the node containing `n`, starting the descent at `start`.
    ///
    /// At each step the next node on the current level either contains `n`
    /// (done), ends before `n` (advance to it and climb to its top level),
    /// or starts after `n` (drop a level). The tail never counts as a hit.
    fn xget(&self, n: i64, start: SlotId) -> Descent {
        let mut node = start;
        let mut i = if node == self.head {
            self.level
        } else {
            self.node(node).top()
        };
        let mut iters = 0usize;
        while node != self.tail {
            if iters > self.max_iters {
                panic!(
                    "range list descent for {n} exceeded {} iterations; links are corrupt",
                    self.max_iters
                );
            }
            iters += 1;
            let cur = self.node(node).next[i];
            let cur_node = self.node(cur);
            if cur_node.range.contains(n) {
                self.record_iters(iters);
                let found = (cur != self.tail).then_some(cur);
                return Descent {
                    found,
                    cursor: node,
                };
            } else if cur_node.range.ends_before(n) {
                node = cur;
                i = cur_node.top();
            } else if i == 0 {
                break;
            } else {
                i -= 1;
            }
        }
        Descent {
            found: None,
            cursor: node,
        }
    }

    /// Nearest node at or before `n` reachable backwards from `node`.
    ///
    /// Falls back to the head for stale cursors or when the walk runs past
    /// the iteration cap.
    fn lca(&self, mut node: SlotId, n: i64) -> SlotId {
        let mut steps = 0usize;
        loop {
            let Some(current) = self.arena.get(node) else {
                return self.head;
            };
            if node == self.head || steps > self.max_iters {
                return self.head;
            }
            if current.range.ends_before(n) {
                return node;
            }
            node = current.prev[current.top()];
            steps += 1;
        }
    }

    fn random_level(&mut self, self_correct: bool) -> usize {
        if self_correct && let Some(level) = self.level_up() {
            return level;
        }
        // the msb side of the draw is the more random side
        let mut flips = self.rng.random_range(0..self.max_flips);
        let mut level = 0;
        loop {
            if flips & self.bitmask != self.bitmask {
                break;
            }
            level += 1;
            flips = (flips & (self.bitmask - 1)) << 1;
            if flips == 0 {
                break;
            }
        }
        level
    }

    /// Level whose exact population falls furthest below expectation.
    fn level_up(&self) -> Option<usize> {
        let mut max_diff = 0i64;
        let mut max_level = None;
        // nodes counted so far on higher levels
        let mut above = 0i64;
        for i in (1..=self.level_histogram.len()).rev() {
            let exact = self.level_histogram[i - 1] as i64 - above;
            let expected = (self.len as f64 * 0.5f64.powi(i as i32)).round() as i64;
            let diff = expected - exact;
            if diff > max_diff {
                max_diff = diff;
                max_level = Some(i - 1);
            }
            above += exact;
        }
        max_level
    }

    fn record_iters(&self, iters: usize) {
        let avg = self.avg_get_iters.get();
        let next = if avg > 0 { (avg + iters).div_ceil(2) } else { iters };
        self.avg_get_iters.set(next);
    }

    fn record_lookup(&self, hit: bool) {
        if hit {
            self.counters.inc_hit();
        } else {
            self.counters.inc_miss();
        }
    }

    fn node(&self, id: SlotId) -> &Node<V> {
        self.arena
            .get(id)
            .expect("range list link points to a freed node")
    }

    fn node_mut(&mut self, id: SlotId) -> &mut Node<V> {
        self.arena
            .get_mut(id)
            .expect("range list link points to a freed node")
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        for i in 0..self.max_level {
            let mut prev = self.head;
            let mut current = self.node(self.head).next[i];
            let mut count = 0usize;
            while current != self.tail {
                let node = self
                    .arena
                    .get(current)
                    .ok_or_else(|| InvariantError::new(format!("level {i} links a freed node")))?;
                if node.next.len() <= i || node.prev[i] != prev {
                    return Err(InvariantError::new(format!(
                        "level {i} has a broken prev link at {}",
                        node.range
                    )));
                }
                let prev_range = self.node(prev).range;
                if !prev_range.ends_before(node.range.lo) {
                    return Err(InvariantError::new(format!(
                        "level {i} is out of order: {prev_range} then {}",
                        node.range
                    )));
                }
                count += 1;
                if count > self.len {
                    return Err(InvariantError::new(format!("level {i} is cyclic")));
                }
                prev = current;
                current = node.next[i];
            }
            if self.node(self.tail).prev[i] != prev {
                return Err(InvariantError::new(format!(
                    "tail prev on level {i} does not point at the last node"
                )));
            }
            if count != self.level_histogram[i] {
                return Err(InvariantError::new(format!(
                    "level {i} holds {count} nodes, histogram says {}",
                    self.level_histogram[i]
                )));
            }
            if i == 0 && count != self.len {
                return Err(InvariantError::new(format!(
                    "bottom level holds {count} nodes, len is {}",
                    self.len
                )));
            }
            if i > self.level && count != 0 {
                return Err(InvariantError::new(format!(
                    "level {i} is populated above the list level {}",
                    self.level
                )));
            }
        }
        Ok(())
    }
}

impl<V> Default for RangeList<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ascending iterator over `(range, value)` pairs.
pub struct Iter<'a, V> {
    list: &'a RangeList<V>,
    current: SlotId,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Range, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.list.tail {
            return None;
        }
        let node = self.list.arena.get(self.current)?;
        self.current = node.next[0];
        node.value.as_ref().map(|value| (&node.range, value))
    }
}
