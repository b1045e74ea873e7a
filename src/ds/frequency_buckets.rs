//! Frequency-class buckets for constant-time LFU bookkeeping.
//!
//! A fixed number of doubly linked lists, one per *frequency class*. Each
//! list is bounded by two immovable sentinel nodes so that linking and
//! unlinking never branch on "empty list" or "first node". All nodes,
//! sentinels included, live in one [`SlotArena`] and refer to each other by
//! [`SlotId`].
//!
//! ## Architecture
//!
//! ```text
//!   classes = 4   (frequency f lands in class clamp(f - 1, 0, 3))
//!
//!   class 0:  [H]──►[E]──►[D]──►[T]        f = 1
//!   class 1:  [H]──►[A]──►[T]              f = 2
//!   class 2:  [H]──►[C]──►[B]──►[T]        f = 3
//!   class 3:  [H]──►[T]                    f >= 4
//!              ▲                 ▲
//!            front             back
//!           (newest)        (oldest, popped first)
//! ```
//!
//! A node is either linked into exactly one class or *orphaned* (both links
//! cleared). Orphaned nodes keep their arena slot, so a caller may pop a
//! node off one class and relink it into another without reallocating.
//!
//! ## Operations
//!
//! | Operation       | Time | Notes                                   |
//! |-----------------|------|-----------------------------------------|
//! | `push_front`    | O(1) | Allocates and links a new node          |
//! | `move_to_front` | O(1) | Unlink + relink into the target class   |
//! | `pop_back`      | O(1) | Unlinks the oldest node, keeps its slot |
//! | `link_front`    | O(1) | Relinks an orphaned node                |
//! | `release`       | O(1) | Unlinks if needed and frees the slot    |
//! | `bucket_len`    | O(n) | Walks one class                         |
//!
//! ## Example Usage
//!
//! ```
//! use lfukit::ds::FrequencyBuckets;
//!
//! let mut buckets = FrequencyBuckets::new(4);
//! let a = buckets.push_front(1, "a");
//! let b = buckets.push_front(1, "b");
//!
//! // "a" is accessed twice more: frequency 3 lives in class 2
//! assert!(buckets.move_to_front(a, 3));
//! assert_eq!(buckets.class_of(a), Some(2));
//!
//! // the oldest node of class 0 is "b"
//! let victim = buckets.pop_back(0).unwrap();
//! assert_eq!(victim, b);
//! assert_eq!(buckets.release(victim), Some("b"));
//! ```

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Node<K> {
    // `None` marks a sentinel
    key: Option<K>,
    prev: Option<SlotId>,
    next: Option<SlotId>,
    class: usize,
}

impl<K> Node<K> {
    fn sentinel(class: usize) -> Self {
        Self {
            key: None,
            prev: None,
            next: None,
            class,
        }
    }

    fn immovable(&self) -> bool {
        self.key.is_none()
    }

    fn orphaned(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    head: SlotId,
    tail: SlotId,
}

/// Sentinel-bounded doubly linked lists indexed by frequency class.
#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    arena: SlotArena<Node<K>>,
    buckets: Vec<Bucket>,
    linked: usize,
}

impl<K> FrequencyBuckets<K> {
    /// Creates `classes` empty buckets (at least one).
    pub fn new(classes: usize) -> Self {
        Self::with_capacity(classes, 0)
    }

    /// Creates `classes` empty buckets with room for `capacity` nodes.
    pub fn with_capacity(classes: usize, capacity: usize) -> Self {
        let classes = classes.max(1);
        let mut arena = SlotArena::with_capacity(capacity + 2 * classes);
        let buckets = Self::make_buckets(&mut arena, classes);
        Self {
            arena,
            buckets,
            linked: 0,
        }
    }

    fn make_buckets(arena: &mut SlotArena<Node<K>>, classes: usize) -> Vec<Bucket> {
        (0..classes)
            .map(|class| {
                let head = arena.insert(Node::sentinel(class));
                let tail = arena.insert(Node::sentinel(class));
                // sentinels close the ring on themselves: H <-> T
                for (id, prev, next) in [(head, tail, tail), (tail, head, head)] {
                    let node = arena.get_mut(id).expect("fresh sentinel");
                    node.prev = Some(prev);
                    node.next = Some(next);
                }
                Bucket { head, tail }
            })
            .collect()
    }

    /// Number of frequency classes.
    pub fn classes(&self) -> usize {
        self.buckets.len()
    }

    /// Class index for frequency `freq`: `clamp(freq - 1, 0, classes - 1)`.
    #[inline]
    pub fn class_for(&self, freq: u64) -> usize {
        let top = self.buckets.len() - 1;
        usize::try_from(freq.saturating_sub(1)).map_or(top, |c| c.min(top))
    }

    /// Number of nodes currently linked into some class.
    pub fn len(&self) -> usize {
        self.linked
    }

    pub fn is_empty(&self) -> bool {
        self.linked == 0
    }

    /// Class the node is linked into, or `None` if orphaned or unknown.
    pub fn class_of(&self, id: SlotId) -> Option<usize> {
        let node = self.arena.get(id)?;
        if node.immovable() || node.orphaned() {
            return None;
        }
        Some(node.class)
    }

    pub fn key(&self, id: SlotId) -> Option<&K> {
        self.arena.get(id)?.key.as_ref()
    }

    /// Allocates a node for `key` and links it at the front of `freq`'s class.
    pub fn push_front(&mut self, freq: u64, key: K) -> SlotId {
        let class = self.class_for(freq);
        let id = self.arena.insert(Node {
            key: Some(key),
            prev: None,
            next: None,
            class,
        });
        self.link_front(class, id);
        id
    }

    /// Links an orphaned node at the front of `class`.
    ///
    /// Fails for sentinels, for nodes that are already linked and for
    /// unknown ids. `class` is clamped to the last bucket.
    pub fn link_front(&mut self, class: usize, id: SlotId) -> bool {
        let class = class.min(self.buckets.len() - 1);
        match self.arena.get(id) {
            Some(node) if !node.immovable() && node.orphaned() => {},
            _ => return false,
        }
        let head = self.buckets[class].head;
        let second = self.next_of(head);
        {
            let node = self.node_mut(id);
            node.prev = Some(head);
            node.next = Some(second);
            node.class = class;
        }
        self.node_mut(head).next = Some(id);
        self.node_mut(second).prev = Some(id);
        self.linked += 1;
        true
    }

    /// Unlinks `id` from its class and leaves it orphaned.
    pub fn delink(&mut self, id: SlotId) -> bool {
        let (prev, next) = match self.arena.get(id) {
            Some(node) if !node.immovable() && !node.orphaned() => {
                (node.prev.expect("linked node"), node.next.expect("linked node"))
            },
            _ => return false,
        };
        self.node_mut(next).prev = Some(prev);
        self.node_mut(prev).next = Some(next);
        let node = self.node_mut(id);
        node.prev = None;
        node.next = None;
        self.linked -= 1;
        true
    }

    /// Moves `id` to the front of the class for `freq`.
    pub fn move_to_front(&mut self, id: SlotId, freq: u64) -> bool {
        if !self.delink(id) {
            return false;
        }
        let class = self.class_for(freq);
        self.link_front(class, id)
    }

    /// Unlinks the oldest node of `class` and returns its id.
    ///
    /// The node stays allocated (orphaned) until [`release`](Self::release)
    /// or [`link_front`](Self::link_front).
    pub fn pop_back(&mut self, class: usize) -> Option<SlotId> {
        let bucket = *self.buckets.get(class)?;
        let last = self.prev_of(bucket.tail);
        if last == bucket.head {
            return None;
        }
        self.delink(last);
        Some(last)
    }

    /// Frees `id`, unlinking it first if needed, and returns its key.
    pub fn release(&mut self, id: SlotId) -> Option<K> {
        if self.arena.get(id)?.immovable() {
            return None;
        }
        self.delink(id);
        self.arena.remove(id)?.key
    }

    /// Keys of `class` from front (newest) to back (oldest).
    pub fn iter_bucket(&self, class: usize) -> BucketIter<'_, K> {
        let (current, tail) = match self.buckets.get(class) {
            Some(bucket) => (self.next_of(bucket.head), bucket.tail),
            None => {
                // an exhausted iterator
                let bucket = self.buckets[0];
                (bucket.tail, bucket.tail)
            },
        };
        BucketIter {
            buckets: self,
            current,
            tail,
        }
    }

    pub fn bucket_len(&self, class: usize) -> usize {
        self.iter_bucket(class).count()
    }

    /// Drops every node and rebuilds empty sentinel lists.
    pub fn clear(&mut self) {
        let classes = self.buckets.len();
        self.arena.clear();
        self.buckets = Self::make_buckets(&mut self.arena, classes);
        self.linked = 0;
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut total = 0usize;
        for (class, bucket) in self.buckets.iter().enumerate() {
            let mut prev = bucket.head;
            let mut current = self.next_of(bucket.head);
            let mut steps = 0usize;
            while current != bucket.tail {
                let node = self
                    .arena
                    .get(current)
                    .ok_or_else(|| InvariantError::new(format!("class {class} links a freed node")))?;
                if node.immovable() {
                    return Err(InvariantError::new(format!(
                        "class {class} links a foreign sentinel"
                    )));
                }
                if node.prev != Some(prev) {
                    return Err(InvariantError::new(format!(
                        "class {class} has a broken prev link"
                    )));
                }
                if node.class != class {
                    return Err(InvariantError::new(format!(
                        "node tagged class {} found in class {class}",
                        node.class
                    )));
                }
                steps += 1;
                if steps > self.arena.len() {
                    return Err(InvariantError::new(format!("class {class} is cyclic")));
                }
                prev = current;
                current = node.next.expect("linked node");
            }
            if self.prev_of(bucket.tail) != prev {
                return Err(InvariantError::new(format!(
                    "class {class} tail does not point at its last node"
                )));
            }
            total += steps;
        }
        if total != self.linked {
            return Err(InvariantError::new(format!(
                "{} nodes linked but counter says {}",
                total, self.linked
            )));
        }
        Ok(())
    }

    fn next_of(&self, id: SlotId) -> SlotId {
        self.arena
            .get(id)
            .and_then(|node| node.next)
            .expect("bucket link points to a freed node")
    }

    fn prev_of(&self, id: SlotId) -> SlotId {
        self.arena
            .get(id)
            .and_then(|node| node.prev)
            .expect("bucket link points to a freed node")
    }

    fn node_mut(&mut self, id: SlotId) -> &mut Node<K> {
        self.arena
            .get_mut(id)
            .expect("bucket link points to a freed node")
    }
}

/// Iterator over one class, front to back.
pub struct BucketIter<'a, K> {
    buckets: &'a FrequencyBuckets<K>,
    current: SlotId,
    tail: SlotId,
}

impl<'a, K> Iterator for BucketIter<'a, K> {
    type Item = (SlotId, &'a K);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.tail {
            return None;
        }
        let id = self.current;
        let node = self.buckets.arena.get(id)?;
        self.current = node.next?;
        node.key.as_ref().map(|key| (id, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(buckets: &FrequencyBuckets<&'static str>, class: usize) -> Vec<&'static str> {
        buckets.iter_bucket(class).map(|(_, k)| *k).collect()
    }

    #[test]
    fn class_for_clamps_both_ends() {
        let buckets: FrequencyBuckets<u32> = FrequencyBuckets::new(4);
        assert_eq!(buckets.class_for(0), 0);
        assert_eq!(buckets.class_for(1), 0);
        assert_eq!(buckets.class_for(3), 2);
        assert_eq!(buckets.class_for(4), 3);
        assert_eq!(buckets.class_for(u64::MAX), 3);
    }

    #[test]
    fn push_front_orders_newest_first() {
        let mut buckets = FrequencyBuckets::new(4);
        buckets.push_front(1, "a");
        buckets.push_front(1, "b");
        buckets.push_front(1, "c");
        assert_eq!(keys(&buckets, 0), vec!["c", "b", "a"]);
        assert_eq!(buckets.len(), 3);
        buckets.check_invariants().unwrap();
    }

    #[test]
    fn move_to_front_changes_class() {
        let mut buckets = FrequencyBuckets::new(4);
        let a = buckets.push_front(1, "a");
        buckets.push_front(1, "b");
        assert!(buckets.move_to_front(a, 2));
        assert_eq!(keys(&buckets, 0), vec!["b"]);
        assert_eq!(keys(&buckets, 1), vec!["a"]);
        assert_eq!(buckets.len(), 2);
        buckets.check_invariants().unwrap();
    }

    #[test]
    fn move_within_same_class_goes_to_front() {
        let mut buckets = FrequencyBuckets::new(4);
        let a = buckets.push_front(9, "a");
        buckets.push_front(9, "b");
        assert!(buckets.move_to_front(a, 12));
        assert_eq!(keys(&buckets, 3), vec!["a", "b"]);
    }

    #[test]
    fn pop_back_orphans_oldest() {
        let mut buckets = FrequencyBuckets::new(2);
        let a = buckets.push_front(1, "a");
        buckets.push_front(1, "b");
        assert_eq!(buckets.pop_back(0), Some(a));
        assert_eq!(buckets.class_of(a), None);
        assert_eq!(buckets.key(a), Some(&"a"));
        assert_eq!(buckets.len(), 1);
        // orphans cannot be moved, only relinked
        assert!(!buckets.move_to_front(a, 2));
        assert!(buckets.link_front(1, a));
        assert_eq!(buckets.class_of(a), Some(1));
        buckets.check_invariants().unwrap();
    }

    #[test]
    fn pop_back_empty_class_is_none() {
        let mut buckets: FrequencyBuckets<u8> = FrequencyBuckets::new(2);
        assert_eq!(buckets.pop_back(0), None);
        assert_eq!(buckets.pop_back(7), None);
    }

    #[test]
    fn link_front_rejects_linked_nodes() {
        let mut buckets = FrequencyBuckets::new(2);
        let a = buckets.push_front(1, "a");
        assert!(!buckets.link_front(1, a));
        assert!(buckets.delink(a));
        assert!(!buckets.delink(a));
        assert!(buckets.link_front(1, a));
        assert_eq!(buckets.class_of(a), Some(1));
    }

    #[test]
    fn release_frees_node() {
        let mut buckets = FrequencyBuckets::new(2);
        let a = buckets.push_front(1, "a");
        assert_eq!(buckets.release(a), Some("a"));
        assert_eq!(buckets.release(a), None);
        assert!(buckets.is_empty());
        buckets.check_invariants().unwrap();
    }

    #[test]
    fn clear_resets_everything() {
        let mut buckets = FrequencyBuckets::new(3);
        let a = buckets.push_front(1, "a");
        buckets.push_front(3, "b");
        buckets.clear();
        assert!(buckets.is_empty());
        assert_eq!(buckets.classes(), 3);
        assert_eq!(buckets.key(a), None);
        assert_eq!(buckets.bucket_len(2), 0);
        buckets.push_front(2, "c");
        assert_eq!(keys(&buckets, 1), vec!["c"]);
        buckets.check_invariants().unwrap();
    }
}
