//! Fibonacci Heap implementation
//!
//! A Fibonacci heap is a data structure for priority queue operations with:
//! - O(1) amortized insert, find-min, decrease_key, and merge
//! - O(log n) amortized delete_min and delete
//!
//! The structure consists of a collection of heap-ordered trees. Roots are linked
//! in a circular doubly linked list and the heap keeps the id of the minimum root.
//! Entries live in a slot-map arena and link to each other by
//! id, so cuts and splices are index reassignments.
//!
//! # Algorithms
//!
//! - **Insert/merge** splice singleton rings (or whole root rings) together.
//! - **Delete-min** promotes the minimum's children to roots, then
//!   *consolidates*: roots of equal degree are linked until every root degree
//!   is distinct.
//! - **Decrease-key** cuts a node that now beats its parent into the root
//!   ring and runs the *cascading cut*: each ancestor that already lost a
//!   child (is marked) is cut as well, the first unmarked one is marked.
//! - **Delete** treats the entry as smaller than everything, cuts it to the
//!   root ring and extracts it.

use crate::storage::{Arena, EntryId};
use crate::traits::{DecreaseKeyHeap, Handle, Heap, HeapError};
use log::{debug, trace, warn};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Handle to an element in a Fibonacci heap
///
/// Handles stay valid across merges: a handle issued by either input of
/// [`FibonacciHeap::merge_pair`] (or by the absorbed side of
/// [`Heap::merge`]) refers to the same entry in the merged heap. Once the
/// entry is removed, or when used with an unrelated heap, operations on the
/// handle fail with [`HeapError::InvalidHandle`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FibonacciHandle {
    id: EntryId,
}

impl Handle for FibonacciHandle {}

/// Fibonacci Heap
///
/// A min-heap of `(priority, item)` pairs. Use `T = ()` for a priority-only
/// queue.
///
/// # Example
///
/// ```rust
/// use fibheap::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.enqueue(5, "item");
/// heap.enqueue(3, "other");
/// heap.decrease_key(&handle, 1).unwrap();
/// assert_eq!(heap.min(), Ok((&1, &"item")));
/// assert_eq!(heap.dequeue_min(), Ok((1, "item")));
/// assert_eq!(heap.len(), 1);
/// ```
pub struct FibonacciHeap<T, P: Ord> {
    arena: Arena<T, P>,
    min: Option<EntryId>,
    len: usize,
}

impl<T, P: Ord> FibonacciHeap<T, P> {
    /// Creates an empty heap
    pub fn new() -> Self {
        FibonacciHeap {
            arena: Arena::new(),
            min: None,
            len: 0,
        }
    }

    /// Creates an empty heap with room for `capacity` entries before the
    /// arena reallocates
    pub fn with_capacity(capacity: usize) -> Self {
        FibonacciHeap {
            arena: Arena::with_capacity(capacity),
            min: None,
            len: 0,
        }
    }

    /// Returns true if the heap holds no entries
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// Returns the number of entries in the heap
    pub fn len(&self) -> usize {
        self.len
    }

    /// Inserts an entry and returns a handle for later `decrease_key`/`delete`
    ///
    /// # Time Complexity
    /// O(1)
    pub fn enqueue(&mut self, priority: P, item: T) -> FibonacciHandle {
        let id = self.arena.insert(priority, item);
        self.add_root(id);
        self.len += 1;
        FibonacciHandle { id }
    }

    /// Returns the minimum priority and its item without removing them
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap is empty.
    pub fn min(&self) -> Result<(&P, &T), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let entry = &self.arena[min];
        Ok((&entry.priority, &entry.item))
    }

    /// Returns the priority and item of a live entry
    pub fn get(&self, handle: &FibonacciHandle) -> Result<(&P, &T), HeapError> {
        let entry = self.arena.get(handle.id).ok_or(HeapError::InvalidHandle)?;
        Ok((&entry.priority, &entry.item))
    }

    /// Returns a mutable reference to the item of a live entry
    ///
    /// The priority is not reachable this way; change it with
    /// [`decrease_key`](Self::decrease_key).
    pub fn item_mut(&mut self, handle: &FibonacciHandle) -> Result<&mut T, HeapError> {
        let entry = self
            .arena
            .get_mut(handle.id)
            .ok_or(HeapError::InvalidHandle)?;
        Ok(&mut entry.item)
    }

    /// Returns true if the handle refers to a live entry of this heap
    pub fn contains(&self, handle: &FibonacciHandle) -> bool {
        self.arena.contains(handle.id)
    }

    /// Removes and returns the entry with the minimum priority
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap is empty.
    ///
    /// # Time Complexity
    /// O(log n) amortized
    pub fn dequeue_min(&mut self) -> Result<(P, T), HeapError> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;

        // Promote children to roots
        if let Some(child) = self.arena[min].child.take() {
            for id in self.arena.ring(child) {
                let entry = &mut self.arena[id];
                entry.parent = None;
                entry.marked = false;
            }
            self.arena.splice(Some(min), Some(child));
            self.arena[min].degree = 0;
        }

        let rest = self.arena.detach(min);
        let Some(entry) = self.arena.remove(min) else {
            unreachable!("minimum root {:?} is not in the arena", min);
        };
        self.len -= 1;

        match rest {
            Some(start) => self.consolidate(start),
            None => self.min = None,
        }

        Ok((entry.priority, entry.item))
    }

    /// Decreases the priority of the entry identified by `handle`
    ///
    /// # Errors
    /// - [`HeapError::InvalidHandle`] if the entry is not live in this heap
    /// - [`HeapError::InvalidDecrease`] if `new_priority` is not strictly less
    ///   than the current priority
    ///
    /// Either error leaves the heap unchanged.
    ///
    /// # Time Complexity
    /// O(1) amortized
    pub fn decrease_key(
        &mut self,
        handle: &FibonacciHandle,
        new_priority: P,
    ) -> Result<(), HeapError> {
        let id = handle.id;
        let entry = self.arena.get_mut(id).ok_or(HeapError::InvalidHandle)?;
        if new_priority >= entry.priority {
            return Err(HeapError::InvalidDecrease);
        }
        entry.priority = new_priority;

        if let Some(parent) = entry.parent {
            if self.arena[id].priority < self.arena[parent].priority {
                self.cut(id);
                self.cascading_cut(parent);
                return Ok(());
            }
        } else if let Some(min) = self.min {
            if self.arena[id].priority < self.arena[min].priority {
                self.min = Some(id);
            }
        }
        Ok(())
    }

    /// Removes the entry identified by `handle` and returns it
    ///
    /// The entry is treated as smaller than every other priority: it is cut
    /// to the root ring, made the minimum, and extracted.
    ///
    /// # Errors
    /// [`HeapError::InvalidHandle`] if the entry is not live in this heap.
    ///
    /// # Time Complexity
    /// O(log n) amortized
    pub fn delete(&mut self, handle: &FibonacciHandle) -> Result<(P, T), HeapError> {
        let id = handle.id;
        let parent = self.arena.get(id).ok_or(HeapError::InvalidHandle)?.parent;
        if let Some(parent) = parent {
            self.cut(id);
            self.cascading_cut(parent);
        }
        self.min = Some(id);
        self.dequeue_min()
    }

    /// Moves every entry of `a` and `b` into a new heap, leaving both empty
    ///
    /// Handles issued by either input refer to the same entries in the
    /// returned heap.
    ///
    /// # Time Complexity
    /// O(1) for the heap structure; arena segments move smaller-into-larger
    pub fn merge_pair(a: &mut Self, b: &mut Self) -> Self {
        let mut merged = std::mem::take(a);
        merged.absorb(std::mem::take(b));
        merged
    }

    /// Drops every entry. Outstanding handles become invalid.
    pub fn clear(&mut self) {
        debug!("clearing fibonacci heap of {} entries", self.len);
        self.arena.clear();
        self.min = None;
        self.len = 0;
    }

    /// Drains the heap into a vector ordered by non-decreasing priority
    pub fn into_sorted_vec(mut self) -> Vec<(P, T)> {
        let mut sorted = Vec::with_capacity(self.len);
        while let Ok(pair) = self.dequeue_min() {
            sorted.push(pair);
        }
        sorted
    }

    /// Walks the whole forest and checks every structural invariant
    ///
    /// Checks ring symmetry, parent links, degree counts, heap order, the
    /// entry count, and that the minimum pointer names the smallest root.
    /// The first violation found is logged at `warn` level.
    pub fn check_invariants(&self) -> bool {
        match self.find_violation() {
            Some(violation) => {
                warn!("fibonacci heap invariant violated: {}", violation);
                false
            }
            None => true,
        }
    }

    fn find_violation(&self) -> Option<String> {
        let min = match self.min {
            Some(min) => min,
            None => {
                if self.len != 0 || self.arena.count() != 0 {
                    return Some(format!("empty heap reports len {}", self.len));
                }
                return None;
            }
        };

        let mut seen = 0;
        let mut stack = Vec::new();
        for root in self.arena.ring(min) {
            if self.arena[root].parent.is_some() {
                return Some(format!("root {:?} has a parent", root));
            }
            if self.arena[root].priority < self.arena[min].priority {
                return Some(format!("root {:?} is below the minimum", root));
            }
            stack.push(root);
        }

        while let Some(id) = stack.pop() {
            seen += 1;
            let entry = &self.arena[id];
            if self.arena[entry.right].left != id || self.arena[entry.left].right != id {
                return Some(format!("ring around {:?} is not symmetric", id));
            }
            let children = match entry.child {
                Some(child) => self.arena.ring(child),
                None => Vec::new(),
            };
            if children.len() != entry.degree {
                return Some(format!(
                    "{:?} has degree {} but {} children",
                    id,
                    entry.degree,
                    children.len()
                ));
            }
            if entry.degree > max_degree(self.len) {
                return Some(format!("{:?} has degree {} above the bound", id, entry.degree));
            }
            for child in children {
                let child_entry = &self.arena[child];
                if child_entry.parent != Some(id) {
                    return Some(format!("{:?} does not point back to {:?}", child, id));
                }
                if child_entry.priority < entry.priority {
                    return Some(format!("{:?} is smaller than its parent {:?}", child, id));
                }
                stack.push(child);
            }
        }

        if seen != self.len || self.arena.count() != self.len {
            return Some(format!(
                "len is {} but {} entries are reachable and {} stored",
                self.len,
                seen,
                self.arena.count()
            ));
        }
        None
    }

    /// Splices a ring of parentless entries into the root ring, updating the
    /// minimum if the ring's entry point is smaller
    fn add_root(&mut self, id: EntryId) {
        match self.min {
            Some(min) => {
                self.arena.splice(Some(min), Some(id));
                if self.arena[id].priority < self.arena[min].priority {
                    self.min = Some(id);
                }
            }
            None => self.min = Some(id),
        }
    }

    /// Links every tree of `other` into this heap
    fn absorb(&mut self, other: Self) {
        let FibonacciHeap { arena, min, len } = other;
        let other_min = match min {
            Some(min) => min,
            None => return,
        };
        debug!("merging fibonacci heaps of {} and {} entries", self.len, len);

        self.arena.absorb(arena);
        self.len += len;
        self.add_root(other_min);
    }

    /// Links roots of equal degree until all root degrees are distinct,
    /// then rebuilds the root ring and finds the new minimum
    fn consolidate(&mut self, start: EntryId) {
        let roots = self.arena.ring(start);
        let mut by_degree: SmallVec<[Option<EntryId>; DEGREE_TABLE_INLINE]> =
            smallvec![None; max_degree(self.len) + 1];

        for &root in &roots {
            let mut x = root;
            let mut degree = self.arena[x].degree;
            loop {
                if degree >= by_degree.len() {
                    by_degree.resize(degree + 1, None);
                }
                let mut y = match by_degree[degree].take() {
                    Some(y) => y,
                    None => {
                        by_degree[degree] = Some(x);
                        break;
                    }
                };
                if self.arena[y].priority < self.arena[x].priority {
                    std::mem::swap(&mut x, &mut y);
                }
                self.link(y, x);
                degree += 1;
            }
        }

        self.min = None;
        let mut remaining = 0;
        for root in by_degree.into_iter().flatten() {
            self.arena.make_singleton(root);
            self.add_root(root);
            remaining += 1;
        }
        trace!(
            "consolidated {} roots into {} for {} entries",
            roots.len(),
            remaining,
            self.len
        );
    }

    /// Makes root `y` a child of root `x`
    fn link(&mut self, y: EntryId, x: EntryId) {
        self.arena.detach(y);
        {
            let child = &mut self.arena[y];
            child.parent = Some(x);
            child.marked = false;
        }
        let first_child = self.arena[x].child;
        let child = self.arena.splice(first_child, Some(y));
        let parent = &mut self.arena[x];
        parent.child = child;
        parent.degree += 1;
    }

    /// Cuts `id` from its parent's child ring and adds it to the root ring
    fn cut(&mut self, id: EntryId) {
        let parent = match self.arena[id].parent.take() {
            Some(parent) => parent,
            None => return,
        };

        let rest = self.arena.detach(id);
        let parent_entry = &mut self.arena[parent];
        if parent_entry.child == Some(id) {
            parent_entry.child = rest;
        }
        parent_entry.degree -= 1;

        self.arena[id].marked = false;
        self.add_root(id);
    }

    /// Marks `id` if it has not lost a child yet, otherwise cuts it and
    /// continues with its parent. Stops at a root.
    fn cascading_cut(&mut self, mut id: EntryId) {
        let mut cuts = 0;
        while let Some(parent) = self.arena[id].parent {
            if !self.arena[id].marked {
                self.arena[id].marked = true;
                break;
            }
            self.cut(id);
            cuts += 1;
            id = parent;
        }
        if cuts > 0 {
            trace!("cascading cut promoted {} marked ancestors", cuts);
        }
    }
}

/// Degree-table slots kept on the stack during consolidation
///
/// `max_degree` stays below this for any heap of at most 2^43 entries;
/// larger heaps spill the table to the heap.
const DEGREE_TABLE_INLINE: usize = 64;

/// Upper bound on any node's degree in a heap of `len` entries
///
/// A node of degree `k` roots at least `F(k+2) >= phi^k` entries, so no
/// degree exceeds `log_phi(len)`.
fn max_degree(len: usize) -> usize {
    const LN_PHI: f64 = 0.481_211_825_059_603_4;
    if len <= 1 {
        return 1;
    }
    ((len as f64).ln() / LN_PHI) as usize + 1
}

impl<T, P: Ord> Default for FibonacciHeap<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P: Ord + fmt::Debug> fmt::Debug for FibonacciHeap<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FibonacciHeap")
            .field("len", &self.len)
            .field("min", &self.min().ok().map(|(priority, _)| priority))
            .finish()
    }
}

impl<T, P: Ord> FromIterator<(P, T)> for FibonacciHeap<T, P> {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut heap = Self::with_capacity(iter.size_hint().0);
        heap.extend(iter);
        heap
    }
}

impl<T, P: Ord> Extend<(P, T)> for FibonacciHeap<T, P> {
    fn extend<I: IntoIterator<Item = (P, T)>>(&mut self, iter: I) {
        for (priority, item) in iter {
            self.enqueue(priority, item);
        }
    }
}

impl<T, P: Ord> Heap<T, P> for FibonacciHeap<T, P> {
    fn new() -> Self {
        FibonacciHeap::new()
    }

    fn is_empty(&self) -> bool {
        FibonacciHeap::is_empty(self)
    }

    fn len(&self) -> usize {
        FibonacciHeap::len(self)
    }

    fn push(&mut self, priority: P, item: T) {
        self.enqueue(priority, item);
    }

    fn peek(&self) -> Option<(&P, &T)> {
        self.min().ok()
    }

    fn pop(&mut self) -> Option<(P, T)> {
        self.dequeue_min().ok()
    }

    fn merge(&mut self, other: Self) {
        self.absorb(other);
    }
}

impl<T, P: Ord> DecreaseKeyHeap<T, P> for FibonacciHeap<T, P> {
    type Handle = FibonacciHandle;

    fn push_with_handle(&mut self, priority: P, item: T) -> Self::Handle {
        self.enqueue(priority, item)
    }

    fn decrease_key(&mut self, handle: &Self::Handle, new_priority: P) -> Result<(), HeapError> {
        FibonacciHeap::decrease_key(self, handle, new_priority)
    }

    fn delete(&mut self, handle: &Self::Handle) -> Result<(P, T), HeapError> {
        FibonacciHeap::delete(self, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(heap: &mut FibonacciHeap<(), i32>) -> Vec<i32> {
        let mut out = Vec::new();
        while let Ok((priority, ())) = heap.dequeue_min() {
            assert!(heap.check_invariants());
            out.push(priority);
        }
        out
    }

    #[test]
    fn test_basic_operations() {
        let mut heap = FibonacciHeap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);

        heap.enqueue(5, "a");
        heap.enqueue(3, "b");
        heap.enqueue(7, "c");

        assert_eq!(heap.len(), 3);
        assert_eq!(heap.min(), Ok((&3, &"b")));

        assert_eq!(heap.dequeue_min(), Ok((3, "b")));
        assert_eq!(heap.min(), Ok((&5, &"a")));
        assert!(heap.check_invariants());
    }

    #[test]
    fn test_empty_heap_errors() {
        let mut heap: FibonacciHeap<(), i32> = FibonacciHeap::new();
        assert_eq!(heap.min(), Err(HeapError::EmptyHeap));
        assert_eq!(heap.dequeue_min(), Err(HeapError::EmptyHeap));
        assert!(heap.check_invariants());
    }

    #[test]
    fn test_single_entry() {
        let mut heap = FibonacciHeap::new();
        let handle = heap.enqueue(1, ());
        assert_eq!(heap.dequeue_min(), Ok((1, ())));
        assert!(heap.is_empty());
        assert_eq!(heap.decrease_key(&handle, 0), Err(HeapError::InvalidHandle));
        assert_eq!(heap.delete(&handle), Err(HeapError::InvalidHandle));
        assert!(heap.check_invariants());
    }

    #[test]
    fn test_dequeue_order() {
        let mut heap = FibonacciHeap::new();
        for p in [5, 3, 8, 1, 9, 2] {
            heap.enqueue(p, ());
        }
        let mut expected_len = 6;
        let mut out = Vec::new();
        while let Ok((p, ())) = heap.dequeue_min() {
            expected_len -= 1;
            assert_eq!(heap.len(), expected_len);
            out.push(p);
        }
        assert_eq!(out, vec![1, 2, 3, 5, 8, 9]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_decrease_key() {
        let mut heap = FibonacciHeap::new();
        let _h1 = heap.enqueue(10, "a");
        let h2 = heap.enqueue(20, "b");
        let h3 = heap.enqueue(30, "c");

        assert_eq!(heap.min(), Ok((&10, &"a")));

        heap.decrease_key(&h2, 5).unwrap();
        assert_eq!(heap.min(), Ok((&5, &"b")));

        heap.decrease_key(&h3, 1).unwrap();
        assert_eq!(heap.min(), Ok((&1, &"c")));
        assert!(heap.check_invariants());
    }

    #[test]
    fn test_decrease_key_rejects_non_decrease() {
        let mut heap = FibonacciHeap::new();
        let h = heap.enqueue(10, ());
        heap.enqueue(4, ());
        assert_eq!(heap.decrease_key(&h, 10), Err(HeapError::InvalidDecrease));
        assert_eq!(heap.decrease_key(&h, 11), Err(HeapError::InvalidDecrease));
        assert_eq!(heap.get(&h), Ok((&10, &())));
        assert_eq!(drain(&mut heap), vec![4, 10]);
    }

    #[test]
    fn test_decrease_key_inside_tree() {
        let mut heap = FibonacciHeap::new();
        let handles: Vec<_> = (0..8).map(|i| heap.enqueue(i * 10, ())).collect();
        // Seven survivors consolidate into trees of degree 2, 1 and 0
        assert_eq!(heap.dequeue_min(), Ok((0, ())));
        assert!(heap.check_invariants());

        // A decrease that keeps heap order does not restructure
        heap.decrease_key(&handles[7], 65).unwrap();
        assert!(heap.check_invariants());

        heap.decrease_key(&handles[6], 5).unwrap();
        assert_eq!(heap.min(), Ok((&5, &())));
        assert!(heap.check_invariants());
        assert_eq!(drain(&mut heap), vec![5, 10, 20, 30, 40, 50, 65]);
    }

    #[test]
    fn test_cascading_cut_marks_and_cuts() {
        let mut heap = FibonacciHeap::new();
        let handles: Vec<_> = (0..17).map(|i| heap.enqueue(i, ())).collect();
        heap.dequeue_min().unwrap();
        // Sixteen entries consolidate into a single tree of degree four
        let root = heap.min.unwrap();
        assert_eq!(heap.arena.ring_len(root), 1);
        assert_eq!(heap.arena[root].degree, 4);

        // Cut the deepest leaves one by one; marks accumulate then cascade
        for handle in handles.iter().rev().take(8) {
            heap.decrease_key(handle, -1 - heap.get(handle).unwrap().0).unwrap();
            assert!(heap.check_invariants());
        }
        let mut expected: Vec<i32> = (1..=8).collect();
        expected.extend((9..17).map(|i| -1 - i));
        expected.sort();
        assert_eq!(drain(&mut heap), expected);
    }

    #[test]
    fn test_delete() {
        let mut heap = FibonacciHeap::new();
        let handles: Vec<_> = [5, 3, 8, 1, 9, 2]
            .iter()
            .map(|&p| heap.enqueue(p, ()))
            .collect();
        heap.dequeue_min().unwrap();

        assert_eq!(heap.delete(&handles[2]), Ok((8, ())));
        assert_eq!(heap.delete(&handles[2]), Err(HeapError::InvalidHandle));
        assert!(!heap.contains(&handles[2]));
        assert!(heap.check_invariants());
        assert_eq!(drain(&mut heap), vec![2, 3, 5, 9]);
    }

    #[test]
    fn test_delete_with_duplicate_priorities() {
        let mut heap = FibonacciHeap::new();
        let a = heap.enqueue(4, "a");
        let b = heap.enqueue(4, "b");
        let c = heap.enqueue(4, "c");
        heap.enqueue(1, "d");
        heap.dequeue_min().unwrap();

        assert_eq!(heap.delete(&b), Ok((4, "b")));
        assert_eq!(heap.get(&a), Ok((&4, &"a")));
        assert_eq!(heap.get(&c), Ok((&4, &"c")));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_merge() {
        let mut heap1 = FibonacciHeap::new();
        heap1.enqueue(5, "a");
        heap1.enqueue(10, "b");

        let mut heap2 = FibonacciHeap::new();
        heap2.enqueue(3, "c");
        heap2.enqueue(7, "d");

        Heap::merge(&mut heap1, heap2);
        assert_eq!(heap1.min(), Ok((&3, &"c")));
        assert_eq!(heap1.len(), 4);
        assert!(heap1.check_invariants());
    }

    #[test]
    fn test_merge_pair_keeps_handles() {
        let mut a = FibonacciHeap::new();
        let mut b = FibonacciHeap::new();
        let ha = a.enqueue(10, "a");
        let hb = b.enqueue(20, "b");
        b.enqueue(30, "c");

        let mut merged = FibonacciHeap::merge_pair(&mut a, &mut b);
        assert!(a.is_empty());
        assert!(b.is_empty());
        assert_eq!(merged.len(), 3);

        assert_eq!(b.decrease_key(&hb, 1), Err(HeapError::InvalidHandle));
        merged.decrease_key(&hb, 1).unwrap();
        assert_eq!(merged.min(), Ok((&1, &"b")));
        assert_eq!(merged.delete(&ha), Ok((10, "a")));
        assert!(merged.check_invariants());

        // The emptied inputs remain usable
        a.enqueue(2, "x");
        assert_eq!(a.min(), Ok((&2, &"x")));
    }

    #[test]
    fn test_merge_with_empty() {
        let mut a: FibonacciHeap<(), i32> = FibonacciHeap::new();
        let mut b = FibonacciHeap::new();
        b.enqueue(1, ());
        let mut merged = FibonacciHeap::merge_pair(&mut a, &mut b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.dequeue_min(), Ok((1, ())));

        let mut empty = FibonacciHeap::merge_pair(&mut a, &mut b);
        assert!(empty.is_empty());
        assert_eq!(empty.dequeue_min(), Err(HeapError::EmptyHeap));
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut a = FibonacciHeap::new();
        let mut b = FibonacciHeap::new();
        let ha = a.enqueue(1, ());
        b.enqueue(1, ());
        assert_eq!(b.decrease_key(&ha, 0), Err(HeapError::InvalidHandle));
        assert_eq!(b.delete(&ha), Err(HeapError::InvalidHandle));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_item_mut_and_clear() {
        let mut heap = FibonacciHeap::new();
        let h = heap.enqueue(3, String::from("x"));
        heap.item_mut(&h).unwrap().push('y');
        assert_eq!(heap.get(&h), Ok((&3, &String::from("xy"))));

        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.get(&h), Err(HeapError::InvalidHandle));
        assert!(heap.check_invariants());
    }

    #[test]
    fn test_collect_and_sorted_vec() {
        let heap: FibonacciHeap<char, i32> =
            vec![(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
        assert_eq!(heap.into_sorted_vec(), vec![(1, 'a'), (2, 'b'), (3, 'c')]);
    }

    #[test]
    fn test_consolidate_large_heap() {
        let n = (1 << 17) + 1;
        let mut heap: FibonacciHeap<(), i32> = (0..n).rev().map(|p| (p, ())).collect();
        assert_eq!(heap.dequeue_min(), Ok((0, ())));
        // 2^17 singletons link into one binomial tree of degree 17
        let root = heap.min.unwrap();
        assert_eq!(heap.arena.ring_len(root), 1);
        assert_eq!(heap.arena[root].degree, 17);
        assert!(heap.check_invariants());

        for expected in 1..200 {
            assert_eq!(heap.dequeue_min(), Ok((expected, ())));
        }
        assert!(heap.check_invariants());
        assert_eq!(heap.len(), n as usize - 200);
    }

    #[test]
    fn test_degree_table_inline_capacity() {
        assert!(max_degree(1 << 43) + 1 <= DEGREE_TABLE_INLINE);
        // Beyond that the table spills instead of overflowing
        assert!(max_degree(usize::MAX) + 1 > DEGREE_TABLE_INLINE);
    }

    #[test]
    fn test_max_degree_bound() {
        assert_eq!(max_degree(0), 1);
        assert_eq!(max_degree(1), 1);
        // F(k+2) <= n: 16 entries allow degree 4 (binomial tree B4 has 16 nodes)
        assert!(max_degree(16) >= 4);
        assert!(max_degree(1 << 20) < 40);
    }
}
