//! Circular doubly-linked rings over arena entries
//!
//! Every entry is a member of exactly one ring at all times: the heap's root
//! ring or some parent's child ring, possibly as a ring of one. These
//! primitives are the only code that writes `left`/`right`.
//!
//! In a circular list:
//! - a single entry points to itself in both directions
//! - there is no head or tail, any member can be the entry point
//! - splicing two rings together is O(1)

use crate::storage::{Arena, EntryId};

impl<T, P> Arena<T, P> {
    /// Makes `id` a ring of one.
    ///
    /// Only valid when nothing else still points at `id` as a sibling.
    #[inline]
    pub(crate) fn make_singleton(&mut self, id: EntryId) {
        let entry = &mut self[id];
        entry.left = id;
        entry.right = id;
    }

    /// Splices two rings together, returning an entry point into the result.
    ///
    /// `None` stands for the empty ring. With two non-empty rings the result
    /// is entered at `a`:
    ///
    /// ```text
    /// before:  ... <-> a_left <-> a <-> ...      ... <-> b_left <-> b <-> ...
    /// after:   ... <-> a_left <-> b <-> ... <-> b_left <-> a <-> ...
    /// ```
    pub(crate) fn splice(&mut self, a: Option<EntryId>, b: Option<EntryId>) -> Option<EntryId> {
        match (a, b) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => {
                let a_left = self[a].left;
                let b_left = self[b].left;

                self[a_left].right = b;
                self[b].left = a_left;

                self[b_left].right = a;
                self[a].left = b_left;

                Some(a)
            }
        }
    }

    /// Unlinks `id` from its ring and leaves it as a ring of one.
    ///
    /// Returns a surviving member of the old ring, or `None` if `id` was its
    /// only member.
    pub(crate) fn detach(&mut self, id: EntryId) -> Option<EntryId> {
        let left = self[id].left;
        let right = self[id].right;
        if right == id {
            return None;
        }

        self[left].right = right;
        self[right].left = left;
        self.make_singleton(id);
        Some(right)
    }

    /// Snapshot of a ring's members in `right` order, starting at `start`.
    ///
    /// The snapshot lets callers relink members while walking them.
    pub(crate) fn ring(&self, start: EntryId) -> Vec<EntryId> {
        let mut members = vec![start];
        let mut current = self[start].right;
        while current != start {
            members.push(current);
            current = self[current].right;
        }
        members
    }

    /// Number of members in the ring containing `start`. O(n).
    #[cfg(test)]
    pub(crate) fn ring_len(&self, start: EntryId) -> usize {
        let mut count = 1;
        let mut current = self[start].right;
        while current != start {
            count += 1;
            current = self[current].right;
        }
        count
    }
}
