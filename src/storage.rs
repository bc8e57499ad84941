//! Arena storage for heap entries
//!
//! Entries live in `slotmap` arenas and refer to each other by [`EntryId`]
//! instead of pointers, so relinking a tree is plain index reassignment and a
//! removed entry can never be reached through a stale id.
//!
//! # Segments
//!
//! Every heap owns a *home* segment: a `SlotMap` tagged with a process-unique
//! [`ArenaId`]. New entries always go into the home segment. Merging two heaps
//! moves whole segments from one arena to the other without touching the
//! entries inside them, so every id (and every handle built on one) issued by
//! either heap keeps working on the merged heap. An id whose segment is not
//! owned by an arena, or whose generational key has been removed, simply
//! fails to resolve.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Generational key of an entry inside one arena segment
    pub struct EntryKey;
}

/// Process-unique tag of an arena segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        ArenaId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable address of an entry: its segment plus its key within the segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    arena: ArenaId,
    key: EntryKey,
}

/// One stored (priority, item) pair plus its tree linkage
///
/// `left`/`right` always describe a valid ring, possibly of length one.
/// `parent` is a non-owning back reference; `child` is an arbitrary member of
/// the child ring.
#[derive(Debug)]
pub(crate) struct Entry<T, P> {
    pub(crate) priority: P,
    pub(crate) item: T,
    pub(crate) degree: usize,
    pub(crate) marked: bool,
    pub(crate) parent: Option<EntryId>,
    pub(crate) child: Option<EntryId>,
    pub(crate) left: EntryId,
    pub(crate) right: EntryId,
}

type Segment<T, P> = SlotMap<EntryKey, Entry<T, P>>;

/// Segmented entry arena owned by a single heap
#[derive(Debug)]
pub(crate) struct Arena<T, P> {
    home: ArenaId,
    segments: FxHashMap<ArenaId, Segment<T, P>>,
}

impl<T, P> Arena<T, P> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let home = ArenaId::next();
        let mut segments = FxHashMap::default();
        segments.insert(home, SlotMap::with_capacity_and_key(capacity));
        Arena { home, segments }
    }

    /// Stores a new entry as a singleton ring and returns its id
    pub(crate) fn insert(&mut self, priority: P, item: T) -> EntryId {
        let home = self.home;
        let segment = self
            .segments
            .entry(home)
            .or_insert_with(SlotMap::with_key);
        let key = segment.insert_with_key(|key| {
            let id = EntryId { arena: home, key };
            Entry {
                priority,
                item,
                degree: 0,
                marked: false,
                parent: None,
                child: None,
                left: id,
                right: id,
            }
        });
        EntryId { arena: home, key }
    }

    /// Frees an entry, returning it if it was live
    ///
    /// Foreign segments that become empty are dropped so merges and lookups
    /// stay proportional to the segments actually in use.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<Entry<T, P>> {
        let segment = self.segments.get_mut(&id.arena)?;
        let entry = segment.remove(id.key)?;
        if id.arena != self.home && segment.is_empty() {
            self.segments.remove(&id.arena);
        }
        Some(entry)
    }

    pub(crate) fn get(&self, id: EntryId) -> Option<&Entry<T, P>> {
        self.segments.get(&id.arena)?.get(id.key)
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry<T, P>> {
        self.segments.get_mut(&id.arena)?.get_mut(id.key)
    }

    pub(crate) fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Takes ownership of every segment of `other`
    ///
    /// The smaller segment map is drained into the larger one. The home
    /// segment of `self` stays the home segment.
    pub(crate) fn absorb(&mut self, mut other: Arena<T, P>) {
        if other.segments.len() > self.segments.len() {
            std::mem::swap(&mut self.segments, &mut other.segments);
        }
        self.segments.extend(other.segments.drain());
    }

    /// Drops every entry; ids issued so far stop resolving
    pub(crate) fn clear(&mut self) {
        let home = self.home;
        self.segments.retain(|&arena, _| arena == home);
        if let Some(segment) = self.segments.get_mut(&home) {
            segment.clear();
        }
    }

    /// Number of live entries across all segments
    pub(crate) fn count(&self) -> usize {
        self.segments.values().map(|segment| segment.len()).sum()
    }

    #[cfg(test)]
    pub(crate) fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl<T, P> Index<EntryId> for Arena<T, P> {
    type Output = Entry<T, P>;

    /// Internal links must always resolve; a miss is a broken heap invariant.
    fn index(&self, id: EntryId) -> &Entry<T, P> {
        match self.get(id) {
            Some(entry) => entry,
            None => panic!("dangling entry id {:?}", id),
        }
    }
}

impl<T, P> IndexMut<EntryId> for Arena<T, P> {
    fn index_mut(&mut self, id: EntryId) -> &mut Entry<T, P> {
        match self.get_mut(id) {
            Some(entry) => entry,
            None => panic!("dangling entry id {:?}", id),
        }
    }
}
