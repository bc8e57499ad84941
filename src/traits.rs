//! Common traits for heap data structures
//!
//! This module provides a two-tier trait hierarchy for priority queues:
//!
//! - [`Heap`]: Base trait mirroring the `BinaryHeap`-style `push`/`peek`/`pop` API
//! - [`DecreaseKeyHeap`]: Extended trait adding handle-based `decrease_key` and `delete`
//!
//! Consumers such as [`crate::pathfinding`] are written against these traits
//! rather than against [`FibonacciHeap`](crate::fibonacci::FibonacciHeap) directly.

use std::fmt;

/// Error type for heap operations
///
/// Every error is local and recoverable: a call that returns an error leaves
/// the heap exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapError {
    /// The heap holds no entries
    EmptyHeap,
    /// The handle does not refer to a live entry of this heap
    InvalidHandle,
    /// The new priority is not strictly less than the current priority
    InvalidDecrease,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::EmptyHeap => write!(f, "heap is empty"),
            HeapError::InvalidHandle => {
                write!(f, "handle does not refer to a live entry of this heap")
            }
            HeapError::InvalidDecrease => {
                write!(f, "new priority is not less than current priority")
            }
        }
    }
}

impl std::error::Error for HeapError {}

/// A handle to an element in the heap, used for `decrease_key` and `delete`
///
/// This is an opaque token identifying one specific entry. It never relies on
/// the entry's priority, so duplicate priorities are fine.
pub trait Handle: Clone + PartialEq + Eq {}

/// Base trait for heap/priority queue data structures
///
/// This trait provides a simple API similar to Rust's `BinaryHeap`, except
/// that it is a min-heap storing (priority, item) pairs.
///
/// # Example
///
/// ```rust
/// use fibheap::Heap;
/// use fibheap::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// heap.push(3, "three");
/// heap.push(1, "one");
/// heap.push(2, "two");
///
/// assert_eq!(heap.peek(), Some((&1, &"one")));
/// assert_eq!(heap.pop(), Some((1, "one")));
/// ```
pub trait Heap<T, P: Ord> {
    /// Creates a new empty heap
    fn new() -> Self;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool;

    /// Returns the number of elements in the heap
    fn len(&self) -> usize;

    /// Inserts an element with the given priority
    fn push(&mut self, priority: P, item: T);

    /// Returns the minimum priority and associated item without removing it
    fn peek(&self) -> Option<(&P, &T)>;

    /// Removes and returns the minimum priority and associated item
    fn pop(&mut self) -> Option<(P, T)>;

    /// Merges another heap into this one, consuming the other heap
    fn merge(&mut self, other: Self);
}

/// Extended heap trait with `decrease_key` and `delete` support
///
/// # Example
///
/// ```rust
/// use fibheap::{DecreaseKeyHeap, Heap};
/// use fibheap::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.push_with_handle(10, "item");
/// heap.decrease_key(&handle, 5).unwrap();
/// assert_eq!(heap.peek(), Some((&5, &"item")));
/// ```
pub trait DecreaseKeyHeap<T, P: Ord>: Heap<T, P> {
    /// The handle type for this heap
    type Handle: Handle;

    /// Inserts an element with the given priority, returning a handle
    fn push_with_handle(&mut self, priority: P, item: T) -> Self::Handle;

    /// Decreases the priority of the element identified by the handle
    ///
    /// # Errors
    /// - [`HeapError::InvalidHandle`] if the element was already removed or
    ///   belongs to another heap
    /// - [`HeapError::InvalidDecrease`] if `new_priority` is not strictly
    ///   less than the current priority
    fn decrease_key(&mut self, handle: &Self::Handle, new_priority: P) -> Result<(), HeapError>;

    /// Removes the element identified by the handle, returning it
    ///
    /// # Errors
    /// [`HeapError::InvalidHandle`] under the same conditions as `decrease_key`.
    fn delete(&mut self, handle: &Self::Handle) -> Result<(P, T), HeapError>;
}
