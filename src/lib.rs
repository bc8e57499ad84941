//! Fibonacci-heap priority queue for Rust
//!
//! This crate provides a mergeable min-priority queue backed by a Fibonacci heap
//! (Fredman and Tarjan), with handle-based `decrease_key` and `delete`:
//!
//! - O(1) amortized insert, find-min, decrease_key, and merge
//! - O(log n) amortized delete-min and delete
//!
//! These bounds make it a good fit for algorithms that decrease keys far more
//! often than they extract minima, such as Dijkstra's shortest paths or Prim's
//! minimum spanning tree.
//!
//! Entries are stored in a slot-map arena and addressed by generational ids,
//! so handles detect removal and use against an unrelated heap.
//!
//! The heap is a single-threaded structure; share it across threads behind
//! your own lock.
//!
//! # Example
//!
//! ```rust
//! use fibheap::fibonacci::FibonacciHeap;
//! use fibheap::HeapError;
//!
//! let mut heap = FibonacciHeap::new();
//! let handle1 = heap.enqueue(5, "item1");
//! let _handle2 = heap.enqueue(3, "item2");
//! heap.decrease_key(&handle1, 1).unwrap();
//! assert_eq!(heap.min(), Ok((&1, &"item1")));
//! assert_eq!(heap.decrease_key(&handle1, 4), Err(HeapError::InvalidDecrease));
//! ```

pub mod fibonacci;
mod list;
#[cfg(feature = "pathfinding")]
pub mod pathfinding;
mod storage;
pub mod traits;

// Re-export the main traits for convenience
pub use fibonacci::{FibonacciHandle, FibonacciHeap};
pub use traits::{DecreaseKeyHeap, Heap, HeapError};
