//! Dijkstra's and A* search on top of the heap's `decrease_key`
//!
//! The open set is any [`DecreaseKeyHeap`]; when a cheaper route to a queued
//! node is found its entry is decreased in place instead of being pushed
//! again, which is exactly the access pattern Fibonacci heaps are built for.
//!
//! # Design
//!
//! Only lightweight indices are stored in the heap. Node states live in a
//! vector of per-node records, and a fast hash map (FxHash) maps a node
//! state to its index.
//!
//! Dijkstra is A* with a zero heuristic; both share one search loop.
//!
//! # Example
//!
//! ```rust
//! use fibheap::pathfinding::{SearchNode, dijkstra};
//! use fibheap::FibonacciHeap;
//!
//! // Node carries its goal coordinates
//! #[derive(Clone, PartialEq, Eq, Hash)]
//! struct GridPos { x: i32, y: i32, goal_x: i32, goal_y: i32 }
//!
//! impl SearchNode for GridPos {
//!     type Cost = u32;
//!
//!     fn successors(&self) -> Vec<(Self, Self::Cost)> {
//!         let step = |x, y| GridPos { x, y, goal_x: self.goal_x, goal_y: self.goal_y };
//!         vec![
//!             (step(self.x + 1, self.y), 1),
//!             (step(self.x - 1, self.y), 1),
//!             (step(self.x, self.y + 1), 1),
//!             (step(self.x, self.y - 1), 1),
//!         ]
//!     }
//!
//!     fn is_goal(&self) -> bool {
//!         self.x == self.goal_x && self.y == self.goal_y
//!     }
//! }
//!
//! let start = GridPos { x: 0, y: 0, goal_x: 2, goal_y: 2 };
//! let (path, cost) = dijkstra::<_, FibonacciHeap<_, _>>(&start).unwrap();
//! assert_eq!(cost, 4); // Manhattan distance
//! assert_eq!(path.len(), 5);
//! ```

use crate::traits::DecreaseKeyHeap;
use log::debug;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::hash::Hash;
use std::ops::Add;

/// Types usable as path costs: ordered, copyable, addable, with
/// `Default::default()` as zero.
pub trait Cost: Ord + Copy + Add<Output = Self> + Default {}

impl<T> Cost for T where T: Ord + Copy + Add<Output = Self> + Default {}

/// A node of an implicit search graph
///
/// The node carries whatever context it needs to enumerate its successors
/// and recognise a goal.
pub trait SearchNode: Clone + Eq + Hash {
    /// Edge weight type
    type Cost: Cost;

    /// Returns every neighbour together with the cost of the edge to it
    fn successors(&self) -> Vec<(Self, Self::Cost)>;

    /// Returns true if the search may stop at this node
    fn is_goal(&self) -> bool;
}

/// A node that can estimate its remaining cost for A* search
///
/// The estimate must never exceed the true remaining cost, or A* may return
/// a suboptimal path.
pub trait AStarNode: SearchNode {
    /// Admissible estimate of the cost from this node to a goal
    fn heuristic(&self) -> Self::Cost;
}

/// Heap priority of a queued node, ordered by f-score only
#[derive(Debug, Clone, Copy)]
pub struct PriorityCost<C> {
    /// g + h (h is zero for Dijkstra)
    pub f_score: C,
    /// Cost from the start
    pub g_score: C,
}

impl<C: Ord> PartialEq for PriorityCost<C> {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score
    }
}

impl<C: Ord> Eq for PriorityCost<C> {}

impl<C: Ord> PartialOrd for PriorityCost<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Ord> Ord for PriorityCost<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score.cmp(&other.f_score)
    }
}

/// Index of a discovered node; this is the item stored in the heap
pub type NodeIndex = usize;

struct NodeRecord<N: SearchNode, H> {
    node: N,
    g_score: N::Cost,
    /// Present while the node sits in the open set
    handle: Option<H>,
    came_from: Option<NodeIndex>,
    closed: bool,
}

/// Open/closed bookkeeping for one search
struct Frontier<N: SearchNode, H> {
    records: Vec<NodeRecord<N, H>>,
    index_of: FxHashMap<N, NodeIndex>,
}

impl<N: SearchNode, H> Frontier<N, H> {
    fn new() -> Self {
        Frontier {
            records: Vec::new(),
            index_of: FxHashMap::default(),
        }
    }

    /// Returns the index for `node`, creating a record if it is new
    fn index(&mut self, node: &N, g_score: N::Cost) -> (NodeIndex, bool) {
        if let Some(&index) = self.index_of.get(node) {
            return (index, false);
        }
        let index = self.records.len();
        self.index_of.insert(node.clone(), index);
        self.records.push(NodeRecord {
            node: node.clone(),
            g_score,
            handle: None,
            came_from: None,
            closed: false,
        });
        (index, true)
    }

    fn path_to(&self, mut current: NodeIndex) -> Vec<N> {
        let mut path = vec![self.records[current].node.clone()];
        while let Some(previous) = self.records[current].came_from {
            path.push(self.records[previous].node.clone());
            current = previous;
        }
        path.reverse();
        path
    }
}

/// Limits applied to a search
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits<C> {
    /// Nodes whose cost from the start exceeds this are never expanded
    pub max_cost: Option<C>,
    /// Give up after settling this many nodes
    pub max_nodes: Option<usize>,
}

impl<C> Default for SearchLimits<C> {
    fn default() -> Self {
        SearchLimits {
            max_cost: None,
            max_nodes: None,
        }
    }
}

/// Runs Dijkstra's algorithm from `start` until a node satisfies `is_goal()`.
///
/// Returns the path (start and goal inclusive) and its cost, or `None` if no
/// goal is reachable.
pub fn dijkstra<N, H>(start: &N) -> Option<(Vec<N>, N::Cost)>
where
    N: SearchNode,
    H: DecreaseKeyHeap<NodeIndex, PriorityCost<N::Cost>>,
{
    dijkstra_with_limits::<N, H>(start, SearchLimits::default())
}

/// Runs Dijkstra's algorithm under the given limits.
///
/// Returns `None` if no goal is reachable within them.
pub fn dijkstra_with_limits<N, H>(
    start: &N,
    limits: SearchLimits<N::Cost>,
) -> Option<(Vec<N>, N::Cost)>
where
    N: SearchNode,
    H: DecreaseKeyHeap<NodeIndex, PriorityCost<N::Cost>>,
{
    run::<N, H, _, _>(start, limits, |_| N::Cost::default(), |node, _| node.is_goal())
}

/// Runs A* search from `start`, guided by the node's heuristic.
pub fn astar<N, H>(start: &N) -> Option<(Vec<N>, N::Cost)>
where
    N: AStarNode,
    H: DecreaseKeyHeap<NodeIndex, PriorityCost<N::Cost>>,
{
    run::<N, H, _, _>(
        start,
        SearchLimits::default(),
        |node: &N| node.heuristic(),
        |node, _| node.is_goal(),
    )
}

/// Returns every node reachable from `start` within `max_cost` together with
/// its shortest distance, in order of non-decreasing distance.
pub fn shortest_distances<N, H>(start: &N, max_cost: N::Cost) -> Vec<(N, N::Cost)>
where
    N: SearchNode,
    H: DecreaseKeyHeap<NodeIndex, PriorityCost<N::Cost>>,
{
    let mut settled = Vec::new();
    let limits = SearchLimits {
        max_cost: Some(max_cost),
        max_nodes: None,
    };
    run::<N, H, _, _>(start, limits, |_| N::Cost::default(), |node, cost| {
        settled.push((node.clone(), cost));
        false
    });
    settled
}

/// Settles nodes in order of f-score, handing each to `on_settle`.
///
/// Stops with the path to the current node as soon as `on_settle` returns
/// true; returns `None` once the reachable graph or a limit is exhausted.
fn run<N, H, E, F>(
    start: &N,
    limits: SearchLimits<N::Cost>,
    heuristic: E,
    mut on_settle: F,
) -> Option<(Vec<N>, N::Cost)>
where
    N: SearchNode,
    H: DecreaseKeyHeap<NodeIndex, PriorityCost<N::Cost>>,
    E: Fn(&N) -> N::Cost,
    F: FnMut(&N, N::Cost) -> bool,
{
    let mut heap = H::new();
    let mut frontier: Frontier<N, H::Handle> = Frontier::new();
    let zero = N::Cost::default();

    let (start_index, _) = frontier.index(start, zero);
    let priority = PriorityCost {
        f_score: heuristic(start),
        g_score: zero,
    };
    frontier.records[start_index].handle = Some(heap.push_with_handle(priority, start_index));

    let mut settled = 0usize;
    while let Some((priority, current)) = heap.pop() {
        let record = &mut frontier.records[current];
        debug_assert!(!record.closed, "node {} queued twice", current);
        record.closed = true;
        record.handle = None;

        let node = record.node.clone();
        let g_score = priority.g_score;
        if on_settle(&node, g_score) {
            return Some((frontier.path_to(current), g_score));
        }

        settled += 1;
        if limits.max_nodes.is_some_and(|max| settled >= max) {
            return None;
        }

        for (neighbor, edge_cost) in node.successors() {
            let tentative = g_score + edge_cost;
            if limits.max_cost.is_some_and(|max| tentative > max) {
                continue;
            }

            let (index, is_new) = frontier.index(&neighbor, tentative);
            let record = &mut frontier.records[index];
            if record.closed {
                continue;
            }

            let priority = PriorityCost {
                f_score: tentative + heuristic(&neighbor),
                g_score: tentative,
            };
            if is_new {
                record.came_from = Some(current);
                record.handle = Some(heap.push_with_handle(priority, index));
            } else if tentative < record.g_score {
                record.g_score = tentative;
                record.came_from = Some(current);
                if let Some(handle) = record.handle.take() {
                    let handle = match heap.decrease_key(&handle, priority) {
                        Ok(()) => handle,
                        Err(error) => {
                            // The f-score did not fall (a cost whose addition
                            // saturates); replace the entry so the node is
                            // settled with its new g-score
                            debug!("re-queueing node {} after {}", index, error);
                            let _ = heap.delete(&handle);
                            heap.push_with_handle(priority, index)
                        }
                    };
                    record.handle = Some(handle);
                }
            }
        }
    }

    None
}
