//! The index grid of partial alignments.
//!
//! Node `(i1, i2)` represents the state where the first `i1` items of sequence 1 have been
//! aligned with the first `i2` items of sequence 2. Every alignment is a monotone path from
//! `(0, 0)` to `(n1, n2)`.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridNode {
    pub i1: usize,
    pub i2: usize,
}

impl GridNode {
    #[inline]
    pub fn new(i1: usize, i2: usize) -> Self {
        Self { i1, i2 }
    }

    /// Whether `other` can be reached from this node by a monotone path.
    #[inline]
    pub fn precedes(&self, other: &GridNode) -> bool {
        self.i1 <= other.i1 && self.i2 <= other.i2
    }

    /// Lowest number of moves on any path between this node and `other`
    #[inline]
    pub fn min_moves(&self, other: &GridNode) -> usize {
        self.i1.abs_diff(other.i1).max(self.i2.abs_diff(other.i2))
    }
}

impl fmt::Display for GridNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i1, self.i2)
    }
}

/// The three monotone moves through the grid.
///
/// The declaration order is also the tie-breaking order used by the DP engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Align item `i1` of sequence 1 with item `i2` of sequence 2
    Match,

    /// Item `i1` of sequence 1 has no counterpart in sequence 2
    Delete,

    /// Item `i2` of sequence 2 has no counterpart in sequence 1
    Insert,
}

impl Transition {
    pub const ALL: [Transition; 3] = [Transition::Match, Transition::Delete, Transition::Insert];

    /// Grid offsets `(d1, d2)` of this move.
    #[inline]
    pub fn offsets(&self) -> (usize, usize) {
        match self {
            Self::Match => (1, 1),
            Self::Delete => (1, 0),
            Self::Insert => (0, 1),
        }
    }

    /// The node reached by taking this move from `node`. Does not check grid bounds.
    #[inline]
    pub fn step(&self, node: GridNode) -> GridNode {
        let (d1, d2) = self.offsets();
        GridNode::new(node.i1 + d1, node.i2 + d2)
    }

    /// The node from which this move reaches `node`, if any.
    #[inline]
    pub fn step_back(&self, node: GridNode) -> Option<GridNode> {
        let (d1, d2) = self.offsets();
        Some(GridNode::new(node.i1.checked_sub(d1)?, node.i2.checked_sub(d2)?))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Match => "MATCH",
            Self::Delete => "DELETED",
            Self::Insert => "INSERTED",
        }
    }
}

pub type Neighbors = SmallVec<[(Transition, GridNode); 3]>;

/// Dimensions of the `(n1 + 1) x (n2 + 1)` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    n1: usize,
    n2: usize,
}

impl Grid {
    pub fn new(n1: usize, n2: usize) -> Self {
        Self { n1, n2 }
    }

    #[inline]
    pub fn n1(&self) -> usize {
        self.n1
    }

    #[inline]
    pub fn n2(&self) -> usize {
        self.n2
    }

    #[inline]
    pub fn start(&self) -> GridNode {
        GridNode::new(0, 0)
    }

    #[inline]
    pub fn goal(&self) -> GridNode {
        GridNode::new(self.n1, self.n2)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        (self.n1 + 1) * (self.n2 + 1)
    }

    #[inline]
    pub fn contains(&self, node: GridNode) -> bool {
        node.i1 <= self.n1 && node.i2 <= self.n2
    }

    #[inline]
    pub fn index(&self, node: GridNode) -> usize {
        node.i1 * (self.n2 + 1) + node.i2
    }

    #[inline]
    pub fn node(&self, index: usize) -> GridNode {
        GridNode::new(index / (self.n2 + 1), index % (self.n2 + 1))
    }

    /// Nodes reachable from `node` with a single move, together with the move taken.
    pub fn successors(&self, node: GridNode) -> Neighbors {
        Transition::ALL.iter()
            .map(|t| (*t, t.step(node)))
            .filter(|(_, succ)| self.contains(*succ))
            .collect()
    }

    /// Nodes from which `node` is reachable with a single move, together with that move.
    pub fn predecessors(&self, node: GridNode) -> Neighbors {
        Transition::ALL.iter()
            .filter_map(|t| t.step_back(node).map(|pred| (*t, pred)))
            .collect()
    }
}

/// A dense per-node table stored in a flat vector, addressed by `i1 * (n2 + 1) + i2`.
#[derive(Debug, Clone)]
pub struct GridTable<T> {
    grid: Grid,
    cells: Vec<T>,
}

impl<T> GridTable<T>
where
    T: Clone
{
    pub fn new(grid: Grid, initial: T) -> Self {
        Self {
            grid,
            cells: vec![initial; grid.node_count()],
        }
    }
}

impl<T> GridTable<T> {
    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn rows(&self) -> impl Iterator<Item=&[T]> + '_ {
        self.cells.chunks(self.grid.n2 + 1)
    }
}

impl<T> Index<GridNode> for GridTable<T> {
    type Output = T;

    #[inline]
    fn index(&self, node: GridNode) -> &Self::Output {
        &self.cells[self.grid.index(node)]
    }
}

impl<T> IndexMut<GridNode> for GridTable<T> {
    #[inline]
    fn index_mut(&mut self, node: GridNode) -> &mut Self::Output {
        let ix = self.grid.index(node);
        &mut self.cells[ix]
    }
}
