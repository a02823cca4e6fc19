use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::aligner::grid::Transition;
use crate::errors::VqalignError;

/// A single step of an alignment: the move taken and the similarity it contributed.
///
/// For matches, `score` is the value returned by the pairwise scorer; for insertions and
/// deletions it is the configured inserted/deleted frame value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditOp {
    pub transition: Transition,
    pub score: f64,
}

impl EditOp {
    pub fn new(transition: Transition, score: f64) -> Self {
        Self { transition, score }
    }
}

/// Ordered list of moves from `(0, 0)` to `(n1, n2)`
pub type EditScript = Vec<EditOp>;

/// Accumulated cost and number of moves of a (partial) path.
///
/// Paths are ordered by cost, and among paths of equal cost the one with fewer moves comes
/// first. Every engine picks its optimum by this order, so all of them agree on the path length
/// and hence on the normalized score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PathCost {
    pub cost: f64,
    pub length: usize,
}

impl PathCost {
    pub fn new(cost: f64, length: usize) -> Self {
        Self { cost, length }
    }

    /// This path, extended by one move of the given cost
    #[inline]
    pub fn extend(self, step_cost: f64) -> Self {
        Self::new(self.cost + step_cost, self.length + 1)
    }

    /// Concatenation with a second path
    #[inline]
    pub fn join(self, other: PathCost) -> Self {
        Self::new(self.cost + other.cost, self.length + other.length)
    }
}

impl Ord for PathCost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost.total_cmp(&other.cost)
            .then(self.length.cmp(&other.length))
    }
}

impl PartialOrd for PathCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PathCost {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathCost {}

/// Counters describing the work performed by an engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Number of pairwise scorer invocations
    pub num_scored: usize,

    /// Number of nodes inserted in a priority queue
    pub num_queued: usize,

    /// Number of nodes extracted from a priority queue and closed
    pub num_closed: usize,

    /// Largest combined number of queued nodes
    pub max_queue_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Accumulated cost of the chosen path
    pub total_cost: f64,

    /// Number of moves on the chosen path
    pub path_length: usize,

    /// Moves of the chosen path, for engines that recover it
    pub edit_script: Option<EditScript>,

    pub stats: SearchStats,
}

impl AlignmentResult {
    pub fn new(total_cost: f64, path_length: usize) -> Self {
        Self {
            total_cost,
            path_length,
            edit_script: None,
            stats: SearchStats::default(),
        }
    }

    pub fn with_edit_script(mut self, script: EditScript) -> Self {
        self.edit_script = Some(script);
        self
    }

    pub fn with_stats(mut self, stats: SearchStats) -> Self {
        self.stats = stats;
        self
    }

    /// Normalized similarity `1 - total_cost / path_length` of this alignment
    pub fn similarity(&self) -> Result<f64, VqalignError> {
        normalize_score(self.total_cost, self.path_length)
    }
}

/// Convert an accumulated cost and path length to a similarity score in [0, 1].
pub fn normalize_score(total_cost: f64, path_length: usize) -> Result<f64, VqalignError> {
    if path_length == 0 {
        return Err(VqalignError::EmptyAlignment);
    }

    Ok(1.0 - total_cost / path_length as f64)
}
