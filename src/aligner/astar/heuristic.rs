use crate::aligner::costs::CostModel;
use crate::aligner::grid::{Grid, GridNode};

pub trait AstarHeuristic: Default {
    fn init(&mut self, costs: &CostModel, grid: Grid);

    /// Lower bound on the cost of the remaining path from `node` to the end of the grid
    fn h(&self, node: GridNode) -> f64;
}

/// A* heuristic that always returns 0, such that
/// A* reduces to standard Dijkstra's algorithm.
#[derive(Default)]
pub struct Dijkstra;

impl AstarHeuristic for Dijkstra {
    fn init(&mut self, _: &CostModel, _: Grid) { }

    fn h(&self, _: GridNode) -> f64 {
        0.0
    }
}

/// Cost of the insertions or deletions required to reach the end of the grid.
///
/// Consistent as long as all insertion and deletion costs are non-negative: a match step does
/// not change the excess, and an indel step changes the excess by one, which changes the bound
/// by at most the indel cost itself.
#[derive(Default)]
pub struct MinIndelCost {
    costs: CostModel,
    goal: GridNode,
}

impl MinIndelCost {
    pub fn new(costs: CostModel, grid: Grid) -> Self {
        Self {
            costs,
            goal: grid.goal(),
        }
    }
}

impl AstarHeuristic for MinIndelCost {
    fn init(&mut self, costs: &CostModel, grid: Grid) {
        *self = Self::new(*costs, grid);
    }

    fn h(&self, node: GridNode) -> f64 {
        self.costs.min_indel_cost(node, self.goal)
    }
}
