//! Bidirectional A*.
//!
//! A forward search from `(0, 0)` and a backward search from `(n1, n2)` run in alternation.
//! Each side keeps the set of its open nodes, which the other side uses to bound the remaining
//! cost of its candidates. When a node is closed on both sides, the two partial paths form a
//! complete alignment; the search stops as soon as no queued node can improve on the best
//! complete alignment found so far.

use rustc_hash::FxHashSet;
use tracing::{debug, span, trace, Level};

use crate::aligner::{AlignmentConfig, AlignmentEngine, MatchScoring};
use crate::aligner::alignment::{AlignmentResult, EditOp, PathCost, SearchStats};
use crate::aligner::astar::{Relaxation, SearchRecord, SearchTable};
use crate::aligner::costs::CostModel;
use crate::aligner::grid::{Grid, GridNode, Neighbors, Transition};
use crate::errors::VqalignError;
use crate::scorer::{PairwiseScorer, SequenceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn neighbors(&self, grid: &Grid, node: GridNode) -> Neighbors {
        match self {
            Self::Forward => grid.successors(node),
            Self::Backward => grid.predecessors(node),
        }
    }

    /// Whether `other` can still be reached from `node` when searching in this direction
    fn reaches(&self, node: GridNode, other: GridNode) -> bool {
        match self {
            Self::Forward => node.precedes(&other),
            Self::Backward => other.precedes(&node),
        }
    }
}

/// Best complete path found so far, joined at `node`
#[derive(Debug, Clone, Copy)]
struct Meeting {
    node: GridNode,
    path: PathCost,
}

fn offer_meeting(best: &mut Option<Meeting>, node: GridNode, path: PathCost) {
    if best.map_or(true, |m| path < m.path) {
        debug!(%node, cost = path.cost, length = path.length, "New best meeting point");
        *best = Some(Meeting { node, path });
    }
}

enum Step {
    Continue,
    Stop,
}

struct SearchSide {
    direction: Direction,
    table: SearchTable,
    frontier: FxHashSet<GridNode>,

    /// The node this side is searching towards
    target: GridNode,
}

impl SearchSide {
    fn new(direction: Direction, grid: Grid, costs: &CostModel) -> Self {
        let (origin, target) = match direction {
            Direction::Forward => (grid.start(), grid.goal()),
            Direction::Backward => (grid.goal(), grid.start()),
        };

        let mut table = SearchTable::new(grid);
        table.open_origin(origin, PathCost::new(costs.min_indel_cost(origin, target), origin.min_moves(&target)));

        let mut frontier = FxHashSet::default();
        frontier.insert(origin);

        Self {
            direction,
            table,
            frontier,
            target,
        }
    }

    /// Lower bound on the remaining path from `node` to this side's target.
    ///
    /// If the other side already closed `node`, the path it found is optimal and is returned as
    /// is. Otherwise, any remaining path has to cross the other side's frontier, so the cost
    /// bound is the lowest pairwise bound to a reachable frontier node plus the cost the other
    /// side has recorded for it, capped by the direct pairwise bound to the target.
    fn remaining_bound(&self, costs: &CostModel, node: GridNode, other: &SearchSide) -> PathCost {
        if other.table.is_closed(node) {
            return other.table.record(node).path();
        }

        let cost = other.frontier.iter()
            .filter(|z| self.direction.reaches(node, **z))
            .map(|z| costs.min_indel_cost(node, *z) + other.table.record(*z).cost)
            .fold(costs.min_indel_cost(node, self.target), f64::min);

        PathCost::new(cost, node.min_moves(&self.target))
    }

    /// Close the next node of this side and expand it.
    ///
    /// Meetings are recorded whenever this side closes a node the other side has closed, and
    /// whenever it finds a better path to a node the other side has closed.
    fn step<S>(
        &mut self,
        other: &SearchSide,
        costs: &CostModel,
        scoring: &mut MatchScoring<S>,
        best: &mut Option<Meeting>,
    ) -> Result<Step, VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let Some(front) = self.table.close_next() else {
            // Every node reachable from this side's origin is closed, including the other
            // side's origin, so a meeting has been recorded if there is any path at all.
            return match best {
                Some(_) => Ok(Step::Stop),
                None => Err(VqalignError::SearchExhausted),
            };
        };

        self.frontier.remove(&front);
        let record = *self.table.record(front);
        trace!(direction = ?self.direction, %front, cost = record.cost, estimate = record.estimate, "FRONT");

        if other.table.is_closed(front) {
            offer_meeting(best, front, record.path().join(other.table.record(front).path()));
        }

        if let Some(meeting) = best {
            if record.key() >= meeting.path {
                return Ok(Step::Stop);
            }
        }

        let grid = self.table.grid();
        for (transition, neighbor) in self.direction.neighbors(&grid, front) {
            if self.table.is_closed(neighbor) {
                continue;
            }

            // Match moves always score the pair at the lower end of the edge
            let op = match costs.indel_op(transition) {
                Some(op) => op,
                None => {
                    let lower = match self.direction {
                        Direction::Forward => front,
                        Direction::Backward => neighbor,
                    };

                    EditOp::new(Transition::Match, scoring.similarity(lower.i1, lower.i2)?)
                }
            };

            let cost = record.cost + costs.step_cost(&op);
            let remaining = self.remaining_bound(costs, neighbor, other);
            let candidate = SearchRecord::new(cost, record.length + 1, cost + remaining.cost, Some(op))
                .with_remaining_moves(remaining.length);

            let relaxed = self.table.relax(neighbor, candidate);
            self.frontier.insert(neighbor);

            if relaxed != Relaxation::Discarded && other.table.is_closed(neighbor) {
                offer_meeting(best, neighbor, candidate.path().join(other.table.record(neighbor).path()));
            }
        }

        Ok(Step::Continue)
    }
}

pub struct BidirectionalAligner {
    config: AlignmentConfig,
}

impl BidirectionalAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }
}

impl AlignmentEngine for BidirectionalAligner {
    fn align<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<AlignmentResult, VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let span = span!(Level::DEBUG, "bidirectional_run");
        let _enter = span.enter();

        let costs = &self.config.costs;
        let grid = Grid::new(seq1.len, seq2.len);

        let mut scoring = MatchScoring::new(scorer, seq1.id, seq2.id, self.config.on_scorer_failure);
        let mut forward = SearchSide::new(Direction::Forward, grid, costs);
        let mut backward = SearchSide::new(Direction::Backward, grid, costs);
        let mut best = None;
        let mut max_queue_len = 0;

        loop {
            if let Step::Stop = forward.step(&backward, costs, &mut scoring, &mut best)? {
                break;
            }

            if let Step::Stop = backward.step(&forward, costs, &mut scoring, &mut best)? {
                break;
            }

            max_queue_len = max_queue_len.max(forward.table.queue_len() + backward.table.queue_len());
        }

        let meeting = best.ok_or(VqalignError::SearchExhausted)?;
        debug!(node = %meeting.node, cost = meeting.path.cost, length = meeting.path.length, "END");

        let mut script = forward.table.backtrace(meeting.node)?;
        script.extend(backward.table.trace_forward(meeting.node));

        let (fw_stats, bw_stats) = (forward.table.stats(), backward.table.stats());
        let stats = SearchStats {
            num_scored: scoring.num_scored(),
            num_queued: fw_stats.num_queued + bw_stats.num_queued,
            num_closed: fw_stats.num_closed + bw_stats.num_closed,
            max_queue_len,
        };

        Ok(AlignmentResult::new(meeting.path.cost, meeting.path.length)
            .with_edit_script(script)
            .with_stats(stats))
    }
}
