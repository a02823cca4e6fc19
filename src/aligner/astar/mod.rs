use std::marker::PhantomData;

use tracing::{debug, span, trace, Level};

use crate::aligner::{AlignmentConfig, AlignmentEngine, MatchScoring};
use crate::aligner::alignment::{AlignmentResult, EditOp, EditScript, PathCost, SearchStats};
use crate::aligner::grid::{Grid, GridNode, GridTable, Transition};
use crate::aligner::queue::IndexedHeap;
use crate::errors::VqalignError;
use crate::scorer::{PairwiseScorer, SequenceRef};

pub mod heuristic;

use heuristic::{AstarHeuristic, MinIndelCost};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeStatus {
    #[default]
    Unseen,
    Open,
    Closed,
}

/// Best known path to (or from) a grid node
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchRecord {
    pub cost: f64,
    pub length: usize,

    /// Path cost plus the heuristic estimate of the remaining cost
    pub estimate: f64,

    /// Path length plus a lower bound on the number of remaining moves
    pub estimated_length: usize,
    pub status: NodeStatus,

    /// The move connecting this node to its parent on the best known path
    pub via: Option<EditOp>,
}

impl SearchRecord {
    pub fn new(cost: f64, length: usize, estimate: f64, via: Option<EditOp>) -> Self {
        Self {
            cost,
            length,
            estimate,
            estimated_length: length,
            status: NodeStatus::Unseen,
            via,
        }
    }

    pub fn with_remaining_moves(mut self, moves: usize) -> Self {
        self.estimated_length = self.length + moves;
        self
    }

    /// The path to this node
    #[inline]
    pub fn path(&self) -> PathCost {
        PathCost::new(self.cost, self.length)
    }

    /// Queue priority: the estimated complete path
    #[inline]
    pub fn key(&self) -> PathCost {
        PathCost::new(self.estimate, self.estimated_length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    Opened,
    Improved,
    Discarded,
}

/// The open set and per-node search records of a single search direction.
pub struct SearchTable {
    records: GridTable<SearchRecord>,
    queue: IndexedHeap<PathCost>,
    num_closed: usize,
}

impl SearchTable {
    pub fn new(grid: Grid) -> Self {
        Self {
            records: GridTable::new(grid, SearchRecord::default()),
            queue: IndexedHeap::new(grid.node_count()),
            num_closed: 0,
        }
    }

    #[inline]
    pub fn grid(&self) -> Grid {
        self.records.grid()
    }

    #[inline]
    pub fn record(&self, node: GridNode) -> &SearchRecord {
        &self.records[node]
    }

    #[inline]
    pub fn status(&self, node: GridNode) -> NodeStatus {
        self.records[node].status
    }

    #[inline]
    pub fn is_closed(&self, node: GridNode) -> bool {
        self.status(node) == NodeStatus::Closed
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            num_scored: 0,
            num_queued: self.queue.num_pushed(),
            num_closed: self.num_closed,
            max_queue_len: self.queue.max_len(),
        }
    }

    /// Open the origin of the search with zero cost, given a bound on the remaining path
    pub fn open_origin(&mut self, node: GridNode, remaining: PathCost) {
        self.relax(node, SearchRecord::new(0.0, 0, remaining.cost, None).with_remaining_moves(remaining.length));
    }

    /// Extract the open node with the lowest estimate and mark it closed
    pub fn close_next(&mut self) -> Option<GridNode> {
        let (ix, _) = self.queue.pop()?;
        let node = self.grid().node(ix);

        self.records[node].status = NodeStatus::Closed;
        self.num_closed += 1;

        Some(node)
    }

    /// Offer a new path to `node`. The candidate replaces the stored record if the node was not
    /// seen before, or if it is open and the candidate path is better: cheaper, or equally
    /// expensive with fewer moves.
    pub fn relax(&mut self, node: GridNode, candidate: SearchRecord) -> Relaxation {
        let ix = self.grid().index(node);
        let stored = &mut self.records[node];

        let outcome = match stored.status {
            NodeStatus::Unseen => Relaxation::Opened,
            NodeStatus::Open if candidate.path() < stored.path() => Relaxation::Improved,
            _ => return Relaxation::Discarded,
        };

        *stored = SearchRecord { status: NodeStatus::Open, ..candidate };
        self.queue.push(ix, candidate.key());

        outcome
    }

    /// Follow parent moves from `node` back to the origin of a forward search. Returns the moves
    /// in path order.
    pub fn backtrace(&self, node: GridNode) -> Result<EditScript, VqalignError> {
        let mut script = EditScript::with_capacity(self.records[node].length);
        let mut curr = node;

        while let Some(op) = self.records[curr].via {
            script.push(op);
            curr = op.transition.step_back(curr)
                .ok_or(VqalignError::SearchExhausted)?;
        }

        script.reverse();
        Ok(script)
    }

    /// Follow parent moves from `node` forward to the origin of a backward search.
    pub fn trace_forward(&self, node: GridNode) -> EditScript {
        let mut script = EditScript::with_capacity(self.records[node].length);
        let mut curr = node;

        while let Some(op) = self.records[curr].via {
            script.push(op);
            curr = op.transition.step(curr);
        }

        script
    }
}

/// Forward A* from `(0, 0)` to `(n1, n2)`.
pub struct AstarAligner<H = MinIndelCost> {
    config: AlignmentConfig,
    dummy: PhantomData<H>,
}

impl<H> AstarAligner<H>
where
    H: AstarHeuristic,
{
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            config,
            dummy: PhantomData,
        }
    }
}

impl<H> AlignmentEngine for AstarAligner<H>
where
    H: AstarHeuristic,
{
    fn align<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<AlignmentResult, VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let span = span!(Level::DEBUG, "astar_run");
        let _enter = span.enter();

        let costs = &self.config.costs;
        let grid = Grid::new(seq1.len, seq2.len);

        let mut heuristic = H::default();
        heuristic.init(costs, grid);

        let mut scoring = MatchScoring::new(scorer, seq1.id, seq2.id, self.config.on_scorer_failure);
        let mut search = SearchTable::new(grid);
        let goal = grid.goal();
        search.open_origin(grid.start(), PathCost::new(heuristic.h(grid.start()), grid.start().min_moves(&goal)));

        let end = loop {
            let Some(front) = search.close_next() else {
                return Err(VqalignError::SearchExhausted);
            };

            let record = *search.record(front);
            trace!(%front, cost = record.cost, estimate = record.estimate, "FRONT");

            if front == goal {
                break front;
            }

            for (transition, succ) in grid.successors(front) {
                if search.is_closed(succ) {
                    continue;
                }

                let op = match costs.indel_op(transition) {
                    Some(op) => op,
                    None => EditOp::new(Transition::Match, scoring.similarity(front.i1, front.i2)?),
                };

                let cost = record.cost + costs.step_cost(&op);
                let candidate = SearchRecord::new(cost, record.length + 1, cost + heuristic.h(succ), Some(op))
                    .with_remaining_moves(succ.min_moves(&goal));
                search.relax(succ, candidate);
            }
        };

        let record = search.record(end);
        debug!(cost = record.cost, length = record.length, "END");

        let stats = SearchStats {
            num_scored: scoring.num_scored(),
            ..search.stats()
        };

        Ok(AlignmentResult::new(record.cost, record.length)
            .with_edit_script(search.backtrace(end)?)
            .with_stats(stats))
    }
}
