//! Exhaustive dynamic programming over the full grid.

use tracing::{debug, span, Level};

use crate::aligner::{AlignmentConfig, AlignmentEngine, MatchScoring};
use crate::aligner::alignment::{AlignmentResult, EditOp, EditScript, PathCost, SearchStats};
use crate::aligner::costs::CostModel;
use crate::aligner::grid::{Grid, GridNode, GridTable, Transition};
use crate::errors::VqalignError;
use crate::scorer::{PairwiseScorer, SequenceRef};

/// Per-node contents of a DP table
pub trait DpCell: Clone {
    fn origin() -> Self;
    fn new(cost: f64, length: usize, op: EditOp) -> Self;

    fn cost(&self) -> f64;
    fn length(&self) -> usize;

    fn path(&self) -> PathCost {
        PathCost::new(self.cost(), self.length())
    }
}

/// DP cell storing only the best path cost and length
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostCell {
    pub cost: f64,
    pub length: usize,
}

impl DpCell for CostCell {
    fn origin() -> Self {
        Self::default()
    }

    fn new(cost: f64, length: usize, _: EditOp) -> Self {
        Self { cost, length }
    }

    fn cost(&self) -> f64 {
        self.cost
    }

    fn length(&self) -> usize {
        self.length
    }
}

/// DP cell that additionally remembers the winning move, to recover the alignment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TracebackCell {
    pub cost: f64,
    pub length: usize,
    pub op: Option<EditOp>,
}

impl DpCell for TracebackCell {
    fn origin() -> Self {
        Self::default()
    }

    fn new(cost: f64, length: usize, op: EditOp) -> Self {
        Self { cost, length, op: Some(op) }
    }

    fn cost(&self) -> f64 {
        self.cost
    }

    fn length(&self) -> usize {
        self.length
    }
}

/// Fill the complete DP table in row-major order.
///
/// Each interior cell considers its diagonal, vertical (deletion) and horizontal (insertion)
/// predecessor in that order. A later branch only wins if its path is strictly better, i.e.
/// cheaper, or equally cheap with fewer moves.
pub fn fill_table<C, S>(
    grid: Grid,
    costs: &CostModel,
    scoring: &mut MatchScoring<S>,
) -> Result<GridTable<C>, VqalignError>
where
    C: DpCell,
    S: PairwiseScorer + ?Sized,
{
    let mut table = GridTable::new(grid, C::origin());

    let delete = EditOp::new(Transition::Delete, costs.deleted_frame_value());
    let insert = EditOp::new(Transition::Insert, costs.inserted_frame_value());

    for i1 in 1..=grid.n1() {
        let path = table[GridNode::new(i1 - 1, 0)].path().extend(costs.step_cost(&delete));
        table[GridNode::new(i1, 0)] = C::new(path.cost, path.length, delete);
    }

    for i2 in 1..=grid.n2() {
        let path = table[GridNode::new(0, i2 - 1)].path().extend(costs.step_cost(&insert));
        table[GridNode::new(0, i2)] = C::new(path.cost, path.length, insert);
    }

    for i1 in 1..=grid.n1() {
        for i2 in 1..=grid.n2() {
            let node = GridNode::new(i1, i2);
            let matched = EditOp::new(Transition::Match, scoring.similarity(i1 - 1, i2 - 1)?);

            let mut best: Option<(PathCost, EditOp)> = None;
            for op in [matched, delete, insert] {
                let Some(pred) = op.transition.step_back(node) else {
                    continue;
                };

                let path = table[pred].path().extend(costs.step_cost(&op));
                if best.map_or(true, |(best_path, _)| path < best_path) {
                    best = Some((path, op));
                }
            }

            let (path, op) = best.ok_or(VqalignError::SearchExhausted)?;
            table[node] = C::new(path.cost, path.length, op);
        }
    }

    Ok(table)
}

/// Walk back from the end of a filled table to `(0, 0)`, returning the moves in path order.
pub fn traceback(table: &GridTable<TracebackCell>) -> Result<EditScript, VqalignError> {
    let mut curr = table.grid().goal();
    let mut script = EditScript::with_capacity(table[curr].length);

    while curr != table.grid().start() {
        let op = table[curr].op.ok_or(VqalignError::SearchExhausted)?;
        script.push(op);

        curr = op.transition.step_back(curr).ok_or(VqalignError::SearchExhausted)?;
    }

    script.reverse();
    Ok(script)
}

/// Exact DP, reporting only the optimal cost and path length
pub struct DpAligner {
    config: AlignmentConfig,
}

impl DpAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }
}

impl AlignmentEngine for DpAligner {
    fn align<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<AlignmentResult, VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let span = span!(Level::DEBUG, "dp_fill");
        let _enter = span.enter();

        let grid = Grid::new(seq1.len, seq2.len);
        let mut scoring = MatchScoring::new(scorer, seq1.id, seq2.id, self.config.on_scorer_failure);

        let table: GridTable<CostCell> = fill_table(grid, &self.config.costs, &mut scoring)?;
        let end = table[grid.goal()];
        debug!(cost = end.cost, length = end.length, "END");

        Ok(AlignmentResult::new(end.cost, end.length)
            .with_stats(SearchStats { num_scored: scoring.num_scored(), ..Default::default() }))
    }
}

/// Exact DP that also recovers the optimal alignment
pub struct DpRecoveryAligner {
    config: AlignmentConfig,
}

impl DpRecoveryAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }
}

impl AlignmentEngine for DpRecoveryAligner {
    fn align<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<AlignmentResult, VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let span = span!(Level::DEBUG, "dp_recovery_fill");
        let _enter = span.enter();

        let grid = Grid::new(seq1.len, seq2.len);
        let mut scoring = MatchScoring::new(scorer, seq1.id, seq2.id, self.config.on_scorer_failure);

        let table: GridTable<TracebackCell> = fill_table(grid, &self.config.costs, &mut scoring)?;
        let end = table[grid.goal()];
        debug!(cost = end.cost, length = end.length, "END");

        let script = traceback(&table)?;

        Ok(AlignmentResult::new(end.cost, end.length)
            .with_edit_script(script)
            .with_stats(SearchStats { num_scored: scoring.num_scored(), ..Default::default() }))
    }
}


#[cfg(test)]
mod tests {
    use super::{fill_table, CostCell, DpAligner, DpRecoveryAligner};
    use crate::aligner::{AlignmentConfig, AlignmentEngine, MatchScoring, ScorerFailurePolicy};
    use crate::aligner::costs::CostModel;
    use crate::aligner::grid::{Grid, GridNode, GridTable, Transition};
    use crate::scorer::TableScorer;

    fn bad_middle_pair(value: f64) -> (TableScorer, AlignmentConfig) {
        let scorer = TableScorer::from_fn(3, 3, |i1, i2| if i1 == i2 && i1 != 1 { 1.0 } else { 0.0 });
        let costs = CostModel::new(value, value).unwrap();

        (scorer, AlignmentConfig { costs, ..Default::default() })
    }

    #[test]
    fn test_boundary_costs() {
        let costs = CostModel::new(0.25, 0.5).unwrap();
        let mut scorer = TableScorer::from_fn(3, 2, |_, _| 0.0);
        let mut scoring = MatchScoring::new(&mut scorer, TableScorer::SEQ1, TableScorer::SEQ2, ScorerFailurePolicy::Propagate);

        let table: GridTable<CostCell> = fill_table(Grid::new(3, 2), &costs, &mut scoring).unwrap();
        assert_eq!(table[GridNode::new(3, 0)].cost, 1.5);
        assert_eq!(table[GridNode::new(0, 2)].cost, 1.5);
        assert_eq!(table[GridNode::new(0, 2)].length, 2);

        // One call per interior cell
        assert_eq!(scoring.num_scored(), 6);
    }

    #[test]
    fn test_match_through_bad_pair() {
        // Matching through the bad pair costs 1.0, skipping it costs 2 * (1 - 0.4)
        let (mut scorer, config) = bad_middle_pair(0.4);
        let (seq1, seq2) = (scorer.seq1(), scorer.seq2());

        let result = DpRecoveryAligner::new(config).align(seq1, seq2, &mut scorer).unwrap();
        assert!((result.total_cost - 1.0).abs() < 1e-12);
        assert_eq!(result.path_length, 3);

        let transitions: Vec<_> = result.edit_script.unwrap().iter().map(|op| op.transition).collect();
        assert_eq!(transitions, vec![Transition::Match; 3]);
    }

    #[test]
    fn test_skip_bad_pair() {
        // Skipping the bad pair costs 2 * (1 - 0.6) = 0.8
        let (mut scorer, config) = bad_middle_pair(0.6);
        let (seq1, seq2) = (scorer.seq1(), scorer.seq2());

        let result = DpRecoveryAligner::new(config).align(seq1, seq2, &mut scorer).unwrap();
        assert!((result.total_cost - 0.8).abs() < 1e-12);
        assert_eq!(result.path_length, 4);

        let script = result.edit_script.unwrap();
        let transitions: Vec<_> = script.iter().map(|op| op.transition).collect();
        assert_eq!(transitions, vec![Transition::Match, Transition::Insert, Transition::Delete, Transition::Match]);
        assert_eq!(script[1].score, 0.6);

        let exact = DpAligner::new(config).align(seq1, seq2, &mut scorer).unwrap();
        assert_eq!(exact.total_cost, result.total_cost);
        assert_eq!(exact.path_length, result.path_length);
        assert!(exact.edit_script.is_none());
    }

    #[test]
    fn test_equal_cost_prefers_fewer_moves() {
        // Matching through and skipping the bad pair both cost 1.0
        let (mut scorer, config) = bad_middle_pair(0.5);
        let (seq1, seq2) = (scorer.seq1(), scorer.seq2());

        let result = DpRecoveryAligner::new(config).align(seq1, seq2, &mut scorer).unwrap();
        assert_eq!(result.total_cost, 1.0);
        assert_eq!(result.path_length, 3);
        assert_eq!(result.similarity().unwrap(), 1.0 - 1.0 / 3.0);
    }

    #[test]
    fn test_diagonal_wins_ties() {
        // Every path has the same cost when all moves are free
        let costs = CostModel::new(1.0, 1.0).unwrap();
        let config = AlignmentConfig { costs, ..Default::default() };
        let mut scorer = TableScorer::from_fn(3, 3, |_, _| 1.0);
        let (seq1, seq2) = (scorer.seq1(), scorer.seq2());

        let result = DpRecoveryAligner::new(config).align(seq1, seq2, &mut scorer).unwrap();
        assert_eq!(result.total_cost, 0.0);
        assert_eq!(result.path_length, 3);
    }
}
