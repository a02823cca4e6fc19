use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::aligner::alignment::EditOp;
use crate::aligner::costs::CostModel;
use crate::aligner::grid::{GridNode, Transition};

/// A pair of aligned item indices. The first element is the index in sequence 1, the second
/// the index in sequence 2.
///
/// In case of an insertion or deletion, one of the elements is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedPair(pub Option<usize>, pub Option<usize>);

impl AlignedPair {
    #[inline(always)]
    pub fn index1(&self) -> Option<usize> {
        self.0
    }

    #[inline(always)]
    pub fn index2(&self) -> Option<usize> {
        self.1
    }

    pub fn is_aligned(&self) -> bool {
        self.0.is_some() && self.1.is_some()
    }
}

/// Convert an edit script to the item pairs it aligns
pub fn aligned_pairs(script: &[EditOp]) -> Vec<AlignedPair> {
    let mut curr = GridNode::new(0, 0);

    script.iter()
        .map(|op| {
            let pair = match op.transition {
                Transition::Match => AlignedPair(Some(curr.i1), Some(curr.i2)),
                Transition::Delete => AlignedPair(Some(curr.i1), None),
                Transition::Insert => AlignedPair(None, Some(curr.i2)),
            };

            curr = op.transition.step(curr);
            pair
        })
        .collect()
}

/// Apply all moves of an edit script starting at `(0, 0)`. Returns the node reached and the
/// accumulated cost.
pub fn replay_edit_script(costs: &CostModel, script: &[EditOp]) -> (GridNode, f64) {
    script.iter()
        .fold((GridNode::new(0, 0), 0.0), |(node, cost), op| {
            (op.transition.step(node), cost + costs.step_cost(op))
        })
}

/// One line per move, as `Action = <MOVE> Score = <similarity>`
pub fn format_edit_script(script: &[EditOp]) -> String {
    script.iter()
        .map(|op| format!("Action = {:<8} Score = {:.6}", op.transition.label(), op.score))
        .join("\n")
}
