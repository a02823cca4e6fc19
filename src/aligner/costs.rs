use serde::{Deserialize, Serialize};

use crate::aligner::alignment::EditOp;
use crate::aligner::grid::{GridNode, Transition};
use crate::errors::VqalignError;

/// Similarity assigned to an inserted frame, with 1.0 being the best possible score
pub const DEFAULT_INSERTED_FRAME_VALUE: f64 = 0.0;

/// Similarity assigned to a deleted frame, with 1.0 being the best possible score
pub const DEFAULT_DELETED_FRAME_VALUE: f64 = 0.0;

/// Transition costs of the alignment grid.
///
/// Every move costs `1 - similarity`, where the similarity of a match is computed by the pairwise
/// scorer, and the similarity of an insertion or deletion is a configured constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    inserted_frame_value: f64,
    deleted_frame_value: f64,
}

impl CostModel {
    pub fn new(inserted_frame_value: f64, deleted_frame_value: f64) -> Result<Self, VqalignError> {
        for (name, value) in [("inserted", inserted_frame_value), ("deleted", deleted_frame_value)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(VqalignError::InvalidCostModel(
                    format!("{name} frame value should be within [0, 1], got {value}")
                ));
            }
        }

        Ok(Self { inserted_frame_value, deleted_frame_value })
    }

    #[inline]
    pub fn inserted_frame_value(&self) -> f64 {
        self.inserted_frame_value
    }

    #[inline]
    pub fn deleted_frame_value(&self) -> f64 {
        self.deleted_frame_value
    }

    #[inline]
    pub fn insertion_cost(&self) -> f64 {
        1.0 - self.inserted_frame_value
    }

    #[inline]
    pub fn deletion_cost(&self) -> f64 {
        1.0 - self.deleted_frame_value
    }

    /// Cost of a single move, given the similarity it contributes
    #[inline]
    pub fn step_cost(&self, op: &EditOp) -> f64 {
        1.0 - op.score
    }

    /// The similarity recorded for an indel move. Matches are scored externally.
    #[inline]
    pub fn indel_value(&self, transition: Transition) -> Option<f64> {
        match transition {
            Transition::Match => None,
            Transition::Delete => Some(self.deleted_frame_value),
            Transition::Insert => Some(self.inserted_frame_value),
        }
    }

    /// Edit operation for an indel move
    #[inline]
    pub fn indel_op(&self, transition: Transition) -> Option<EditOp> {
        self.indel_value(transition)
            .map(|value| EditOp::new(transition, value))
    }

    /// Lower bound on the cost of any monotone path between `from` and `to`.
    ///
    /// Matches advance both sequences equally, so the excess advancement in one of the sequences
    /// has to be covered by deletions (sequence 1) or insertions (sequence 2).
    #[inline]
    pub fn min_indel_cost(&self, from: GridNode, to: GridNode) -> f64 {
        let a1 = from.i1.abs_diff(to.i1);
        let a2 = from.i2.abs_diff(to.i2);

        if a1 > a2 {
            (a1 - a2) as f64 * self.deletion_cost()
        } else {
            (a2 - a1) as f64 * self.insertion_cost()
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            inserted_frame_value: DEFAULT_INSERTED_FRAME_VALUE,
            deleted_frame_value: DEFAULT_DELETED_FRAME_VALUE,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::CostModel;
    use crate::aligner::grid::{GridNode, Transition};

    #[test]
    fn test_validation() {
        assert!(CostModel::new(0.0, 1.0).is_ok());
        assert!(CostModel::new(-0.1, 0.0).is_err());
        assert!(CostModel::new(0.0, 1.5).is_err());
        assert!(CostModel::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_min_indel_cost() {
        let costs = CostModel::new(0.25, 0.5).unwrap();
        let goal = GridNode::new(10, 6);

        // Four more items left in sequence 1: deletions
        assert_eq!(costs.min_indel_cost(GridNode::new(0, 0), goal), 4.0 * 0.5);

        // Two more items left in sequence 2: insertions
        assert_eq!(costs.min_indel_cost(GridNode::new(8, 2), goal), 2.0 * 0.75);

        assert_eq!(costs.min_indel_cost(GridNode::new(7, 3), goal), 0.0);
        assert_eq!(costs.min_indel_cost(goal, goal), 0.0);

        // Symmetric in its arguments, used by the backward search
        assert_eq!(costs.min_indel_cost(goal, GridNode::new(0, 0)), 4.0 * 0.5);
    }

    #[test]
    fn test_indel_values() {
        let costs = CostModel::new(0.1, 0.2).unwrap();
        assert_eq!(costs.indel_value(Transition::Insert), Some(0.1));
        assert_eq!(costs.indel_value(Transition::Delete), Some(0.2));
        assert_eq!(costs.indel_value(Transition::Match), None);
    }
}
