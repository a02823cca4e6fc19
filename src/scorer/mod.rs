//! Pairwise similarity between items of two sequences.
//!
//! The alignment engines never look at items themselves. They only ask a [`PairwiseScorer`] for
//! the similarity of item `index1` of one sequence and item `index2` of the other.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::VqalignError;

pub mod frames;
pub mod ssim;

pub use frames::FrameScorer;

/// Identifies a sequence known to a scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub usize);

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq{}", self.0)
    }
}

/// A sequence as seen by the alignment engines: an identifier and a length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRef {
    pub id: SequenceId,
    pub len: usize,
}

impl SequenceRef {
    pub fn new(id: SequenceId, len: usize) -> Self {
        Self { id, len }
    }
}

pub trait PairwiseScorer {
    /// Similarity in [0, 1] of item `index1` of `seq1` and item `index2` of `seq2`.
    ///
    /// Repeated calls with the same arguments should return the same value.
    fn score(
        &mut self,
        seq1: SequenceId,
        seq2: SequenceId,
        index1: usize,
        index2: usize,
    ) -> Result<f64, VqalignError>;
}

impl<S> PairwiseScorer for &mut S
where
    S: PairwiseScorer + ?Sized,
{
    fn score(&mut self, seq1: SequenceId, seq2: SequenceId, index1: usize, index2: usize) -> Result<f64, VqalignError> {
        (**self).score(seq1, seq2, index1, index2)
    }
}

/// Scorer backed by a precomputed similarity matrix.
///
/// Row `i` holds the similarities of item `i` of the first sequence. A missing value makes
/// the scorer fail for that pair.
#[derive(Debug, Clone)]
pub struct TableScorer {
    rows: Vec<Vec<Option<f64>>>,
    n2: usize,
}

impl TableScorer {
    pub const SEQ1: SequenceId = SequenceId(0);
    pub const SEQ2: SequenceId = SequenceId(1);

    /// Build a scorer from rows of similarities. All rows should have the same length.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, VqalignError> {
        Self::with_missing(rows.into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect())
    }

    pub fn with_missing(rows: Vec<Vec<Option<f64>>>) -> Result<Self, VqalignError> {
        let n2 = rows.first().map_or(0, |row| row.len());

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n2) {
            return Err(VqalignError::InvalidTable {
                line: i + 1,
                reason: format!("expected {n2} columns, found {}", row.len()),
            });
        }

        Ok(Self { rows, n2 })
    }

    /// Scorer for `n1` items against `n2` items, computing similarities with the given function.
    pub fn from_fn<F>(n1: usize, n2: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let rows = (0..n1)
            .map(|i1| (0..n2).map(|i2| Some(f(i1, i2))).collect())
            .collect();

        Self { rows, n2 }
    }

    pub fn set(&mut self, index1: usize, index2: usize, value: f64) {
        self.rows[index1][index2] = Some(value);
    }

    pub fn seq1(&self) -> SequenceRef {
        SequenceRef::new(Self::SEQ1, self.rows.len())
    }

    pub fn seq2(&self) -> SequenceRef {
        SequenceRef::new(Self::SEQ2, self.n2)
    }
}

impl PairwiseScorer for TableScorer {
    fn score(&mut self, seq1: SequenceId, seq2: SequenceId, index1: usize, index2: usize) -> Result<f64, VqalignError> {
        if (seq1, seq2) != (Self::SEQ1, Self::SEQ2) {
            return Err(VqalignError::scorer_failure(
                index1, index2, format!("unknown sequence pair {seq1}/{seq2}")));
        }

        self.rows.get(index1)
            .and_then(|row| row.get(index2))
            .ok_or_else(|| VqalignError::scorer_failure(index1, index2, "index out of range"))?
            .ok_or_else(|| VqalignError::scorer_failure(index1, index2, "missing similarity value"))
    }
}


#[cfg(test)]
mod tests {
    use super::{PairwiseScorer, SequenceId, TableScorer};

    #[test]
    fn test_table_scorer() {
        let mut scorer = TableScorer::new(vec![
            vec![0.5, 1.0, 0.0],
            vec![0.25, 0.75, 1.0],
        ]).unwrap();

        assert_eq!(scorer.seq1().len, 2);
        assert_eq!(scorer.seq2().len, 3);
        assert_eq!(scorer.score(TableScorer::SEQ1, TableScorer::SEQ2, 1, 1).unwrap(), 0.75);

        assert!(scorer.score(TableScorer::SEQ1, TableScorer::SEQ2, 2, 0).unwrap_err().is_scorer_failure());
        assert!(scorer.score(SequenceId(5), TableScorer::SEQ2, 0, 0).is_err());
    }

    #[test]
    fn test_ragged_rows() {
        assert!(TableScorer::new(vec![vec![0.5, 1.0], vec![0.25]]).is_err());
    }

    #[test]
    fn test_missing_value() {
        let mut scorer = TableScorer::with_missing(vec![vec![Some(0.5), None]]).unwrap();
        let err = scorer.score(TableScorer::SEQ1, TableScorer::SEQ2, 0, 1).unwrap_err();
        assert!(err.is_scorer_failure());
    }

    #[test]
    fn test_empty_table() {
        let scorer = TableScorer::new(Vec::new()).unwrap();
        assert_eq!(scorer.seq1().len, 0);
        assert_eq!(scorer.seq2().len, 0);

        let scorer = TableScorer::from_fn(0, 4, |_, _| 1.0);
        assert_eq!(scorer.seq1().len, 0);
        assert_eq!(scorer.seq2().len, 4);
    }
}
