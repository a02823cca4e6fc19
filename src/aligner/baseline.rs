use tracing::debug;

use crate::aligner::{AlignmentConfig, AlignmentEngine, MatchScoring};
use crate::aligner::alignment::{AlignmentResult, SearchStats};
use crate::errors::VqalignError;
use crate::scorer::{PairwiseScorer, SequenceRef};

/// Compares items with equal indices without any alignment. Items beyond the end of the shorter
/// sequence count as zero similarity.
pub struct BaselineAligner {
    config: AlignmentConfig,
}

impl BaselineAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }
}

impl AlignmentEngine for BaselineAligner {
    fn align<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<AlignmentResult, VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let mut scoring = MatchScoring::new(scorer, seq1.id, seq2.id, self.config.on_scorer_failure);

        let mut total_similarity = 0.0;
        for i in 0..seq1.len.min(seq2.len) {
            total_similarity += scoring.similarity(i, i)?;
        }

        let length = seq1.len.max(seq2.len);
        debug!(total_similarity, length, "END");

        Ok(AlignmentResult::new(length as f64 - total_similarity, length)
            .with_stats(SearchStats { num_scored: scoring.num_scored(), ..Default::default() }))
    }
}
