//! Alignment engines.
//!
//! All engines find a minimum cost monotone path through the [`Grid`](grid::Grid) of partial
//! alignments, and only differ in how they explore it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, warn, Level};

use crate::errors::VqalignError;
use crate::scorer::{PairwiseScorer, SequenceId, SequenceRef};

pub mod alignment;
pub mod astar;
pub mod baseline;
pub mod bidirectional;
pub mod costs;
pub mod dp;
pub mod grid;
pub mod queue;
pub mod utils;

pub use alignment::{normalize_score, AlignmentResult, EditOp, EditScript, PathCost, SearchStats};
pub use astar::AstarAligner;
pub use baseline::BaselineAligner;
pub use bidirectional::BidirectionalAligner;
pub use costs::CostModel;
pub use dp::{DpAligner, DpRecoveryAligner};

/// The available alignment engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    #[default]
    Astar,
    Bidirectional,
    Dp,
    DpRecovery,
    Baseline,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Astar,
        Algorithm::Bidirectional,
        Algorithm::Dp,
        Algorithm::DpRecovery,
        Algorithm::Baseline,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Astar => "astar",
            Self::Bidirectional => "bidirectional",
            Self::Dp => "dp",
            Self::DpRecovery => "dp-recovery",
            Self::Baseline => "baseline",
        }
    }

    /// Whether the engine finds a minimum cost alignment
    pub fn is_optimal(&self) -> bool {
        !matches!(self, Self::Baseline)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| format!("unknown algorithm '{s}'"))
    }
}

/// What to do when the pairwise scorer can't produce a similarity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScorerFailurePolicy {
    /// Abort the alignment and return the scorer error
    #[default]
    Propagate,

    /// Log a warning and continue as if the pair had zero similarity
    SubstituteZero,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    pub costs: CostModel,
    pub on_scorer_failure: ScorerFailurePolicy,
    pub algorithm: Algorithm,
}

impl AlignmentConfig {
    pub fn new(costs: CostModel, on_scorer_failure: ScorerFailurePolicy, algorithm: Algorithm) -> Self {
        Self { costs, on_scorer_failure, algorithm }
    }
}

/// The contract shared by all engines: align `seq1` to `seq2`, requesting similarities of
/// matched items from `scorer`.
pub trait AlignmentEngine {
    fn align<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<AlignmentResult, VqalignError>
    where
        S: PairwiseScorer + ?Sized;
}

/// Binds a pairwise scorer to the sequence pair under alignment.
///
/// Validates returned similarities, applies the scorer failure policy and counts the number of
/// scorer invocations.
pub struct MatchScoring<'a, S: ?Sized> {
    scorer: &'a mut S,
    seq1: SequenceId,
    seq2: SequenceId,
    policy: ScorerFailurePolicy,
    num_scored: usize,
}

impl<'a, S> MatchScoring<'a, S>
where
    S: PairwiseScorer + ?Sized,
{
    pub fn new(scorer: &'a mut S, seq1: SequenceId, seq2: SequenceId, policy: ScorerFailurePolicy) -> Self {
        Self {
            scorer,
            seq1,
            seq2,
            policy,
            num_scored: 0,
        }
    }

    /// Similarity of item `index1` of sequence 1 and item `index2` of sequence 2
    pub fn similarity(&mut self, index1: usize, index2: usize) -> Result<f64, VqalignError> {
        self.num_scored += 1;

        let result = self.scorer.score(self.seq1, self.seq2, index1, index2)
            .and_then(|value| if (0.0..=1.0).contains(&value) {
                Ok(value)
            } else {
                Err(VqalignError::InvalidSimilarity { index1, index2, value })
            });

        match result {
            Err(e) if e.is_scorer_failure() && self.policy == ScorerFailurePolicy::SubstituteZero => {
                warn!(index1, index2, "{e}, using zero similarity instead.");
                Ok(0.0)
            },
            other => other,
        }
    }

    pub fn num_scored(&self) -> usize {
        self.num_scored
    }
}

/// Runs the engine selected in an [`AlignmentConfig`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Aligner {
    config: AlignmentConfig,
}

impl Aligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Align two sequences and compute the normalized similarity of the resulting alignment.
    pub fn similarity<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<(f64, AlignmentResult), VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let result = self.align(seq1, seq2, scorer)?;
        let similarity = result.similarity()?;

        Ok((similarity, result))
    }
}

impl AlignmentEngine for Aligner {
    fn align<S>(&self, seq1: SequenceRef, seq2: SequenceRef, scorer: &mut S) -> Result<AlignmentResult, VqalignError>
    where
        S: PairwiseScorer + ?Sized,
    {
        let span = span!(Level::INFO, "align", algorithm = %self.config.algorithm, n1 = seq1.len, n2 = seq2.len);
        let _enter = span.enter();

        let result = match self.config.algorithm {
            Algorithm::Astar => AstarAligner::<astar::heuristic::MinIndelCost>::new(self.config)
                .align(seq1, seq2, scorer),
            Algorithm::Bidirectional => BidirectionalAligner::new(self.config)
                .align(seq1, seq2, scorer),
            Algorithm::Dp => DpAligner::new(self.config)
                .align(seq1, seq2, scorer),
            Algorithm::DpRecovery => DpRecoveryAligner::new(self.config)
                .align(seq1, seq2, scorer),
            Algorithm::Baseline => BaselineAligner::new(self.config)
                .align(seq1, seq2, scorer),
        }?;

        info!(
            cost = result.total_cost,
            length = result.path_length,
            num_scored = result.stats.num_scored,
            num_queued = result.stats.num_queued,
            num_closed = result.stats.num_closed,
            "Alignment done."
        );
        debug!(max_queue_len = result.stats.max_queue_len);

        Ok(result)
    }
}
