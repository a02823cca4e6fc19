//! Alignment of video frame sequences.
//!
//! Two sequences that may differ by inserted, dropped or stalled frames are aligned with one
//! of several engines, and the alignment is summarized as a normalized similarity score.

pub mod aligner;
pub mod cache;
pub mod debug;
pub mod errors;
pub mod io;
pub mod scorer;

pub use aligner::{Aligner, AlignmentConfig, AlignmentEngine, AlignmentResult, Algorithm, CostModel, ScorerFailurePolicy};
pub use errors::VqalignError;
pub use scorer::{PairwiseScorer, SequenceId, SequenceRef, TableScorer};
