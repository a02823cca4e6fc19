use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum VqalignError {
    /// A sequence manifest could not be opened or read
    SequenceLoad { path: PathBuf, source: io::Error },

    /// The pairwise scorer could not produce an item at the requested indices
    ScorerFailure { index1: usize, index2: usize, reason: String },

    /// The pairwise scorer returned a value that is not a similarity in [0, 1]
    InvalidSimilarity { index1: usize, index2: usize, value: f64 },

    /// Normalizing an alignment without any transitions (both sequences empty)
    EmptyAlignment,

    /// The search queue or DP fill ended without reaching the goal node
    SearchExhausted,

    /// Insertion or deletion values outside of [0, 1]
    InvalidCostModel(String),

    /// A frame file could not be decoded
    InvalidFrame { path: PathBuf, reason: String },

    /// A similarity matrix file is malformed
    InvalidTable { line: usize, reason: String },

    /// Error variant when we could not serialize debug data
    SerializationError { source: serde_json::Error },

    /// Other IO errors
    IOError(io::Error),
}

impl VqalignError {
    pub fn scorer_failure(index1: usize, index2: usize, reason: impl Into<String>) -> Self {
        Self::ScorerFailure { index1, index2, reason: reason.into() }
    }

    /// Errors that originate from the pairwise scorer, and which are therefore subject to
    /// the configured scorer failure policy.
    pub fn is_scorer_failure(&self) -> bool {
        matches!(self, Self::ScorerFailure { .. } | Self::InvalidSimilarity { .. })
    }
}

impl Error for VqalignError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Self::SequenceLoad { ref source, .. } => Some(source),
            Self::SerializationError { ref source } => Some(source),
            Self::IOError(ref source) => Some(source),
            _ => None
        }
    }
}

impl From<io::Error> for VqalignError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<serde_json::Error> for VqalignError {
    fn from(value: serde_json::Error) -> Self {
        Self::SerializationError {
            source: value
        }
    }
}

impl Display for VqalignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::SequenceLoad { ref path, source: _ } =>
                write!(f, "Unable to load sequence manifest {}!", path.display()),
            Self::ScorerFailure { index1, index2, ref reason } =>
                write!(f, "Could not score item pair ({index1}, {index2}): {reason}"),
            Self::InvalidSimilarity { index1, index2, value } =>
                write!(f, "Scorer returned similarity {value} for item pair ({index1}, {index2}), expected a value in [0, 1]!"),
            Self::EmptyAlignment =>
                write!(f, "Can't compute a similarity score for an empty alignment (both sequences are empty)!"),
            Self::SearchExhausted =>
                write!(f, "Alignment search ended before reaching the end of both sequences!"),
            Self::InvalidCostModel(ref msg) =>
                write!(f, "Invalid cost model: {msg}"),
            Self::InvalidFrame { ref path, ref reason } =>
                write!(f, "Could not decode frame {}: {reason}", path.display()),
            Self::InvalidTable { line, ref reason } =>
                write!(f, "Invalid similarity table at line {line}: {reason}"),
            Self::SerializationError { source: _ } =>
                write!(f, "Could not serialize debug output!"),
            Self::IOError(ref err) =>
                err.fmt(f),
        }
    }
}
