use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use vqalign::aligner::{Algorithm, ScorerFailurePolicy};
use vqalign::aligner::costs::{DEFAULT_DELETED_FRAME_VALUE, DEFAULT_INSERTED_FRAME_VALUE};
use vqalign::scorer::frames::DEFAULT_CACHE_CAPACITY;

/// The alignment engines available from the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// Forward A* search
    Astar,

    /// Bidirectional A* search, meeting in the middle
    Bidirectional,

    /// Exact dynamic programming over the full grid
    Dp,

    /// Dynamic programming, also recovering the alignment
    DpRecovery,

    /// No alignment, compare frames with equal indices
    Baseline,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Astar => Algorithm::Astar,
            AlgorithmArg::Bidirectional => Algorithm::Bidirectional,
            AlgorithmArg::Dp => Algorithm::Dp,
            AlgorithmArg::DpRecovery => Algorithm::DpRecovery,
            AlgorithmArg::Baseline => Algorithm::Baseline,
        }
    }
}

/// What to do with frame pairs that could not be scored
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicyArg {
    /// Abort with an error
    Propagate,

    /// Continue with zero similarity for that pair
    Zero,
}

impl From<FailurePolicyArg> for ScorerFailurePolicy {
    fn from(value: FailurePolicyArg) -> Self {
        match value {
            FailurePolicyArg::Propagate => ScorerFailurePolicy::Propagate,
            FailurePolicyArg::Zero => ScorerFailurePolicy::SubstituteZero,
        }
    }
}

/// Without a subcommand, the arguments are those of `compare`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
pub struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<CliSubcommand>,

    #[command(flatten)]
    pub compare: Option<CompareArgs>,
}

#[derive(Subcommand, Debug)]
pub enum CliSubcommand {
    /// Align two videos given as frame manifests and report their similarity
    Compare(CompareArgs),

    /// Align two sequences using a precomputed similarity matrix
    Table(TableArgs),
}

#[derive(Args, Debug)]
pub struct AlignOpts {
    /// Alignment engine to use
    #[arg(value_enum, short, long, default_value = "astar")]
    #[clap(help_heading = "Alignment configuration")]
    pub algorithm: AlgorithmArg,

    /// Similarity assigned to a frame only present in the second sequence
    #[arg(short, long, default_value_t = DEFAULT_INSERTED_FRAME_VALUE)]
    #[clap(help_heading = "Alignment configuration")]
    pub inserted_frame_value: f64,

    /// Similarity assigned to a frame only present in the first sequence
    #[arg(short, long, default_value_t = DEFAULT_DELETED_FRAME_VALUE)]
    #[clap(help_heading = "Alignment configuration")]
    pub deleted_frame_value: f64,

    /// What to do when a frame pair can't be scored
    #[arg(value_enum, long, default_value = "propagate")]
    #[clap(help_heading = "Alignment configuration")]
    pub on_scorer_failure: FailurePolicyArg,

    /// Print the edit script of the alignment, if the engine recovers it
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    pub edit_script: bool,

    /// Write JSON debug information on each alignment to the given directory
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    pub debug_output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Manifest listing the frames of the first video, optionally gzipped
    #[clap(help_heading = "Inputs")]
    pub manifest1: PathBuf,

    /// Manifest listing the frames of the second video, optionally gzipped
    #[clap(help_heading = "Inputs")]
    pub manifest2: PathBuf,

    /// Number of decoded frames to keep in memory per video
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_size: usize,

    #[command(flatten)]
    pub align: AlignOpts,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Similarity matrix, one row per item of the first sequence
    #[clap(help_heading = "Inputs")]
    pub matrix: PathBuf,

    #[command(flatten)]
    pub align: AlignOpts,
}
