use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info, span, Level};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use vqalign::aligner::utils::format_edit_script;
use vqalign::aligner::{Aligner, AlignmentConfig, CostModel};
use vqalign::debug::messages::DebugOutputMessage;
use vqalign::debug::DebugOutputWriter;
use vqalign::io::load_table;
use vqalign::scorer::{FrameScorer, PairwiseScorer, SequenceRef};

mod cli;

/// Exit status for any failure, reported as 255 by the shell
const EXIT_FAILURE: u8 = u8::MAX;

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(filter_layer);

    Registry::default().with(stderr_log).try_init()?;

    Ok(())
}

fn main() -> ExitCode {
    let args = match cli::CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();

            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_FAILURE),
            };
        }
    };

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("Could not initialize logging: {e}");
    }

    let result = match (&args.command, &args.compare) {
        (Some(cli::CliSubcommand::Compare(v)), _) | (None, Some(v)) => compare_subcommand(v),
        (Some(cli::CliSubcommand::Table(v)), _) => table_subcommand(v),
        (None, None) => Err(anyhow!("No videos to compare, see --help")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn pair_name(path1: &Path, path2: &Path) -> String {
    let stem = |p: &Path| p.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());

    format!("{}_vs_{}", stem(path1), stem(path2))
}

fn compare_subcommand(args: &cli::CompareArgs) -> Result<()> {
    let span = span!(Level::INFO, "compare");
    let _enter = span.enter();

    let mut scorer = FrameScorer::with_cache_capacity(args.cache_size);

    let seq1 = scorer.load_manifest(&args.manifest1)
        .with_context(|| format!("Could not load the first sequence from {}", args.manifest1.display()))?;
    let seq2 = scorer.load_manifest(&args.manifest2)
        .with_context(|| format!("Could not load the second sequence from {}", args.manifest2.display()))?;

    info!("Comparing {} frames against {} frames...", seq1.len, seq2.len);

    let name = pair_name(&args.manifest1, &args.manifest2);
    perform_alignment(&args.align, &name, seq1, seq2, &mut scorer)?;

    for (seq, manifest) in [(seq1, &args.manifest1), (seq2, &args.manifest2)] {
        if let Some((hits, misses)) = scorer.cache_stats(seq.id) {
            info!("Frame cache for {}: {hits} hits, {misses} misses", manifest.display());
        }
    }

    Ok(())
}

fn table_subcommand(args: &cli::TableArgs) -> Result<()> {
    let span = span!(Level::INFO, "table");
    let _enter = span.enter();

    let mut scorer = load_table(&args.matrix)
        .with_context(|| format!("Could not load similarity matrix {}", args.matrix.display()))?;
    let (seq1, seq2) = (scorer.seq1(), scorer.seq2());

    let name = args.matrix.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "matrix".to_string());

    perform_alignment(&args.align, &name, seq1, seq2, &mut scorer)
}

fn perform_alignment<S>(
    opts: &cli::AlignOpts,
    name: &str,
    seq1: SequenceRef,
    seq2: SequenceRef,
    scorer: &mut S,
) -> Result<()>
where
    S: PairwiseScorer,
{
    let costs = CostModel::new(opts.inserted_frame_value, opts.deleted_frame_value)?;
    let config = AlignmentConfig::new(costs, opts.on_scorer_failure.into(), opts.algorithm.into());

    let debug_writer = opts.debug_output.as_ref()
        .map(DebugOutputWriter::new);

    if let Some(debug) = &debug_writer {
        debug.log(DebugOutputMessage::NewPair {
            pair_name: name.to_string(),
            n1: seq1.len,
            n2: seq2.len,
            config,
        });
    }

    let aligner = Aligner::new(config);
    let result = aligner.similarity(seq1, seq2, scorer);

    if let Some(debug) = debug_writer {
        if let Ok((_, ref aln)) = result {
            debug.log(DebugOutputMessage::new_from_result(aln));
        }

        debug.join()
            .context("Could not write debug output")?;
    }

    let (similarity, aln) = result
        .with_context(|| format!("Could not align {name} using the {} engine", config.algorithm))?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Score: {similarity:.4}")?;

    if opts.edit_script {
        match &aln.edit_script {
            Some(script) => writeln!(stdout, "{}", format_edit_script(script))?,
            None => info!("The {} engine does not recover the alignment.", config.algorithm),
        }
    }

    Ok(())
}
