use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vqalign::aligner::astar::heuristic::{Dijkstra, MinIndelCost};
use vqalign::aligner::{
    AlignmentConfig, AlignmentEngine, AlignmentResult, AstarAligner, BidirectionalAligner, CostModel, DpAligner,
    DpRecoveryAligner,
};
use vqalign::TableScorer;

const TOLERANCE: f64 = 1e-9;

/// Plain full-table DP, used as the reference optimum
fn reference_cost(sims: &[Vec<f64>], n2: usize, ins: f64, del: f64) -> f64 {
    let n1 = sims.len();
    let mut prev: Vec<f64> = (0..=n2).map(|j| j as f64 * (1.0 - ins)).collect();

    for i in 1..=n1 {
        let mut curr = vec![i as f64 * (1.0 - del); n2 + 1];
        for j in 1..=n2 {
            curr[j] = (prev[j - 1] + 1.0 - sims[i - 1][j - 1])
                .min(prev[j] + 1.0 - del)
                .min(curr[j - 1] + 1.0 - ins);
        }
        prev = curr;
    }

    prev[n2]
}

fn run_all(sims: &[Vec<f64>], n2: usize, ins: f64, del: f64) -> Vec<(&'static str, AlignmentResult)> {
    let costs = CostModel::new(ins, del).unwrap();
    let config = AlignmentConfig { costs, ..Default::default() };

    let mut scorer = TableScorer::from_fn(sims.len(), n2, |i1, i2| sims[i1][i2]);
    let (seq1, seq2) = (scorer.seq1(), scorer.seq2());

    vec![
        ("astar", AstarAligner::<MinIndelCost>::new(config).align(seq1, seq2, &mut scorer).unwrap()),
        ("dijkstra", AstarAligner::<Dijkstra>::new(config).align(seq1, seq2, &mut scorer).unwrap()),
        ("bidirectional", BidirectionalAligner::new(config).align(seq1, seq2, &mut scorer).unwrap()),
        ("dp", DpAligner::new(config).align(seq1, seq2, &mut scorer).unwrap()),
        ("dp-recovery", DpRecoveryAligner::new(config).align(seq1, seq2, &mut scorer).unwrap()),
    ]
}

fn similarity_table() -> impl Strategy<Value = (Vec<Vec<f64>>, usize, f64, f64)> {
    (1usize..9, 1usize..9).prop_flat_map(|(n1, n2)| (
        prop::collection::vec(prop::collection::vec(0.0f64..1.0, n2), n1),
        Just(n2),
        0.0f64..1.0,
        0.0f64..1.0,
    ))
}

/// Similarities and frame values on a quarter grid, where equal-cost paths of different
/// lengths are common and sums are exact
fn quarter_valued_table() -> impl Strategy<Value = (Vec<Vec<f64>>, usize, f64, f64)> {
    let quarter = || prop::sample::select(vec![0.0, 0.25, 0.5, 0.75, 1.0]);

    (1usize..8, 1usize..8).prop_flat_map(move |(n1, n2)| (
        prop::collection::vec(prop::collection::vec(quarter(), n2), n1),
        Just(n2),
        quarter(),
        quarter(),
    ))
}

proptest! {
    #[test]
    fn engines_break_ties_alike((sims, n2, ins, del) in quarter_valued_table()) {
        let expected = reference_cost(&sims, n2, ins, del);
        let results = run_all(&sims, n2, ins, del);
        let dp = &results[3].1;

        prop_assert_eq!(dp.total_cost, expected);
        for (name, result) in &results {
            prop_assert_eq!(result.total_cost, dp.total_cost, "{} cost", name);
            prop_assert_eq!(result.path_length, dp.path_length, "{} path length", name);
            prop_assert_eq!(result.similarity().unwrap(), dp.similarity().unwrap(), "{} score", name);
        }
    }

    #[test]
    fn engines_agree_with_reference((sims, n2, ins, del) in similarity_table()) {
        let expected = reference_cost(&sims, n2, ins, del);
        let results = run_all(&sims, n2, ins, del);
        let dp_length = results[3].1.path_length;

        for (name, result) in &results {
            prop_assert!((result.total_cost - expected).abs() < TOLERANCE,
                "{} cost {} differs from reference {}", name, result.total_cost, expected);
            prop_assert_eq!(result.path_length, dp_length, "{} path length", name);
        }
    }
}

#[test]
fn engines_agree_on_larger_tables() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..40 {
        let n1 = rng.gen_range(1..40);
        let n2 = rng.gen_range(1..40);
        let ins = rng.gen_range(0.0..1.0);
        let del = rng.gen_range(0.0..1.0);

        // Mostly similar near the diagonal, like frames of two encodings of the same video
        let shift: isize = rng.gen_range(-3..=3);
        let sims: Vec<Vec<f64>> = (0..n1)
            .map(|i| (0..n2)
                .map(|j| {
                    let offset = (i as isize - j as isize - shift).unsigned_abs();
                    if offset == 0 { rng.gen_range(0.8..1.0) } else { rng.gen_range(0.0..0.6) }
                })
                .collect())
            .collect();

        let expected = reference_cost(&sims, n2, ins, del);
        for (name, result) in run_all(&sims, n2, ins, del) {
            assert!((result.total_cost - expected).abs() < TOLERANCE,
                "{name} ({n1}x{n2}): cost {} differs from reference {expected}", result.total_cost);
        }
    }
}

#[test]
fn search_engines_score_fewer_pairs_than_dp() {
    let n = 30;
    let sims: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 0.95 } else { 0.1 }).collect())
        .collect();

    let results = run_all(&sims, n, 0.0, 0.0);
    let dp_scored = results[3].1.stats.num_scored;
    assert_eq!(dp_scored, n * n);

    let astar = &results[0].1;
    assert!(astar.stats.num_scored < dp_scored);
    assert!(astar.stats.num_closed > 0);
    assert!(astar.stats.max_queue_len <= astar.stats.num_queued);
}
