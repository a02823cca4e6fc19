use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{Rgb, RgbImage};

fn vqalign(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vqalign"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vqalign-cli-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_frame(dir: &Path, name: &str, seed: u8) -> PathBuf {
    let image = RgbImage::from_fn(16, 16, |x, y| {
        let i = (y * 16 + x) * 3;
        Rgb([0, 1, 2].map(|c| ((i + c) * seed as u32 * 31 % 251) as u8))
    });

    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

fn write_manifest(dir: &Path, name: &str, frames: &[&PathBuf]) -> PathBuf {
    let contents: String = frames.iter()
        .map(|p| format!("{}\n", p.display()))
        .collect();

    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn table_identity_scores_one() {
    let dir = scratch_dir("identity");
    let matrix = dir.join("identity.tsv");
    std::fs::write(&matrix, "# identity\n1\t0.2\t0.1\n0.2\t1\t0.3\n0.1\t0.3\t1\n").unwrap();

    for algorithm in ["astar", "bidirectional", "dp", "dp-recovery", "baseline"] {
        let output = vqalign(&["table", "-a", algorithm, matrix.to_str().unwrap()]);

        assert!(output.status.success(), "{algorithm}");
        assert_eq!(stdout(&output), "Score: 1.0000\n", "{algorithm}");
    }

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn table_prints_edit_script() {
    let dir = scratch_dir("script");
    let matrix = dir.join("shifted.tsv");
    std::fs::write(&matrix, "0 0\n1 0\n0 1\n").unwrap();

    let output = vqalign(&["table", "-e", matrix.to_str().unwrap()]);
    assert!(output.status.success());

    let text = stdout(&output);
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Score: 0.6667"));

    let actions: Vec<_> = lines.collect();
    assert_eq!(actions.len(), 3);
    assert!(actions[0].starts_with("Action = DELETED"));
    assert!(actions[1].starts_with("Action = MATCH"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn compare_frame_sequences() {
    let dir = scratch_dir("compare");

    let frames: Vec<_> = (1..=5u8)
        .map(|seed| write_frame(&dir, &format!("frame{seed}.bmp"), seed))
        .collect();

    let original = write_manifest(&dir, "original.txt", &frames.iter().collect::<Vec<_>>());
    let dropped = write_manifest(&dir, "dropped.txt", &[&frames[0], &frames[1], &frames[3], &frames[4]]);

    let output = vqalign(&["compare", original.to_str().unwrap(), original.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Score: 1.0000\n");

    // Comparing is also what happens without a subcommand
    let explicit = vqalign(&["compare", "-a", "dp", original.to_str().unwrap(), dropped.to_str().unwrap()]);
    let implicit = vqalign(&["-a", "dp", original.to_str().unwrap(), dropped.to_str().unwrap()]);
    assert!(implicit.status.success());
    assert_eq!(stdout(&implicit), stdout(&explicit));

    let debug_dir = dir.join("debug");
    let output = vqalign(&[
        "compare", "-a", "dp",
        "--debug-output", debug_dir.to_str().unwrap(),
        original.to_str().unwrap(), dropped.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let score: f64 = stdout(&output).trim()
        .strip_prefix("Score: ").unwrap()
        .parse().unwrap();
    assert!(score > 0.75 && score < 1.0, "{score}");

    let debug = std::fs::read_to_string(debug_dir.join("original_vs_dropped.jsonl")).unwrap();
    assert_eq!(debug.lines().count(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn failures_exit_with_minus_one() {
    let dir = scratch_dir("failures");

    let output = vqalign(&["compare", dir.join("missing1.txt").to_str().unwrap(), dir.join("missing2.txt").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(255));
    assert!(output.stdout.is_empty());

    let ragged = dir.join("ragged.tsv");
    std::fs::write(&ragged, "1 0\n0\n").unwrap();
    let output = vqalign(&["table", ragged.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(255));

    let square = dir.join("square.tsv");
    std::fs::write(&square, "1 0\n0 1\n").unwrap();
    let output = vqalign(&["table", "-i", "1.5", square.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(255));

    let output = vqalign(&["compare"]);
    assert_eq!(output.status.code(), Some(255));

    let output = vqalign(&[]);
    assert_eq!(output.status.code(), Some(255));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_similarity_can_be_substituted() {
    let dir = scratch_dir("missing");
    let matrix = dir.join("missing.tsv");
    std::fs::write(&matrix, "NA 0\n0 1\n").unwrap();

    let output = vqalign(&["table", "-a", "dp", matrix.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(255));

    let output = vqalign(&["table", "-a", "dp", "--on-scorer-failure", "zero", matrix.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Score: 0.5000\n");

    std::fs::remove_dir_all(&dir).unwrap();
}
