//! Unit tests for CLI parsing, execution, and rendering.
#![expect(clippy::expect_used, reason = "tests require contextual panics")]

use clap::Parser;
use rstest::rstest;

use banditfeed_core::ConfigError;

use super::{Cli, CliError, Command, ExecutionSummary, Policy, Split, render_summary, run_cli};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments must parse")
}

#[rstest]
fn fetch_parses_with_defaults() {
    let cli = parse(&["banditfeed", "fetch"]);
    let Command::Fetch(fetch) = cli.command else {
        panic!("expected a fetch command");
    };
    assert!(!fetch.corpus.fake_data);
    assert!(!fetch.corpus.no_normalize);
    assert_eq!(fetch.corpus.validation_size, 5_000);
}

#[rstest]
fn sample_parses_overrides() {
    let cli = parse(&[
        "banditfeed",
        "sample",
        "--fake-data",
        "--batch-size",
        "8",
        "--seed",
        "42",
        "--mix",
        "--components",
        "2",
    ]);
    let Command::Sample(sample) = cli.command else {
        panic!("expected a sample command");
    };
    assert!(sample.corpus.fake_data);
    assert_eq!(sample.split, Split::Train);
    assert_eq!(sample.batch_size, 8);
    assert_eq!(sample.seed, 42);
    assert!(sample.mix);
    assert_eq!(sample.components, Some(2));
}

#[rstest]
#[case("train", Split::Train)]
#[case("validation", Split::Validation)]
#[case("test", Split::Test)]
fn sample_parses_splits(#[case] raw: &str, #[case] expected: Split) {
    let cli = parse(&["banditfeed", "sample", "--split", raw]);
    let Command::Sample(sample) = cli.command else {
        panic!("expected a sample command");
    };
    assert_eq!(sample.split, expected);
}

#[rstest]
#[case("random-policy", Policy::RandomPolicy)]
#[case("logged-bandit", Policy::LoggedBandit)]
fn simulate_parses_policies(#[case] raw: &str, #[case] expected: Policy) {
    let cli = parse(&["banditfeed", "simulate", "--policy", raw]);
    let Command::Simulate(simulate) = cli.command else {
        panic!("expected a simulate command");
    };
    assert_eq!(simulate.policy, expected);
}

#[rstest]
fn simulate_rejects_unknown_policies() {
    assert!(Cli::try_parse_from(["banditfeed", "simulate", "--policy", "greedy"]).is_err());
}

#[rstest]
fn fetch_with_fake_data_reports_constant_splits() {
    let cli = parse(&["banditfeed", "fetch", "--fake-data"]);
    let summary = run_cli(cli).expect("fake loads never touch the network");
    assert_eq!(
        summary,
        ExecutionSummary::Fetch {
            train: 10_000,
            validation: 10_000,
            test: 10_000,
        }
    );
}

#[rstest]
fn sample_with_fake_data_draws_constant_batches() {
    let cli = parse(&["banditfeed", "sample", "--fake-data", "--batch-size", "4"]);
    let summary = run_cli(cli).expect("fake pools always serve");
    let ExecutionSummary::Sample {
        examples,
        feature_len,
        labels,
    } = summary
    else {
        panic!("expected a plain sample summary");
    };
    assert_eq!(examples, 4);
    assert_eq!(feature_len, 784);
    assert_eq!(labels, vec![0, 0, 0, 0]);
}

#[rstest]
fn sample_mix_composes_scenes() {
    let cli = parse(&[
        "banditfeed",
        "sample",
        "--fake-data",
        "--batch-size",
        "2",
        "--mix",
        "--components",
        "2",
    ]);
    let summary = run_cli(cli).expect("fake pools always serve");
    let ExecutionSummary::Scenes {
        scenes,
        components,
        width,
        height,
        labels,
    } = summary
    else {
        panic!("expected a scene summary");
    };
    assert_eq!(scenes, 2);
    assert_eq!(components, 2);
    assert_eq!((width, height), (45, 45));
    assert_eq!(labels, vec![0, 0, 0, 0]);
}

#[rstest]
fn sample_mix_rejects_zero_components() {
    let cli = parse(&[
        "banditfeed",
        "sample",
        "--fake-data",
        "--mix",
        "--components",
        "0",
    ]);
    let err = run_cli(cli).expect_err("zero components cannot compose scenes");
    assert!(matches!(err, CliError::Config(ConfigError::ZeroComponents)));
}

#[rstest]
#[case("random-policy")]
#[case("logged-bandit")]
fn simulate_with_fake_data_produces_bounded_rewards(#[case] policy: &str) {
    let cli = parse(&[
        "banditfeed",
        "simulate",
        "--fake-data",
        "--batch-size",
        "32",
        "--policy",
        policy,
    ]);
    let summary = run_cli(cli).expect("fake pools always serve");
    let ExecutionSummary::Simulate {
        interactions,
        num_actions,
        mean_reward,
        positive,
    } = summary
    else {
        panic!("expected a simulation summary");
    };
    assert_eq!(interactions, 32);
    assert_eq!(num_actions, 10);
    assert!((0.0..=2.0).contains(&mean_reward));
    assert!(positive <= interactions);
}

#[rstest]
fn render_summary_writes_one_field_per_line() {
    let summary = ExecutionSummary::Simulate {
        interactions: 8,
        num_actions: 10,
        mean_reward: 1.25,
        positive: 6,
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer).expect("rendering to a vec cannot fail");
    let rendered = String::from_utf8(buffer).expect("summary output is UTF-8");
    assert_eq!(
        rendered,
        "interactions: 8\nactions: 10\nmean reward: 1.2500\npositive rewards: 6\n"
    );
}

#[rstest]
fn render_summary_previews_scene_labels() {
    let summary = ExecutionSummary::Scenes {
        scenes: 1,
        components: 3,
        width: 45,
        height: 45,
        labels: vec![4, 0, 9],
    };
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer).expect("rendering to a vec cannot fail");
    let rendered = String::from_utf8(buffer).expect("summary output is UTF-8");
    assert!(rendered.contains("canvas: 45x45"));
    assert!(rendered.contains("labels: [4, 0, 9]"));
}
