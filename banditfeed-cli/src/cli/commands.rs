//! Command implementations and argument parsing for the banditfeed CLI.

use std::io::{self, Write};
use std::path::PathBuf;

use banditfeed_core::{
    BanditError, ConfigError, DEFAULT_VALIDATION_SIZE, DataSets, LoadError, LoadOptions, PoolError,
    SceneError, SceneParams, next_scene_batch, random_policy, simulate_logged_bandit,
};
use banditfeed_providers_idx::{IdxConfig, IdxCorpus};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::info;

const DEFAULT_BATCH_SIZE: usize = 16;
/// Number of labels echoed in batch summaries.
const LABEL_PREVIEW: usize = 10;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "banditfeed",
    about = "Prepare a handwritten-digit corpus and simulate bandit feedback."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Fetch the corpus, decode it, and report the split sizes.
    Fetch(FetchCommand),
    /// Draw one batch from the training pool and summarise it.
    Sample(SampleCommand),
    /// Run a bandit-feedback simulation over the training pool.
    Simulate(SimulateCommand),
}

/// Corpus acquisition and loading options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct CorpusArgs {
    /// Directory where compressed corpus files are cached.
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Base URL hosting the gzip IDX corpus files.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Serve constant fake pools without touching the network.
    #[arg(long = "fake-data")]
    pub fake_data: bool,

    /// Rescale pixels into [0, 1] instead of mean/std normalisation.
    #[arg(long = "no-normalize")]
    pub no_normalize: bool,

    /// Expose one-hot label views from every batch.
    #[arg(long = "one-hot")]
    pub one_hot: bool,

    /// Training examples held out as the validation split.
    #[arg(long = "validation-size", default_value_t = DEFAULT_VALIDATION_SIZE)]
    pub validation_size: usize,
}

/// Options accepted by the `fetch` command.
#[derive(Debug, Args, Clone)]
pub struct FetchCommand {
    /// Corpus acquisition options.
    #[command(flatten)]
    pub corpus: CorpusArgs,
}

/// Options accepted by the `sample` command.
#[derive(Debug, Args, Clone)]
pub struct SampleCommand {
    /// Corpus acquisition options.
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Corpus split to draw from.
    #[arg(long, value_enum, default_value_t = Split::Train)]
    pub split: Split,

    /// Number of examples (or scenes) per batch.
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Seed for the deterministic sampling RNG.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Compose multi-digit scenes instead of plain batches.
    #[arg(long)]
    pub mix: bool,

    /// Override the number of digits mixed into each scene.
    #[arg(long)]
    pub components: Option<usize>,
}

/// Options accepted by the `simulate` command.
#[derive(Debug, Args, Clone)]
pub struct SimulateCommand {
    /// Corpus acquisition options.
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Number of interactions to simulate.
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Seed for the deterministic sampling RNG.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Reward simulation policy to run.
    #[arg(long, value_enum, default_value_t = Policy::RandomPolicy)]
    pub policy: Policy,
}

/// Supported reward simulation policies.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Policy {
    /// Label-biased random single-digit policy with partial-credit rewards.
    RandomPolicy,
    /// Uniform policy over composite scenes with binary membership rewards.
    LoggedBandit,
}

/// Corpus splits addressable from the command line.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Split {
    /// Training split, after the validation holdout.
    Train,
    /// Validation split held out from the training corpus.
    Validation,
    /// Test split.
    Test,
}

impl Split {
    fn select(self, data_sets: DataSets) -> banditfeed_core::ExamplePool {
        match self {
            Self::Train => data_sets.train,
            Self::Validation => data_sets.validation,
            Self::Test => data_sets.test,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading the corpus into pools failed.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// A command-line override produced an invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Drawing a plain batch failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Composing a scene batch failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// A bandit simulation failed.
    #[error(transparent)]
    Bandit(#[from] BanditError),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionSummary {
    /// Split sizes reported by `fetch`.
    Fetch {
        /// Training examples after the validation holdout.
        train: usize,
        /// Held-out validation examples.
        validation: usize,
        /// Test examples.
        test: usize,
    },
    /// Plain batch drawn by `sample`.
    Sample {
        /// Examples in the batch.
        examples: usize,
        /// Flattened feature length per example.
        feature_len: usize,
        /// Leading labels of the batch, at most [`LABEL_PREVIEW`].
        labels: Vec<u8>,
    },
    /// Scene batch drawn by `sample --mix`.
    Scenes {
        /// Scenes in the batch.
        scenes: usize,
        /// Digits mixed into each scene.
        components: usize,
        /// Canvas width in pixels.
        width: usize,
        /// Canvas height in pixels.
        height: usize,
        /// Leading component labels, at most [`LABEL_PREVIEW`].
        labels: Vec<u8>,
    },
    /// Interaction log produced by `simulate`.
    Simulate {
        /// Interactions in the simulated log.
        interactions: usize,
        /// Size of the action space.
        num_actions: usize,
        /// Mean observed reward.
        mean_reward: f32,
        /// Interactions with a strictly positive reward.
        positive: usize,
    },
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading, sampling, or simulation fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use banditfeed_cli::cli::{Cli, ExecutionSummary, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let cli = Cli::try_parse_from(["banditfeed", "sample", "--fake-data", "--batch-size", "4"])?;
/// let summary = run_cli(cli)?;
/// assert!(matches!(summary, ExecutionSummary::Sample { examples: 4, .. }));
/// # Ok(())
/// # }
/// ```
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Fetch(fetch) => run_fetch(&fetch),
        Command::Sample(sample) => run_sample(sample),
        Command::Simulate(simulate) => run_simulate(simulate),
    }
}

fn run_fetch(command: &FetchCommand) -> Result<ExecutionSummary, CliError> {
    let data_sets = load_data_sets(&command.corpus)?;
    info!(
        train = data_sets.train.num_examples(),
        validation = data_sets.validation.num_examples(),
        test = data_sets.test.num_examples(),
        "corpus fetched and decoded"
    );
    Ok(ExecutionSummary::Fetch {
        train: data_sets.train.num_examples(),
        validation: data_sets.validation.num_examples(),
        test: data_sets.test.num_examples(),
    })
}

fn run_sample(command: SampleCommand) -> Result<ExecutionSummary, CliError> {
    let data_sets = load_data_sets(&command.corpus)?;
    let mut pool = command.split.select(data_sets);
    let mut rng = SmallRng::seed_from_u64(command.seed);

    if command.mix {
        let mut params = SceneParams::from_config(pool.config()).with_batch_size(command.batch_size);
        if let Some(components) = command.components {
            params = params.with_num_components(components)?;
        }
        let scenes = next_scene_batch(&mut pool, &params, &mut rng)?;
        return Ok(ExecutionSummary::Scenes {
            scenes: scenes.len(),
            components: scenes.components(),
            width: scenes.width(),
            height: scenes.height(),
            labels: preview(scenes.labels()),
        });
    }

    let batch = pool.next_batch(command.batch_size, &mut rng)?;
    Ok(ExecutionSummary::Sample {
        examples: batch.len(),
        feature_len: batch.feature_len(),
        labels: preview(batch.labels()),
    })
}

fn run_simulate(command: SimulateCommand) -> Result<ExecutionSummary, CliError> {
    let data_sets = load_data_sets(&command.corpus)?;
    let mut train = data_sets.train;
    let mut rng = SmallRng::seed_from_u64(command.seed);

    let interactions = match command.policy {
        Policy::RandomPolicy => random_policy(&mut train, command.batch_size, &mut rng)?,
        Policy::LoggedBandit => simulate_logged_bandit(&mut train, command.batch_size, &mut rng)?,
    };

    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "the reward summary is a floating-point mean"
    )]
    let mean_reward = if interactions.is_empty() {
        0.0
    } else {
        interactions.rewards().iter().sum::<f32>() / interactions.len() as f32
    };
    let positive = interactions
        .rewards()
        .iter()
        .filter(|&&reward| reward > 0.0)
        .count();

    info!(
        interactions = interactions.len(),
        policy = ?command.policy,
        mean_reward,
        "simulation complete"
    );
    Ok(ExecutionSummary::Simulate {
        interactions: interactions.len(),
        num_actions: interactions.num_actions(),
        mean_reward,
        positive,
    })
}

fn load_data_sets(corpus: &CorpusArgs) -> Result<DataSets, CliError> {
    let mut idx_config = IdxConfig::default();
    if let Some(data_dir) = &corpus.data_dir {
        idx_config.cache_dir.clone_from(data_dir);
    }
    if let Some(base_url) = &corpus.base_url {
        idx_config.base_url.clone_from(base_url);
    }

    let options = LoadOptions {
        fake_data: corpus.fake_data,
        one_hot: corpus.one_hot,
        normalize: !corpus.no_normalize,
        validation_size: corpus.validation_size,
        ..LoadOptions::default()
    };
    let provider = IdxCorpus::new(idx_config);
    Ok(banditfeed_core::read_data_sets(&provider, &options)?)
}

fn preview(labels: &[u8]) -> Vec<u8> {
    labels.iter().copied().take(LABEL_PREVIEW).collect()
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Fetch {
            train,
            validation,
            test,
        } => {
            writeln!(writer, "train: {train}")?;
            writeln!(writer, "validation: {validation}")?;
            writeln!(writer, "test: {test}")?;
        }
        ExecutionSummary::Sample {
            examples,
            feature_len,
            labels,
        } => {
            writeln!(writer, "examples: {examples}")?;
            writeln!(writer, "features: {feature_len}")?;
            writeln!(writer, "labels: {labels:?}")?;
        }
        ExecutionSummary::Scenes {
            scenes,
            components,
            width,
            height,
            labels,
        } => {
            writeln!(writer, "scenes: {scenes}")?;
            writeln!(writer, "components: {components}")?;
            writeln!(writer, "canvas: {width}x{height}")?;
            writeln!(writer, "labels: {labels:?}")?;
        }
        ExecutionSummary::Simulate {
            interactions,
            num_actions,
            mean_reward,
            positive,
        } => {
            writeln!(writer, "interactions: {interactions}")?;
            writeln!(writer, "actions: {num_actions}")?;
            writeln!(writer, "mean reward: {mean_reward:.4}")?;
            writeln!(writer, "positive rewards: {positive}")?;
        }
    }
    Ok(())
}
