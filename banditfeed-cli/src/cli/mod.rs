//! Command-line interface orchestration for the banditfeed pipeline.
//!
//! The CLI offers three commands: `fetch` loads and validates the corpus,
//! `sample` draws plain or composite batches from the training pool, and
//! `simulate` runs one of the bandit-feedback policies.

mod commands;

pub use commands::{
    Cli, CliError, Command, CorpusArgs, ExecutionSummary, FetchCommand, Policy, SampleCommand,
    SimulateCommand, Split, render_summary, run_cli,
};

#[cfg(test)]
mod tests;
