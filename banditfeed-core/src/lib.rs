//! Banditfeed core library.
//!
//! Prepares a handwritten-digit corpus for simulated contextual-bandit
//! experiments: shuffled epoch-based batch extraction over fixed example
//! pools, synthetic multi-digit scene composition with multi-label ground
//! truth, and the two reward-simulation policies built on top of them.
//!
//! Corpus acquisition and decoding are collaborator concerns behind the
//! [`CorpusProvider`] trait; see the `banditfeed-providers-idx` crate for
//! the gzip IDX implementation.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod bandit;
mod config;
mod corpus;
pub mod encode;
mod error;
mod pool;
mod scene;

pub use crate::{
    bandit::{BanditError, InteractionBatch, random_policy, simulate_logged_bandit},
    config::{ConfigError, DatasetConfig, DatasetConfigBuilder, NormalizationParams, SUB_IMAGE_SIZE},
    corpus::{
        CorpusFile, CorpusProvider, DEFAULT_VALIDATION_SIZE, DataSets, LoadOptions, RawImages,
        RawLabels, RawShapeError, read_data_sets,
    },
    error::{CorpusError, CorpusErrorCode, LoadError, PoolError, PoolErrorCode, Result},
    pool::{Batch, ExamplePool},
    scene::{SceneBatch, SceneError, SceneParams, next_scene_batch},
};
