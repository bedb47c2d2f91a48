//! Simulated bandit-feedback policies over pools and composed scenes.
//!
//! Both simulators are pure consumers: they draw batches through the pool's
//! ordinary extraction path and never touch pool state beyond that.

use rand::{Rng, distributions::WeightedIndex, prelude::Distribution, rngs::SmallRng};
use thiserror::Error;
use tracing::debug;

use crate::{
    error::PoolError,
    pool::ExamplePool,
    scene::{SceneError, SceneParams, next_scene_batch},
};

/// Fixed bias weight placed on the true label by the biased random policy.
const ACTION_BIAS: f32 = 5.0;

/// Errors raised by the bandit simulators.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BanditError {
    /// Drawing examples from the pool failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Composing the scene batch failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// Observations are not square images and cannot be subsampled.
    #[error("observations of {feature_len} features are not square images")]
    NonSquareObservation {
        /// Flattened feature length of the offending observations.
        feature_len: usize,
    },
}

/// One simulated interaction log: observations, chosen actions, rewards.
///
/// Actions are one-hot encoded over the configured action space; rewards are
/// aligned per example. The batch is ephemeral and never retained by the
/// simulators.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionBatch {
    observations: Vec<f32>,
    observation_len: usize,
    actions: Vec<f32>,
    num_actions: usize,
    rewards: Vec<f32>,
}

impl InteractionBatch {
    /// Returns the flattened observations, row-major `[len, observation_len]`.
    #[must_use]
    pub fn observations(&self) -> &[f32] {
        &self.observations
    }

    /// Returns the per-example observation feature length.
    #[must_use]
    pub const fn observation_len(&self) -> usize {
        self.observation_len
    }

    /// Returns the one-hot action matrix, row-major `[len, num_actions]`.
    #[must_use]
    pub fn actions(&self) -> &[f32] {
        &self.actions
    }

    /// Returns the size of the action space used for encoding.
    #[must_use]
    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Returns the scalar action chosen for one example.
    #[must_use]
    pub fn action(&self, example: usize) -> Option<usize> {
        let start = example.checked_mul(self.num_actions)?;
        let row = self.actions.get(start..start.checked_add(self.num_actions)?)?;
        row.iter().position(|&weight| weight == 1.0)
    }

    /// Returns the observed rewards, one per example.
    #[must_use]
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Returns the number of interactions in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns whether the batch holds no interactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Simulates a label-biased random single-digit policy.
///
/// Draws a plain batch, subsamples every other pixel in both axes as the
/// observation, and samples one action per example from a categorical
/// distribution that places weight `H / (num_actions - 1)` on every wrong
/// action and `H` on the true label, everything divided by `num_actions`
/// (`H` = 5). The weight vector is deliberately normalised by the action
/// count rather than its own sum, as in the original formulation; sampling
/// uses relative weights and tolerates that. The reward is the distance-based
/// partial credit `clip(2 - |action - label|, 0, 5)`.
///
/// # Errors
/// Returns [`BanditError::Pool`] when the draw fails and
/// [`BanditError::NonSquareObservation`] when images cannot be subsampled.
///
/// # Panics
/// Never panics: the bias weights are strictly positive for any validated
/// action space.
pub fn random_policy(
    pool: &mut ExamplePool,
    batch_size: usize,
    rng: &mut SmallRng,
) -> core::result::Result<InteractionBatch, BanditError> {
    let num_actions = pool.config().num_actions();
    let batch = pool.next_batch(batch_size, rng)?;
    let side = observation_side(batch.feature_len())?;

    let observations = subsample_stride2(batch.images(), batch.feature_len(), side);
    let observation_len = subsampled_len(side);

    let mut actions = Vec::with_capacity(batch.len());
    let mut rewards = Vec::with_capacity(batch.len());
    for &label in batch.labels() {
        let action = sample_biased_action(label, num_actions, rng);
        actions.push(action);
        rewards.push(partial_credit_reward(action, label));
    }

    debug!(
        examples = batch.len(),
        num_actions, "simulated biased random policy"
    );
    Ok(InteractionBatch {
        observations,
        observation_len,
        actions: one_hot_actions(&actions, num_actions),
        num_actions,
        rewards,
    })
}

/// Simulates logged bandit feedback over composite multi-digit scenes.
///
/// Draws a scene batch with the pool's default mixing parameters, chooses a
/// uniformly random action per scene, and assigns binary reward 1 when that
/// action's class appears anywhere in the scene's component labels.
///
/// # Errors
/// Returns [`BanditError::Scene`] when scene composition fails.
pub fn simulate_logged_bandit(
    pool: &mut ExamplePool,
    batch_size: usize,
    rng: &mut SmallRng,
) -> core::result::Result<InteractionBatch, BanditError> {
    let config = *pool.config();
    let num_actions = config.num_actions();
    let params = SceneParams::from_config(&config).with_batch_size(batch_size);
    let scenes = next_scene_batch(pool, &params, rng)?;

    let mut actions = Vec::with_capacity(scenes.len());
    let mut rewards = Vec::with_capacity(scenes.len());
    for scene in 0..scenes.len() {
        let action = rng.gen_range(0..num_actions);
        let hit = scenes
            .scene_labels(scene)
            .is_some_and(|labels| labels.iter().any(|&label| usize::from(label) == action));
        actions.push(action);
        rewards.push(if hit { 1.0 } else { 0.0 });
    }

    debug!(
        scenes = scenes.len(),
        num_actions, "simulated logged bandit feedback"
    );
    let observation_len = scenes.height().saturating_mul(scenes.width());
    Ok(InteractionBatch {
        observations: scenes.canvases().to_vec(),
        observation_len,
        actions: one_hot_actions(&actions, num_actions),
        num_actions,
        rewards,
    })
}

fn observation_side(feature_len: usize) -> core::result::Result<usize, BanditError> {
    let side = feature_len.isqrt();
    if side.saturating_mul(side) != feature_len {
        return Err(BanditError::NonSquareObservation { feature_len });
    }
    Ok(side)
}

/// Output side of a stride-2 subsample: every other pixel, starting at zero.
const fn subsampled_side(side: usize) -> usize {
    side.div_ceil(2)
}

const fn subsampled_len(side: usize) -> usize {
    subsampled_side(side) * subsampled_side(side)
}

/// Keeps every other pixel in both axes for each example.
fn subsample_stride2(images: &[f32], feature_len: usize, side: usize) -> Vec<f32> {
    let examples = if feature_len == 0 {
        0
    } else {
        images.len().div_euclid(feature_len)
    };
    let mut out = Vec::with_capacity(examples.saturating_mul(subsampled_len(side)));
    for example in 0..examples {
        let base = example.saturating_mul(feature_len);
        for row in (0..side).step_by(2) {
            for col in (0..side).step_by(2) {
                let index = base.saturating_add(row.saturating_mul(side)).saturating_add(col);
                out.push(images.get(index).copied().unwrap_or(0.0));
            }
        }
    }
    out
}

/// Samples one action from the label-biased categorical weights.
#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "the bias weights are defined as floating-point ratios of the action count"
)]
fn sample_biased_action(label: u8, num_actions: usize, rng: &mut SmallRng) -> usize {
    let off_weight = ACTION_BIAS / (num_actions as f32 - 1.0);
    let mut weights = vec![off_weight; num_actions];
    if let Some(slot) = weights.get_mut(usize::from(label)) {
        *slot = ACTION_BIAS;
    }
    // Normalised by the action count, not the vector's own sum; the weights
    // then need not sum to one and the sampler works from relative mass.
    for weight in &mut weights {
        *weight /= num_actions as f32;
    }
    #[expect(
        clippy::expect_used,
        reason = "weights are strictly positive for num_actions >= 2"
    )]
    let distribution =
        WeightedIndex::new(&weights).expect("biased action weights must be strictly positive");
    distribution.sample(rng)
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "the reward is a clipped floating-point distance"
)]
fn partial_credit_reward(action: usize, label: u8) -> f32 {
    let distance = action.abs_diff(usize::from(label)) as f32;
    (2.0 - distance).clamp(0.0, 5.0)
}

fn one_hot_actions(actions: &[usize], num_actions: usize) -> Vec<f32> {
    let mut encoded = vec![0.0_f32; actions.len().saturating_mul(num_actions)];
    for (row, &action) in actions.iter().enumerate() {
        let index = row.saturating_mul(num_actions).saturating_add(action);
        if let Some(slot) = encoded.get_mut(index) {
            *slot = 1.0;
        }
    }
    encoded
}
