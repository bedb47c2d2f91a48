//! Integration tests for the simulated bandit-feedback policies.
#![expect(clippy::expect_used, reason = "tests require contextual panics")]
#![expect(
    clippy::float_arithmetic,
    reason = "tests compare simulated rewards directly"
)]

mod common;

use banditfeed_core::{
    DatasetConfig, ExamplePool, RawImages, RawLabels, random_policy, simulate_logged_bandit,
};
use common::{FEATURE_LEN, SIDE, indexed_pool};
use rand::{SeedableRng, rngs::SmallRng};
use rstest::rstest;

/// Builds a pool where every example carries the same label.
fn single_class_pool(count: usize, label: u8) -> ExamplePool {
    let images = RawImages::new(vec![128_u8; count * FEATURE_LEN], count, SIDE, SIDE, 1)
        .expect("fixture shape is consistent");
    ExamplePool::from_raw(
        &images,
        &RawLabels::new(vec![label; count]),
        DatasetConfig::default(),
    )
    .expect("fixture pool must construct")
}

#[rstest]
fn random_policy_subsamples_observations_and_one_hot_encodes_actions() {
    let mut pool = indexed_pool(32, DatasetConfig::default());
    let mut rng = SmallRng::seed_from_u64(13);

    let interactions = random_policy(&mut pool, 8, &mut rng).expect("simulation succeeds");
    assert_eq!(interactions.len(), 8);
    // 28x28 images subsample to 14x14 observations.
    assert_eq!(interactions.observation_len(), 196);
    assert_eq!(interactions.observations().len(), 8 * 196);
    assert_eq!(interactions.actions().len(), 8 * 10);

    for example in 0..interactions.len() {
        let row = &interactions.actions()[example * 10..(example + 1) * 10];
        let mass: f32 = row.iter().sum();
        assert!((mass - 1.0).abs() < f32::EPSILON, "action rows are one-hot");
        assert!(interactions.action(example).is_some());
    }
}

#[rstest]
fn random_policy_rewards_follow_the_partial_credit_schedule() {
    let mut pool = single_class_pool(64, 7);
    let mut rng = SmallRng::seed_from_u64(41);

    let interactions = random_policy(&mut pool, 64, &mut rng).expect("simulation succeeds");
    for example in 0..interactions.len() {
        let action = interactions.action(example).expect("rows are one-hot");
        let reward = interactions.rewards()[example];
        let expected = (2.0 - (action.abs_diff(7) as f32)).clamp(0.0, 5.0);
        assert!(
            (reward - expected).abs() < f32::EPSILON,
            "action {action} earned {reward}, expected {expected}"
        );
        assert!((0.0..=2.0).contains(&reward));
    }
}

#[rstest]
fn random_policy_biases_toward_the_true_label() {
    let mut pool = single_class_pool(200, 4);
    let mut rng = SmallRng::seed_from_u64(7);

    let interactions = random_policy(&mut pool, 200, &mut rng).expect("simulation succeeds");
    let hits = (0..interactions.len())
        .filter(|&example| interactions.action(example) == Some(4))
        .count();
    // The true label carries nine times the weight of any single wrong
    // action, roughly half the total mass; far above the uniform 10%.
    assert!(hits > 50, "only {hits} of 200 actions matched the label");
}

#[rstest]
fn logged_bandit_rewards_are_binary_membership() {
    let mut pool = single_class_pool(60, 3);
    let mut rng = SmallRng::seed_from_u64(23);

    let interactions =
        simulate_logged_bandit(&mut pool, 16, &mut rng).expect("simulation succeeds");
    assert_eq!(interactions.len(), 16);
    // Scenes use the default 45x45 canvas.
    assert_eq!(interactions.observation_len(), 45 * 45);

    for example in 0..interactions.len() {
        let action = interactions.action(example).expect("rows are one-hot");
        let reward = interactions.rewards()[example];
        // Every component label is 3, so membership collapses to equality.
        let expected = if action == 3 { 1.0 } else { 0.0 };
        assert!(
            (reward - expected).abs() < f32::EPSILON,
            "action {action} earned {reward}, expected {expected}"
        );
    }
}

#[rstest]
fn logged_bandit_serves_fake_pools() {
    let config = DatasetConfig::default();
    let mut pool = ExamplePool::fake(config);
    let mut rng = SmallRng::seed_from_u64(6);

    let interactions =
        simulate_logged_bandit(&mut pool, 4, &mut rng).expect("fake pools always serve");
    for example in 0..interactions.len() {
        let action = interactions.action(example).expect("rows are one-hot");
        let reward = interactions.rewards()[example];
        let expected = if action == 0 { 1.0 } else { 0.0 };
        assert!((reward - expected).abs() < f32::EPSILON);
    }
}

#[rstest]
fn simulators_advance_the_pool_like_plain_draws() {
    let mut pool = single_class_pool(30, 1);
    let mut rng = SmallRng::seed_from_u64(12);

    random_policy(&mut pool, 10, &mut rng).expect("first draw");
    assert_eq!(pool.epochs_completed(), 0);
    // The scene draw consumes batch_size * num_components = 24 sources and
    // crosses the pool end, rolling the epoch exactly once.
    simulate_logged_bandit(&mut pool, 8, &mut rng).expect("scene draw");
    assert_eq!(pool.epochs_completed(), 1);
    assert_eq!(pool.num_examples(), 30);
}
