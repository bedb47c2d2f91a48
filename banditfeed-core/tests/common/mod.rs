//! Shared fixtures for banditfeed-core integration tests.
#![expect(clippy::expect_used, reason = "fixtures panic with context on invalid setup")]
#![expect(dead_code, reason = "each test binary exercises a subset of the shared fixtures")]

use banditfeed_core::{DatasetConfig, ExamplePool, RawImages, RawLabels};

/// Source image side length used by the fixtures.
pub const SIDE: usize = 28;
/// Flattened feature length of one fixture image.
pub const FEATURE_LEN: usize = SIDE * SIDE;

/// Builds a raw corpus where example `i` is filled with byte `i` and labelled
/// `i % 10`, so every feature vector identifies its pre-shuffle index.
pub fn indexed_raw(count: usize) -> (RawImages, RawLabels) {
    assert!(count <= 255, "marker bytes must fit u8");
    let mut data = Vec::with_capacity(count * FEATURE_LEN);
    let mut labels = Vec::with_capacity(count);
    for example in 0..count {
        let marker = u8::try_from(example).expect("count fits u8");
        data.extend(std::iter::repeat_n(marker, FEATURE_LEN));
        labels.push(marker % 10);
    }
    let images = RawImages::new(data, count, SIDE, SIDE, 1).expect("fixture shape is consistent");
    (images, RawLabels::new(labels))
}

/// Builds an indexed pool with the given configuration.
pub fn indexed_pool(count: usize, config: DatasetConfig) -> ExamplePool {
    let (images, labels) = indexed_raw(count);
    ExamplePool::from_raw(&images, &labels, config).expect("fixture pool must construct")
}

/// Recovers the pre-shuffle index of a batched example from its marker pixel.
pub fn marker_of(images: &[f32], feature_len: usize, example: usize) -> usize {
    let pixel = images
        .get(example * feature_len)
        .copied()
        .expect("example must be inside the batch");
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_arithmetic,
        reason = "markers are small non-negative integers encoded as pixel fractions"
    )]
    let marker = (pixel * 255.0).round() as usize;
    marker
}
