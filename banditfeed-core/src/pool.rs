//! Shuffled epoch-based batch extraction over a fixed example pool.
//!
//! An [`ExamplePool`] owns one split's flattened, normalised images together
//! with their aligned scalar labels. Batches are served contiguously; when a
//! request crosses the end of the pool the examples are reshuffled in
//! lockstep and a fresh epoch begins.

use rand::{rngs::SmallRng, seq::SliceRandom};
use tracing::debug;

use crate::{
    config::DatasetConfig,
    corpus::{RawImages, RawLabels},
    encode,
    error::{PoolError, Result},
};

/// Number of constant examples reported by a fake-data pool.
const FAKE_POOL_SIZE: usize = 10_000;
/// Feature length of the constant fake example (28 x 28).
const FAKE_FEATURE_LEN: usize = 784;

/// An ephemeral slice of examples produced by [`ExamplePool::next_batch`].
///
/// The pool never retains a batch; images and labels are freshly allocated
/// copies so callers may hold them across later reshuffles.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    images: Vec<f32>,
    labels: Vec<u8>,
    one_hot_labels: Option<Vec<f32>>,
    feature_len: usize,
}

impl Batch {
    /// Returns the flattened images, row-major `[len, feature_len]`.
    #[must_use]
    pub fn images(&self) -> &[f32] {
        &self.images
    }

    /// Returns the scalar labels aligned with [`Self::images`].
    #[must_use]
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Returns the one-hot label matrix when the pool was configured for it.
    #[must_use]
    pub fn one_hot_labels(&self) -> Option<&[f32]> {
        self.one_hot_labels.as_deref()
    }

    /// Returns the number of examples in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns whether the batch holds no examples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the per-example feature vector length.
    #[must_use]
    pub const fn feature_len(&self) -> usize {
        self.feature_len
    }
}

#[derive(Clone, Debug, PartialEq)]
enum PoolStorage {
    /// Real corpus data owned by the pool.
    Real { images: Vec<f32>, labels: Vec<u8> },
    /// Interface-testing stand-in that serves constant filler examples.
    Fake,
}

/// A fixed pool of flattened, normalised examples for one corpus split.
///
/// # Examples
/// ```
/// use banditfeed_core::{DatasetConfig, ExamplePool};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let config = DatasetConfig::default();
/// let mut pool = ExamplePool::fake(config);
/// let mut rng = SmallRng::seed_from_u64(7);
/// let batch = pool.next_batch(4, &mut rng)?;
/// assert_eq!(batch.len(), 4);
/// assert!(batch.images().iter().all(|&pixel| pixel == 1.0));
/// # Ok::<(), banditfeed_core::PoolError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ExamplePool {
    storage: PoolStorage,
    num_examples: usize,
    feature_len: usize,
    cursor: usize,
    epochs_completed: usize,
    config: DatasetConfig,
}

impl ExamplePool {
    /// Builds a pool from decoded corpus arrays.
    ///
    /// Images are flattened from `[count, rows, cols, 1]` to
    /// `[count, rows * cols]` and mapped into feature space via the
    /// configured [`crate::NormalizationParams`].
    ///
    /// # Errors
    /// Returns [`PoolError::ShapeMismatch`] when image and label counts
    /// disagree, [`PoolError::UnsupportedDepth`] for multi-channel images,
    /// and [`PoolError::EmptyPool`] for an empty corpus.
    pub fn from_raw(raw: &RawImages, labels: &RawLabels, config: DatasetConfig) -> Result<Self> {
        if raw.depth() != 1 {
            return Err(PoolError::UnsupportedDepth { depth: raw.depth() });
        }
        if raw.count() != labels.len() {
            return Err(PoolError::ShapeMismatch {
                images: raw.count(),
                labels: labels.len(),
            });
        }
        if raw.count() == 0 {
            return Err(PoolError::EmptyPool);
        }

        let normalization = config.normalization();
        let images: Vec<f32> = raw
            .data()
            .iter()
            .map(|&pixel| normalization.apply(pixel))
            .collect();

        Ok(Self {
            storage: PoolStorage::Real {
                images,
                labels: labels.values().to_vec(),
            },
            num_examples: raw.count(),
            feature_len: raw.feature_len(),
            cursor: 0,
            epochs_completed: 0,
            config,
        })
    }

    /// Builds a fake-data pool for downstream contract testing.
    ///
    /// Every batch contains the constant all-ones image vector and label
    /// zero, regardless of batch size or call count. No real data semantics
    /// apply.
    #[must_use]
    pub const fn fake(config: DatasetConfig) -> Self {
        Self {
            storage: PoolStorage::Fake,
            num_examples: FAKE_POOL_SIZE,
            feature_len: FAKE_FEATURE_LEN,
            cursor: 0,
            epochs_completed: 0,
            config,
        }
    }

    /// Returns the number of examples owned by the pool.
    #[must_use]
    pub const fn num_examples(&self) -> usize {
        self.num_examples
    }

    /// Returns the per-example feature vector length.
    #[must_use]
    pub const fn feature_len(&self) -> usize {
        self.feature_len
    }

    /// Returns how many full passes over the pool have completed.
    #[must_use]
    pub const fn epochs_completed(&self) -> usize {
        self.epochs_completed
    }

    /// Returns the configuration shared by this pool and its consumers.
    #[must_use]
    pub const fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Returns the flattened image storage.
    #[must_use]
    pub fn images(&self) -> &[f32] {
        match &self.storage {
            PoolStorage::Real { images, .. } => images,
            PoolStorage::Fake => &[],
        }
    }

    /// Returns the scalar label storage.
    #[must_use]
    pub fn labels(&self) -> &[u8] {
        match &self.storage {
            PoolStorage::Real { labels, .. } => labels,
            PoolStorage::Fake => &[],
        }
    }

    /// Extracts the next `batch_size` contiguous examples.
    ///
    /// Within one epoch, repeated calls return disjoint increasing index
    /// ranges that partition the pool exactly once. When a request would
    /// cross the end of the pool, `epochs_completed` is incremented, images
    /// and labels are reordered by one shared uniform permutation, and the
    /// cursor restarts at zero before extraction.
    ///
    /// # Errors
    /// Returns [`PoolError::InvalidBatchSize`] when `batch_size` exceeds the
    /// pool size; such a request could never be served even after a
    /// reshuffle.
    ///
    /// # Panics
    /// Never panics: cursor arithmetic is bounds-checked before slicing.
    pub fn next_batch(&mut self, batch_size: usize, rng: &mut SmallRng) -> Result<Batch> {
        if matches!(self.storage, PoolStorage::Fake) {
            return self.fake_batch(batch_size);
        }
        if batch_size > self.num_examples {
            return Err(PoolError::InvalidBatchSize {
                requested: batch_size,
                available: self.num_examples,
            });
        }

        if self.cursor.saturating_add(batch_size) > self.num_examples {
            self.epochs_completed = self.epochs_completed.saturating_add(1);
            self.reshuffle(rng);
            self.cursor = 0;
            debug!(
                epochs_completed = self.epochs_completed,
                "epoch boundary reached; pool reshuffled"
            );
        }

        let start = self.cursor;
        let end = start.saturating_add(batch_size);
        self.cursor = end;
        self.extract(start, end)
    }

    fn extract(&self, start: usize, end: usize) -> Result<Batch> {
        let PoolStorage::Real { images, labels } = &self.storage else {
            return self.fake_batch(end.saturating_sub(start));
        };
        let image_range = start.saturating_mul(self.feature_len)..end.saturating_mul(self.feature_len);
        #[expect(
            clippy::expect_used,
            reason = "the caller clamps start/end inside the pool before extraction"
        )]
        let batch_images = images
            .get(image_range)
            .expect("batch image range stays within pool storage")
            .to_vec();
        #[expect(
            clippy::expect_used,
            reason = "the caller clamps start/end inside the pool before extraction"
        )]
        let batch_labels = labels
            .get(start..end)
            .expect("batch label range stays within pool storage")
            .to_vec();
        let one_hot_labels = self.encode_one_hot(&batch_labels)?;
        Ok(Batch {
            images: batch_images,
            labels: batch_labels,
            one_hot_labels,
            feature_len: self.feature_len,
        })
    }

    fn fake_batch(&self, batch_size: usize) -> Result<Batch> {
        let labels = vec![0_u8; batch_size];
        let one_hot_labels = self.encode_one_hot(&labels)?;
        Ok(Batch {
            images: vec![1.0_f32; batch_size.saturating_mul(FAKE_FEATURE_LEN)],
            labels,
            one_hot_labels,
            feature_len: FAKE_FEATURE_LEN,
        })
    }

    fn encode_one_hot(&self, labels: &[u8]) -> Result<Option<Vec<f32>>> {
        if !self.config.one_hot() {
            return Ok(None);
        }
        encode::one_hot(labels, self.config.num_actions()).map(Some)
    }

    /// Reorders images and labels by one shared uniform permutation.
    fn reshuffle(&mut self, rng: &mut SmallRng) {
        let PoolStorage::Real { images, labels } = &mut self.storage else {
            return;
        };
        let mut permutation: Vec<usize> = (0..labels.len()).collect();
        permutation.shuffle(rng);

        let feature_len = self.feature_len;
        let mut shuffled_images = Vec::with_capacity(images.len());
        let mut shuffled_labels = Vec::with_capacity(labels.len());
        for &source in &permutation {
            let row_start = source.saturating_mul(feature_len);
            if let Some(row) = images.get(row_start..row_start.saturating_add(feature_len)) {
                shuffled_images.extend_from_slice(row);
            }
            if let Some(&label) = labels.get(source) {
                shuffled_labels.push(label);
            }
        }
        *images = shuffled_images;
        *labels = shuffled_labels;
    }
}
