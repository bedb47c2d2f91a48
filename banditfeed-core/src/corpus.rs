//! Corpus collaborator contracts and the split-loading entry point.
//!
//! The core never fetches or decodes corpus files itself. It defines the
//! [`CorpusProvider`] seam, the raw decoded array types providers return, and
//! [`read_data_sets`], which turns one provider into the three example pools
//! used by an experiment.

use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    config::{DatasetConfig, NormalizationParams},
    error::{CorpusError, LoadError},
    pool::ExamplePool,
};

/// Number of training examples held out as the validation split by default.
pub const DEFAULT_VALIDATION_SIZE: usize = 5_000;

/// The four canonical corpus files.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CorpusFile {
    /// Training-split image file.
    TrainImages,
    /// Training-split label file.
    TrainLabels,
    /// Test-split image file.
    TestImages,
    /// Test-split label file.
    TestLabels,
}

impl CorpusFile {
    /// Returns the canonical compressed file name for this corpus file.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::TrainImages => "train-images-idx3-ubyte.gz",
            Self::TrainLabels => "train-labels-idx1-ubyte.gz",
            Self::TestImages => "t10k-images-idx3-ubyte.gz",
            Self::TestLabels => "t10k-labels-idx1-ubyte.gz",
        }
    }
}

/// Error raised when raw corpus arrays are internally inconsistent.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum RawShapeError {
    /// The pixel payload does not match the declared dimensions.
    #[error("payload of {got} bytes does not match declared shape of {expected}")]
    PayloadLengthMismatch {
        /// Byte count implied by the declared dimensions.
        expected: usize,
        /// Byte count actually supplied.
        got: usize,
    },
}

/// Decoded image pixels in `[count, rows, cols, depth]` layout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawImages {
    data: Vec<u8>,
    count: usize,
    rows: usize,
    cols: usize,
    depth: usize,
}

impl RawImages {
    /// Builds raw images after validating the payload length.
    ///
    /// # Errors
    /// Returns [`RawShapeError::PayloadLengthMismatch`] when `data` does not
    /// hold exactly `count * rows * cols * depth` bytes.
    pub fn new(
        data: Vec<u8>,
        count: usize,
        rows: usize,
        cols: usize,
        depth: usize,
    ) -> core::result::Result<Self, RawShapeError> {
        let expected = count
            .saturating_mul(rows)
            .saturating_mul(cols)
            .saturating_mul(depth);
        if data.len() != expected {
            return Err(RawShapeError::PayloadLengthMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            count,
            rows,
            cols,
            depth,
        })
    }

    /// Returns the raw pixel bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of images.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Returns the image height in pixels.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the image width in pixels.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the channel depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the flattened per-image feature length.
    #[must_use]
    pub const fn feature_len(&self) -> usize {
        self.rows * self.cols
    }

    /// Splits off the first `count` images, returning `(head, tail)`.
    ///
    /// A `count` beyond the image count yields an empty tail.
    #[must_use]
    pub fn split_at_examples(self, count: usize) -> (Self, Self) {
        let head_count = count.min(self.count);
        let pixels = self
            .rows
            .saturating_mul(self.cols)
            .saturating_mul(self.depth);
        let boundary = head_count.saturating_mul(pixels);
        let mut head_data = self.data;
        let tail_data = head_data.split_off(boundary.min(head_data.len()));
        let head = Self {
            data: head_data,
            count: head_count,
            rows: self.rows,
            cols: self.cols,
            depth: self.depth,
        };
        let tail = Self {
            data: tail_data,
            count: self.count - head_count,
            rows: self.rows,
            cols: self.cols,
            depth: self.depth,
        };
        (head, tail)
    }
}

/// Decoded scalar labels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawLabels {
    values: Vec<u8>,
}

impl RawLabels {
    /// Wraps decoded label values.
    #[must_use]
    pub const fn new(values: Vec<u8>) -> Self {
        Self { values }
    }

    /// Returns the label values.
    #[must_use]
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no labels are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Splits off the first `count` labels, returning `(head, tail)`.
    #[must_use]
    pub fn split_at_examples(self, count: usize) -> (Self, Self) {
        let mut head = self.values;
        let tail = head.split_off(count.min(head.len()));
        (Self { values: head }, Self { values: tail })
    }
}

/// Abstraction over corpus acquisition and decoding collaborators.
///
/// Implementations fetch (and typically cache) the named corpus file, decode
/// it, and surface [`CorpusError`] values unchanged on failure.
pub trait CorpusProvider {
    /// Fetches and decodes an image file.
    ///
    /// # Errors
    /// Returns [`CorpusError`] when fetching or decoding fails, including
    /// [`CorpusError::Format`] for a magic-number mismatch.
    fn images(&self, file: CorpusFile) -> core::result::Result<RawImages, CorpusError>;

    /// Fetches and decodes a label file.
    ///
    /// # Errors
    /// Returns [`CorpusError`] when fetching or decoding fails, including
    /// [`CorpusError::Format`] for a magic-number mismatch.
    fn labels(&self, file: CorpusFile) -> core::result::Result<RawLabels, CorpusError>;
}

/// Options accepted by [`read_data_sets`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadOptions {
    /// Serve constant fake pools without touching any provider.
    pub fake_data: bool,
    /// Expose one-hot label views from every batch.
    pub one_hot: bool,
    /// Compute mean/std normalisation from the training split.
    pub normalize: bool,
    /// Number of training examples held out as the validation split.
    pub validation_size: usize,
    /// Base geometry and batching configuration for all pools.
    pub config: DatasetConfig,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            fake_data: false,
            one_hot: false,
            normalize: true,
            validation_size: DEFAULT_VALIDATION_SIZE,
            config: DatasetConfig::default(),
        }
    }
}

/// The three example pools produced by one corpus load.
#[derive(Clone, Debug)]
pub struct DataSets {
    /// Training split (after the validation holdout).
    pub train: ExamplePool,
    /// Validation split held out from the front of the training corpus.
    pub validation: ExamplePool,
    /// Test split.
    pub test: ExamplePool,
}

/// Loads the full corpus through `provider` and builds all three pools.
///
/// The first `validation_size` training examples become the validation
/// split. When `normalize` is set, [`NormalizationParams`] are computed from
/// the remaining training images only and shared read-only by every pool.
/// On any collaborator failure the error propagates unchanged and no partial
/// result is returned.
///
/// # Errors
/// Returns [`LoadError`] wrapping the provider's [`CorpusError`], a
/// [`CorpusError::CountMismatch`] when a split's image and label files
/// disagree on the example count, a [`crate::PoolError`] from pool
/// construction, or a holdout/configuration inconsistency.
#[instrument(skip(provider, options), fields(fake_data = options.fake_data))]
pub fn read_data_sets<P: CorpusProvider>(
    provider: &P,
    options: &LoadOptions,
) -> core::result::Result<DataSets, LoadError> {
    let builder = options.config.to_builder().with_one_hot(options.one_hot);

    if options.fake_data {
        let config = builder.build()?;
        return Ok(DataSets {
            train: ExamplePool::fake(config),
            validation: ExamplePool::fake(config),
            test: ExamplePool::fake(config),
        });
    }

    let train_images = provider.images(CorpusFile::TrainImages)?;
    let train_labels = provider.labels(CorpusFile::TrainLabels)?;
    let test_images = provider.images(CorpusFile::TestImages)?;
    let test_labels = provider.labels(CorpusFile::TestLabels)?;

    ensure_aligned(&train_images, &train_labels)?;
    ensure_aligned(&test_images, &test_labels)?;

    if options.validation_size > train_images.count() {
        return Err(LoadError::ValidationHoldout {
            requested: options.validation_size,
            available: train_images.count(),
        });
    }

    let (validation_images, train_images) = train_images.split_at_examples(options.validation_size);
    let (validation_labels, train_labels) = train_labels.split_at_examples(options.validation_size);

    let normalization = if options.normalize {
        NormalizationParams::from_pixels(train_images.data())
    } else {
        NormalizationParams::disabled()
    };
    let config = builder.with_normalization(normalization).build()?;

    let train = ExamplePool::from_raw(&train_images, &train_labels, config)?;
    let validation = ExamplePool::from_raw(&validation_images, &validation_labels, config)?;
    let test = ExamplePool::from_raw(&test_images, &test_labels, config)?;

    info!(
        train = train.num_examples(),
        validation = validation.num_examples(),
        test = test.num_examples(),
        normalized = normalization.is_enabled(),
        "corpus loaded"
    );
    Ok(DataSets {
        train,
        validation,
        test,
    })
}

/// Cross-checks that one split's image and label files describe the same
/// example count before any holdout arithmetic runs on them.
fn ensure_aligned(
    images: &RawImages,
    labels: &RawLabels,
) -> core::result::Result<(), CorpusError> {
    if images.count() != labels.len() {
        return Err(CorpusError::CountMismatch {
            images: images.count(),
            labels: labels.len(),
        });
    }
    Ok(())
}
