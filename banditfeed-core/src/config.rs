//! Configuration for pools, scene composition, and bandit simulation.
//!
//! The original formulation of this pipeline spread shared constants across
//! class-level state written at corpus-load time. Here the same knobs live in
//! one immutable [`DatasetConfig`] passed explicitly to every pool, which
//! removes order-of-initialisation hazards between splits.

use thiserror::Error;

/// Side length of a resampled digit pasted into a composite scene.
pub const SUB_IMAGE_SIZE: usize = 14;

/// Epsilon added to the pixel standard deviation to avoid division by zero.
const STD_EPSILON: f32 = 1e-9;

/// Process-wide pixel normalisation parameters.
///
/// Computed once from the training split (after the validation holdout) and
/// shared read-only by every derived pool. When disabled, pools rescale raw
/// bytes into `[0, 1]` instead.
///
/// # Examples
/// ```
/// use banditfeed_core::NormalizationParams;
///
/// let params = NormalizationParams::from_pixels(&[0, 255]);
/// assert!(params.is_enabled());
/// assert!((params.mean() - 127.5).abs() < 1e-3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizationParams {
    mean: f32,
    std: f32,
    enabled: bool,
}

impl NormalizationParams {
    /// Creates disabled parameters; pools fall back to `raw / 255` scaling.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            mean: 0.0,
            std: 1.0,
            enabled: false,
        }
    }

    /// Computes enabled parameters from raw pixel intensities.
    ///
    /// The standard deviation is padded with a small epsilon so an all-equal
    /// corpus cannot divide by zero. An empty slice yields disabled
    /// parameters.
    #[expect(
        clippy::cast_precision_loss,
        clippy::float_arithmetic,
        reason = "population mean/std over pixel bytes requires floating-point arithmetic"
    )]
    #[must_use]
    pub fn from_pixels(pixels: &[u8]) -> Self {
        if pixels.is_empty() {
            return Self::disabled();
        }
        let count = pixels.len() as f32;
        let sum: f32 = pixels.iter().map(|&value| f32::from(value)).sum();
        let mean = sum / count;
        let variance: f32 = pixels
            .iter()
            .map(|&value| {
                let delta = f32::from(value) - mean;
                delta * delta
            })
            .sum::<f32>()
            / count;
        Self {
            mean,
            std: variance.sqrt() + STD_EPSILON,
            enabled: true,
        }
    }

    /// Returns the pixel mean used for centring.
    #[must_use]
    pub const fn mean(&self) -> f32 {
        self.mean
    }

    /// Returns the padded pixel standard deviation used for scaling.
    #[must_use]
    pub const fn std(&self) -> f32 {
        self.std
    }

    /// Returns whether mean/std normalisation is active.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Maps one raw pixel byte into feature space.
    #[expect(
        clippy::float_arithmetic,
        reason = "pixel rescaling is inherently floating-point"
    )]
    #[must_use]
    pub fn apply(&self, raw: u8) -> f32 {
        if self.enabled {
            (f32::from(raw) - self.mean) / self.std
        } else {
            f32::from(raw) / 255.0
        }
    }
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Error returned when a [`DatasetConfigBuilder`] is inconsistent.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    /// The default batch size must be at least one.
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
    /// Scenes must contain at least one component digit.
    #[error("num_components must be at least 1")]
    ZeroComponents,
    /// The biased policy divides by `num_actions - 1`.
    #[error("num_actions must be at least 2 (got {got})")]
    ActionSpaceTooSmall {
        /// The invalid action count supplied by the caller.
        got: usize,
    },
    /// The canvas cannot hold a single resampled digit.
    #[error("canvas {width}x{height} cannot hold a {min}x{min} sub-image")]
    CanvasTooSmall {
        /// Configured canvas width in pixels.
        width: usize,
        /// Configured canvas height in pixels.
        height: usize,
        /// Minimum side length required by the sub-image.
        min: usize,
    },
}

/// Immutable configuration shared by pools and simulators.
///
/// # Examples
/// ```
/// use banditfeed_core::DatasetConfig;
///
/// let config = DatasetConfig::builder()
///     .with_batch_size(32)
///     .build()
///     .expect("default geometry is valid");
/// assert_eq!(config.batch_size(), 32);
/// assert_eq!(config.num_actions(), 10);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DatasetConfig {
    batch_size: usize,
    canvas_width: usize,
    canvas_height: usize,
    num_components: usize,
    num_actions: usize,
    one_hot: bool,
    normalization: NormalizationParams,
}

impl DatasetConfig {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn builder() -> DatasetConfigBuilder {
        DatasetConfigBuilder::default()
    }

    /// Re-opens this configuration for further modification.
    #[must_use]
    pub const fn to_builder(self) -> DatasetConfigBuilder {
        DatasetConfigBuilder { config: self }
    }

    /// Returns the default batch size used when callers do not override it.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the composite-scene canvas width in pixels.
    #[must_use]
    pub const fn canvas_width(&self) -> usize {
        self.canvas_width
    }

    /// Returns the composite-scene canvas height in pixels.
    #[must_use]
    pub const fn canvas_height(&self) -> usize {
        self.canvas_height
    }

    /// Returns the number of digits mixed into each scene.
    #[must_use]
    pub const fn num_components(&self) -> usize {
        self.num_components
    }

    /// Returns the size of the fixed action/label space.
    #[must_use]
    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Returns whether batches expose labels as one-hot vectors.
    #[must_use]
    pub const fn one_hot(&self) -> bool {
        self.one_hot
    }

    /// Returns the shared normalisation parameters.
    #[must_use]
    pub const fn normalization(&self) -> NormalizationParams {
        self.normalization
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            canvas_width: 45,
            canvas_height: 45,
            num_components: 3,
            num_actions: 10,
            one_hot: false,
            normalization: NormalizationParams::disabled(),
        }
    }
}

/// Configures and constructs [`DatasetConfig`] values.
///
/// # Examples
/// ```
/// use banditfeed_core::DatasetConfig;
///
/// let config = DatasetConfig::builder()
///     .with_canvas(60, 50)
///     .with_num_components(4)
///     .build()
///     .expect("geometry holds a 14x14 sub-image");
/// assert_eq!(config.canvas_width(), 60);
/// assert_eq!(config.num_components(), 4);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DatasetConfigBuilder {
    config: DatasetConfig,
}

impl DatasetConfigBuilder {
    /// Overrides the default batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Overrides the scene canvas geometry.
    #[must_use]
    pub const fn with_canvas(mut self, width: usize, height: usize) -> Self {
        self.config.canvas_width = width;
        self.config.canvas_height = height;
        self
    }

    /// Overrides the number of digits mixed into each scene.
    #[must_use]
    pub const fn with_num_components(mut self, num_components: usize) -> Self {
        self.config.num_components = num_components;
        self
    }

    /// Overrides the size of the action/label space.
    #[must_use]
    pub const fn with_num_actions(mut self, num_actions: usize) -> Self {
        self.config.num_actions = num_actions;
        self
    }

    /// Requests one-hot label views from `next_batch`.
    #[must_use]
    pub const fn with_one_hot(mut self, one_hot: bool) -> Self {
        self.config.one_hot = one_hot;
        self
    }

    /// Installs the shared normalisation parameters.
    #[must_use]
    pub const fn with_normalization(mut self, normalization: NormalizationParams) -> Self {
        self.config.normalization = normalization;
        self
    }

    /// Validates the configuration and builds the final [`DatasetConfig`].
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the batch size or component count is
    /// zero, the action space has fewer than two actions, or the canvas
    /// cannot hold a single [`SUB_IMAGE_SIZE`] sub-image.
    pub const fn build(self) -> core::result::Result<DatasetConfig, ConfigError> {
        let config = self.config;
        if config.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if config.num_components == 0 {
            return Err(ConfigError::ZeroComponents);
        }
        if config.num_actions < 2 {
            return Err(ConfigError::ActionSpaceTooSmall {
                got: config.num_actions,
            });
        }
        if config.canvas_width < SUB_IMAGE_SIZE || config.canvas_height <= SUB_IMAGE_SIZE {
            return Err(ConfigError::CanvasTooSmall {
                width: config.canvas_width,
                height: config.canvas_height,
                min: SUB_IMAGE_SIZE,
            });
        }
        Ok(config)
    }
}
