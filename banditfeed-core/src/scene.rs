//! Synthetic multi-digit scene composition.
//!
//! Stacks several single-digit images from an [`ExamplePool`] into one
//! composite canvas with the component labels recorded in placement order.
//! Placement staggers components left-to-right across vertical bands and
//! clamps every paste inside the canvas, so a scene can never write out of
//! bounds; components may still overlap each other, which is accepted.

use rand::{Rng, rngs::SmallRng};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::{ConfigError, DatasetConfig, SUB_IMAGE_SIZE},
    encode,
    error::PoolError,
    pool::{Batch, ExamplePool},
};

/// Errors raised while composing scene batches.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SceneError {
    /// Drawing source digits from the pool failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Source images cannot be half-scaled to the sub-image size.
    #[error("source images of {feature_len} features do not half-scale to the sub-image size")]
    UnresizableSource {
        /// Flattened feature length of the offending source images.
        feature_len: usize,
    },
}

/// Geometry and sizing for one scene-composition call.
///
/// Defaults come from the pool's [`DatasetConfig`]; individual fields may be
/// overridden per call, mirroring the optional arguments of the original
/// mixing routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneParams {
    batch_size: usize,
    canvas_width: usize,
    canvas_height: usize,
    num_components: usize,
}

impl SceneParams {
    /// Derives parameters from an already-validated configuration.
    #[must_use]
    pub const fn from_config(config: &DatasetConfig) -> Self {
        Self {
            batch_size: config.batch_size(),
            canvas_width: config.canvas_width(),
            canvas_height: config.canvas_height(),
            num_components: config.num_components(),
        }
    }

    /// Overrides the number of scenes composed per call.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Overrides the canvas geometry, validating that a sub-image still fits.
    ///
    /// # Errors
    /// Returns [`ConfigError::CanvasTooSmall`] when the canvas cannot hold a
    /// [`SUB_IMAGE_SIZE`] square.
    pub const fn with_canvas(
        mut self,
        width: usize,
        height: usize,
    ) -> core::result::Result<Self, ConfigError> {
        if width < SUB_IMAGE_SIZE || height <= SUB_IMAGE_SIZE {
            return Err(ConfigError::CanvasTooSmall {
                width,
                height,
                min: SUB_IMAGE_SIZE,
            });
        }
        self.canvas_width = width;
        self.canvas_height = height;
        Ok(self)
    }

    /// Overrides the number of digits mixed into each scene.
    ///
    /// Zero components would leave every composed canvas blank while the
    /// batch reports no scenes, so the override is rejected up front.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroComponents`] when `num_components` is zero.
    pub const fn with_num_components(
        mut self,
        num_components: usize,
    ) -> core::result::Result<Self, ConfigError> {
        if num_components == 0 {
            return Err(ConfigError::ZeroComponents);
        }
        self.num_components = num_components;
        Ok(self)
    }

    /// Returns the number of scenes composed per call.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the canvas width in pixels.
    #[must_use]
    pub const fn canvas_width(&self) -> usize {
        self.canvas_width
    }

    /// Returns the canvas height in pixels.
    #[must_use]
    pub const fn canvas_height(&self) -> usize {
        self.canvas_height
    }

    /// Returns the number of digits mixed into each scene.
    #[must_use]
    pub const fn num_components(&self) -> usize {
        self.num_components
    }
}

/// A batch of composite scenes with multi-label ground truth.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneBatch {
    canvases: Vec<f32>,
    labels: Vec<u8>,
    width: usize,
    height: usize,
    components: usize,
}

impl SceneBatch {
    /// Returns all canvases, row-major `[len, height, width]`.
    #[must_use]
    pub fn canvases(&self) -> &[f32] {
        &self.canvases
    }

    /// Returns one scene's canvas as a flat `[height * width]` slice.
    #[must_use]
    pub fn canvas(&self, scene: usize) -> Option<&[f32]> {
        let pixels = self.height.checked_mul(self.width)?;
        let start = scene.checked_mul(pixels)?;
        self.canvases.get(start..start.checked_add(pixels)?)
    }

    /// Returns all component labels, row-major `[len, components]`,
    /// in placement order.
    #[must_use]
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Returns one scene's component labels in placement order.
    #[must_use]
    pub fn scene_labels(&self, scene: usize) -> Option<&[u8]> {
        let start = scene.checked_mul(self.components)?;
        self.labels.get(start..start.checked_add(self.components)?)
    }

    /// Returns the canvas width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns the canvas height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of components per scene.
    #[must_use]
    pub const fn components(&self) -> usize {
        self.components
    }

    /// Returns the number of scenes in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.components == 0 {
            return 0;
        }
        self.labels.len().div_euclid(self.components)
    }

    /// Returns whether the batch holds no scenes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Derives a fixed-width multi-hot matrix `[len, num_actions]` marking
    /// every class present in each scene.
    ///
    /// Duplicate component labels collapse onto one set bit. The ordered
    /// label list is unaffected; this is a derived view.
    ///
    /// # Errors
    /// Returns [`PoolError::LabelOutOfRange`] when a component label does
    /// not fit the action space.
    pub fn multi_hot(&self, num_actions: usize) -> core::result::Result<Vec<f32>, PoolError> {
        encode::multi_hot(&self.labels, self.components, num_actions)
    }
}

/// Composes the next batch of multi-digit scenes from `pool`.
///
/// All `batch_size * num_components` source digits are drawn through one
/// [`ExamplePool::next_batch`] call, so every component in the batch shares a
/// single reshuffle boundary. Each digit is half-scaled by 2x2 block
/// averaging to a [`SUB_IMAGE_SIZE`] square before placement.
///
/// # Errors
/// Returns [`SceneError::Pool`] when the underlying draw fails and
/// [`SceneError::UnresizableSource`] when source images are not even-sided
/// squares.
///
/// # Examples
/// ```
/// use banditfeed_core::{DatasetConfig, ExamplePool, SceneParams, next_scene_batch};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let config = DatasetConfig::default();
/// let mut pool = ExamplePool::fake(config);
/// let mut rng = SmallRng::seed_from_u64(11);
/// let params = SceneParams::from_config(&config).with_batch_size(2);
/// let scenes = next_scene_batch(&mut pool, &params, &mut rng)?;
/// assert_eq!(scenes.len(), 2);
/// assert_eq!(scenes.scene_labels(0).map(<[u8]>::len), Some(3));
/// # Ok::<(), banditfeed_core::SceneError>(())
/// ```
pub fn next_scene_batch(
    pool: &mut ExamplePool,
    params: &SceneParams,
    rng: &mut SmallRng,
) -> core::result::Result<SceneBatch, SceneError> {
    let components = params.num_components();
    let source_count = params.batch_size().saturating_mul(components);
    let batch = pool.next_batch(source_count, rng)?;

    let side = square_side(batch.feature_len())?;
    let canvas_width = params.canvas_width();
    let canvas_height = params.canvas_height();
    let canvas_pixels = canvas_height.saturating_mul(canvas_width);

    // Exclusive upper bounds for the uniform offset draws. The band range is
    // clamped to at least 1 so narrow canvases still place at column zero.
    let band_bound = (canvas_width.div_euclid(3)).saturating_sub(SUB_IMAGE_SIZE).max(1);
    let row_bound = canvas_height - SUB_IMAGE_SIZE;

    let mut canvases = vec![0.0_f32; params.batch_size().saturating_mul(canvas_pixels)];
    let mut labels = Vec::with_capacity(source_count);

    for scene in 0..params.batch_size() {
        let scene_offset = scene.saturating_mul(canvas_pixels);
        for component in 0..components {
            let band_offset = rng.gen_range(0..band_bound);
            let row = rng.gen_range(0..row_bound);
            let column = band_offset
                .saturating_add(SUB_IMAGE_SIZE.saturating_mul(component))
                .min(canvas_width - SUB_IMAGE_SIZE);

            let source = scene.saturating_mul(components).saturating_add(component);
            let digit = downsample_half(&batch, source, side);
            paste(
                &mut canvases,
                scene_offset,
                canvas_width,
                row,
                column,
                &digit,
            );
            if let Some(&label) = batch.labels().get(source) {
                labels.push(label);
            }
        }
    }

    debug!(
        scenes = params.batch_size(),
        components,
        canvas_width,
        canvas_height,
        "composed scene batch"
    );
    Ok(SceneBatch {
        canvases,
        labels,
        width: canvas_width,
        height: canvas_height,
        components,
    })
}

/// Validates that source images are squares that half-scale exactly to the
/// sub-image size, returning the source side length.
fn square_side(feature_len: usize) -> core::result::Result<usize, SceneError> {
    let side = feature_len.isqrt();
    if side.saturating_mul(side) != feature_len || side != SUB_IMAGE_SIZE.saturating_mul(2) {
        return Err(SceneError::UnresizableSource { feature_len });
    }
    Ok(side)
}

/// Area-based half-scale resampling: each output pixel is the mean of the
/// corresponding 2x2 source block.
#[expect(
    clippy::float_arithmetic,
    reason = "block averaging is inherently floating-point"
)]
fn downsample_half(batch: &Batch, example: usize, side: usize) -> Vec<f32> {
    let half = side.div_euclid(2);
    let base = example.saturating_mul(batch.feature_len());
    let pixel = |row: usize, col: usize| -> f32 {
        let index = base
            .saturating_add(row.saturating_mul(side))
            .saturating_add(col);
        batch.images().get(index).copied().unwrap_or(0.0)
    };

    let mut out = Vec::with_capacity(half.saturating_mul(half));
    for row in 0..half {
        for col in 0..half {
            let top = row.saturating_mul(2);
            let left = col.saturating_mul(2);
            let sum = pixel(top, left)
                + pixel(top, left.saturating_add(1))
                + pixel(top.saturating_add(1), left)
                + pixel(top.saturating_add(1), left.saturating_add(1));
            out.push(sum / 4.0);
        }
    }
    out
}

/// Pastes a [`SUB_IMAGE_SIZE`] square block at `(row, column)`, overwriting
/// existing canvas content.
fn paste(
    canvases: &mut [f32],
    scene_offset: usize,
    canvas_width: usize,
    row: usize,
    column: usize,
    digit: &[f32],
) {
    for (digit_row, source_row) in digit.chunks_exact(SUB_IMAGE_SIZE).enumerate() {
        let destination = scene_offset
            .saturating_add(row.saturating_add(digit_row).saturating_mul(canvas_width))
            .saturating_add(column);
        if let Some(target) =
            canvases.get_mut(destination..destination.saturating_add(SUB_IMAGE_SIZE))
        {
            target.copy_from_slice(source_row);
        }
    }
}
