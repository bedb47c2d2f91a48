//! Gzip IDX decoding with magic-number validation.
//!
//! Image files carry magic 2051 and a `[count, rows, cols]` header; label
//! files carry magic 2049 and a `[count]` header. Both are big-endian u32
//! fields followed by the raw byte payload.

use std::{io::Read, path::Path};

use banditfeed_core::{PoolError, RawImages, RawLabels, encode};

use crate::error::IdxError;
use flate2::read::GzDecoder;

/// Magic number identifying an IDX image file.
pub const IDX_IMAGE_MAGIC: u32 = 2_051;
/// Magic number identifying an IDX label file.
pub const IDX_LABEL_MAGIC: u32 = 2_049;

/// Number of classes used by the decode-level one-hot expansion.
const NUM_CLASSES: usize = 10;

/// Decodes a gzip IDX image file into raw `[count, rows, cols, 1]` pixels.
///
/// # Errors
/// Returns [`IdxError::Magic`] when the magic number is not
/// [`IDX_IMAGE_MAGIC`] and [`IdxError::Truncated`] when the header or
/// payload is shorter than declared.
pub fn decode_images(path: &Path, gzipped_bytes: &[u8]) -> Result<RawImages, IdxError> {
    let decoded = gunzip_bytes(path, gzipped_bytes)?;
    let magic = read_u32_be(&decoded, 0, path, "magic")?;
    if magic != IDX_IMAGE_MAGIC {
        return Err(IdxError::Magic {
            path: path.to_path_buf(),
            expected_magic: IDX_IMAGE_MAGIC,
            found_magic: magic,
        });
    }

    let count = read_dimension(&decoded, 4, path, "count")?;
    let rows = read_dimension(&decoded, 8, path, "rows")?;
    let cols = read_dimension(&decoded, 12, path, "cols")?;

    let payload = decoded
        .get(16..)
        .ok_or_else(|| truncated(path, "missing image payload"))?;
    RawImages::new(payload.to_vec(), count, rows, cols, 1)
        .map_err(|error| truncated(path, &error.to_string()))
}

/// Decodes a gzip IDX label file into raw scalar labels.
///
/// # Errors
/// Returns [`IdxError::Magic`] when the magic number is not
/// [`IDX_LABEL_MAGIC`] and [`IdxError::Truncated`] when the header or
/// payload is shorter than declared.
pub fn decode_labels(path: &Path, gzipped_bytes: &[u8]) -> Result<RawLabels, IdxError> {
    let decoded = gunzip_bytes(path, gzipped_bytes)?;
    let magic = read_u32_be(&decoded, 0, path, "magic")?;
    if magic != IDX_LABEL_MAGIC {
        return Err(IdxError::Magic {
            path: path.to_path_buf(),
            expected_magic: IDX_LABEL_MAGIC,
            found_magic: magic,
        });
    }

    let count = read_dimension(&decoded, 4, path, "count")?;
    let payload = decoded
        .get(8..)
        .ok_or_else(|| truncated(path, "missing label payload"))?;
    if payload.len() != count {
        return Err(truncated(
            path,
            &format!("label payload holds {} of {count} declared labels", payload.len()),
        ));
    }
    Ok(RawLabels::new(payload.to_vec()))
}

/// Expands scalar labels into a `[count, 10]` one-hot matrix, the optional
/// encoding offered by the decode collaborator contract.
///
/// # Errors
/// Returns [`PoolError::LabelOutOfRange`] when a label exceeds the ten-class
/// digit space.
pub fn labels_one_hot(labels: &RawLabels) -> Result<Vec<f32>, PoolError> {
    encode::one_hot(labels.values(), NUM_CLASSES)
}

fn gunzip_bytes(path: &Path, bytes: &[u8]) -> Result<Vec<u8>, IdxError> {
    let mut gzip_decoder = GzDecoder::new(bytes);
    let mut decompressed = Vec::new();
    gzip_decoder
        .read_to_end(&mut decompressed)
        .map_err(|error| truncated(path, &format!("gzip decode failure: {error}")))?;
    Ok(decompressed)
}

fn read_dimension(
    decoded: &[u8],
    offset: usize,
    path: &Path,
    field: &str,
) -> Result<usize, IdxError> {
    let value = read_u32_be(decoded, offset, path, field)?;
    usize::try_from(value).map_err(|_| truncated(path, &format!("{field} does not fit usize")))
}

fn read_u32_be(decoded: &[u8], offset: usize, path: &Path, field: &str) -> Result<u32, IdxError> {
    let slice = decoded
        .get(offset..offset.saturating_add(4))
        .ok_or_else(|| truncated(path, &format!("missing bytes for {field} field")))?;
    let value = slice
        .iter()
        .fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte));
    Ok(value)
}

fn truncated(path: &Path, context: &str) -> IdxError {
    IdxError::Truncated {
        path: path.to_path_buf(),
        context: context.to_owned(),
    }
}
