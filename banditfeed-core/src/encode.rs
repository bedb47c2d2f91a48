//! Fixed-width one-hot and multi-hot label encodings.

use crate::error::PoolError;

/// Encodes scalar labels as a row-major one-hot matrix of `[labels.len(), num_actions]`.
///
/// # Errors
/// Returns [`PoolError::LabelOutOfRange`] when any label does not fit the
/// action space.
///
/// # Examples
/// ```
/// use banditfeed_core::encode::one_hot;
///
/// let encoded = one_hot(&[1, 0], 3)?;
/// assert_eq!(encoded, vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
/// # Ok::<(), banditfeed_core::PoolError>(())
/// ```
pub fn one_hot(labels: &[u8], num_actions: usize) -> Result<Vec<f32>, PoolError> {
    let mut encoded = vec![0.0_f32; labels.len().saturating_mul(num_actions)];
    for (row, &label) in labels.iter().enumerate() {
        let column = check_label(label, num_actions)?;
        let index = row.saturating_mul(num_actions).saturating_add(column);
        if let Some(slot) = encoded.get_mut(index) {
            *slot = 1.0;
        }
    }
    Ok(encoded)
}

/// Encodes label groups as a multi-hot matrix of `[groups, num_actions]`.
///
/// Each group of `group_len` labels becomes one row; duplicate labels within
/// a group collapse onto a single set bit.
///
/// # Errors
/// Returns [`PoolError::LabelOutOfRange`] when any label does not fit the
/// action space.
///
/// # Examples
/// ```
/// use banditfeed_core::encode::multi_hot;
///
/// let encoded = multi_hot(&[2, 0, 2], 3, 4)?;
/// assert_eq!(encoded, vec![1.0, 0.0, 1.0, 0.0]);
/// # Ok::<(), banditfeed_core::PoolError>(())
/// ```
pub fn multi_hot(
    labels: &[u8],
    group_len: usize,
    num_actions: usize,
) -> Result<Vec<f32>, PoolError> {
    if group_len == 0 {
        return Ok(Vec::new());
    }
    let groups = labels.len().div_euclid(group_len);
    let mut encoded = vec![0.0_f32; groups.saturating_mul(num_actions)];
    for (row, group) in labels.chunks_exact(group_len).enumerate() {
        for &label in group {
            let column = check_label(label, num_actions)?;
            let index = row.saturating_mul(num_actions).saturating_add(column);
            if let Some(slot) = encoded.get_mut(index) {
                *slot = 1.0;
            }
        }
    }
    Ok(encoded)
}

fn check_label(label: u8, num_actions: usize) -> Result<usize, PoolError> {
    let column = usize::from(label);
    if column >= num_actions {
        return Err(PoolError::LabelOutOfRange { label, num_actions });
    }
    Ok(column)
}
