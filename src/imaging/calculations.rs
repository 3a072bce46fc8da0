//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::plane::{Dimensions, ImagingError};

/// Calculate output dimensions that fit `source` into `bound` preserving aspect ratio.
///
/// Landscape sources (aspect ratio above 1) take the bound's width and derive
/// the height; square and portrait sources take the bound's height and derive
/// the width. The derived edge is truncated toward zero.
///
/// # Errors
/// [`ImagingError::InvalidDimensions`] when any source or bound edge is zero,
/// or when the derived edge truncates to zero (e.g. a 1000x1 strip into a
/// 100x100 bound).
///
/// # Examples
/// ```
/// # use bucket_resizer::imaging::{Dimensions, compute_target_dimensions};
/// // 2:1 landscape into a 100x100 box → 100x50
/// let dims = compute_target_dimensions(Dimensions::new(200, 100), Dimensions::new(100, 100));
/// assert_eq!(dims.unwrap(), Dimensions::new(100, 50));
///
/// // 1:2 portrait into a 100x100 box → 50x100
/// let dims = compute_target_dimensions(Dimensions::new(100, 200), Dimensions::new(100, 100));
/// assert_eq!(dims.unwrap(), Dimensions::new(50, 100));
/// ```
pub fn compute_target_dimensions(
    source: Dimensions,
    bound: Dimensions,
) -> Result<Dimensions, ImagingError> {
    if source.is_empty() {
        return Err(ImagingError::InvalidDimensions(format!(
            "source {source} has a zero edge"
        )));
    }
    if bound.is_empty() {
        return Err(ImagingError::InvalidDimensions(format!(
            "bound {bound} has a zero edge"
        )));
    }

    let aspect = source.width as f64 / source.height as f64;
    let target = if aspect > 1.0 {
        // Landscape: width pins to the bound
        Dimensions::new(bound.width, (bound.width as f64 / aspect) as u32)
    } else {
        // Portrait or square: height pins to the bound
        Dimensions::new((bound.height as f64 * aspect) as u32, bound.height)
    };

    if target.is_empty() {
        return Err(ImagingError::InvalidDimensions(format!(
            "{source} into {bound} collapses to {target}"
        )));
    }
    Ok(target)
}

/// Top-left offset of the target window inside the source, per axis.
///
/// Floor division, so the offset is negative whenever the target overhangs
/// the source on that axis (an overhang of one pixel gives `-1`, not `0`).
pub fn crop_offsets(source: Dimensions, target: Dimensions) -> (i64, i64) {
    let left = (source.width as i64 - target.width as i64).div_euclid(2);
    let top = (source.height as i64 - target.height as i64).div_euclid(2);
    (left, top)
}
