//! Center crop-or-pad resize.
//!
//! There is no resampling: every output pixel is either copied from the
//! source at a fixed offset or filled with opaque white.

use super::calculations::{compute_target_dimensions, crop_offsets};
use super::plane::{BYTES_PER_PIXEL, Dimensions, ImagingError, PixelPlane};

/// Fill colour for output pixels that fall outside the source.
pub const PAD_COLOR: [u8; 3] = [255, 255, 255];

/// Fit `source` into `bound` (see [`compute_target_dimensions`]) and
/// center-crop or pad it to the resulting size.
pub fn resize(source: &PixelPlane, bound: Dimensions) -> Result<PixelPlane, ImagingError> {
    let target = compute_target_dimensions(source.dimensions(), bound)?;
    crop_or_pad(source, target)
}

/// Produce a `target`-sized plane centred on `source`.
///
/// Output pixel `(x, y)` reads source pixel `(x + left, y + top)` where
/// `(left, top)` come from [`crop_offsets`]. Positions outside the source on
/// either side are filled with [`PAD_COLOR`].
pub fn crop_or_pad(source: &PixelPlane, target: Dimensions) -> Result<PixelPlane, ImagingError> {
    let len = target.pixel_bytes().ok_or_else(|| {
        ImagingError::InvalidDimensions(format!("{target} overflows pixel buffer size"))
    })?;
    let (left, top) = crop_offsets(source.dimensions(), target);
    let src_w = source.width() as i64;
    let src_h = source.height() as i64;
    let src = source.pixels();

    let mut out = Vec::with_capacity(len);
    for y in 0..target.height as i64 {
        let sy = y + top;
        for x in 0..target.width as i64 {
            let sx = x + left;
            if (0..src_w).contains(&sx) && (0..src_h).contains(&sy) {
                let offset = ((sy * src_w + sx) as usize) * BYTES_PER_PIXEL;
                out.extend_from_slice(&src[offset..offset + BYTES_PER_PIXEL]);
            } else {
                out.extend_from_slice(&PAD_COLOR);
            }
        }
    }

    PixelPlane::new(target, out)
}
