//! Fixed-layout 24-bit bitmap codec.
//!
//! Only one layout is supported: a 14-byte file header, a 40-byte info
//! header, then `width * height * 3` pixel bytes with no row padding and no
//! compression. Rows are stored in the order they appear in the plane.
//!
//! ## Header layout
//!
//! | Offset | Size | Field | Value written |
//! |---|---|---|---|
//! | 0 | 2 | signature | `BM` |
//! | 2 | 4 | file size | `54 + pixel bytes` |
//! | 6 | 2 + 2 | reserved | `0`, `0` |
//! | 10 | 4 | pixel data offset | `54` |
//! | 14 | 4 | info header size | `40` |
//! | 18 | 4 | width (signed) | plane width |
//! | 22 | 4 | height (signed) | plane height |
//! | 26 | 2 | planes | `1` |
//! | 28 | 2 | bits per pixel | `24` |
//! | 30 | 4 | compression | `0` |
//! | 34 | 4 | image size | pixel bytes |
//! | 38 | 16 | resolution x/y, palette, important colors | `0` |
//!
//! All multi-byte fields are little-endian, on both the read and the write
//! path, and [`decode`] reads width and height from the same slots [`encode`]
//! writes them to. Every encoded buffer decodes back to the plane it came
//! from.

use super::plane::{Dimensions, ImagingError, PixelPlane};

/// Two-byte format signature.
pub const SIGNATURE: &[u8; 2] = b"BM";
/// Size of the file header.
pub const FILE_HEADER_LEN: usize = 14;
/// Size of the info header.
pub const INFO_HEADER_LEN: usize = 40;
/// Offset of the first pixel byte.
pub const PIXEL_OFFSET: usize = FILE_HEADER_LEN + INFO_HEADER_LEN;

/// Width and height slots inside the info header.
const DIMENSION_FIELDS: std::ops::Range<usize> = 18..26;

/// Parse a bitmap buffer into a [`PixelPlane`].
///
/// Fails with [`ImagingError::MalformedImage`] when the signature is wrong,
/// the header is truncated, either dimension is non-positive, or the buffer
/// holds fewer than `width * height * 3` pixel bytes. Trailing bytes past the
/// pixel data are ignored.
pub fn decode(buffer: &[u8]) -> Result<PixelPlane, ImagingError> {
    if buffer.len() < PIXEL_OFFSET {
        return Err(ImagingError::MalformedImage(format!(
            "buffer is {} bytes, header needs {PIXEL_OFFSET}",
            buffer.len()
        )));
    }
    if &buffer[..2] != SIGNATURE {
        return Err(ImagingError::MalformedImage(format!(
            "bad signature {:02x?}",
            &buffer[..2]
        )));
    }

    let (width, height) = read_dimensions(buffer)?;
    let dimensions = Dimensions::new(width, height);
    let pixel_len = dimensions.pixel_bytes().ok_or_else(|| {
        ImagingError::MalformedImage(format!("{dimensions} overflows pixel buffer size"))
    })?;
    let end = PIXEL_OFFSET.checked_add(pixel_len).ok_or_else(|| {
        ImagingError::MalformedImage(format!("{dimensions} overflows pixel buffer size"))
    })?;
    if buffer.len() < end {
        return Err(ImagingError::MalformedImage(format!(
            "{dimensions} image needs {end} bytes, buffer has {}",
            buffer.len()
        )));
    }

    PixelPlane::new(dimensions, buffer[PIXEL_OFFSET..end].to_vec())
}

/// Read the width and height fields as little-endian signed 32-bit integers.
///
/// Returns `MalformedImage` when either is zero or negative.
pub fn read_dimensions(buffer: &[u8]) -> Result<(u32, u32), ImagingError> {
    let fields = buffer.get(DIMENSION_FIELDS).ok_or_else(|| {
        ImagingError::MalformedImage("buffer too short for dimension fields".to_string())
    })?;
    let width = i32::from_le_bytes([fields[0], fields[1], fields[2], fields[3]]);
    let height = i32::from_le_bytes([fields[4], fields[5], fields[6], fields[7]]);
    if width <= 0 || height <= 0 {
        return Err(ImagingError::MalformedImage(format!(
            "non-positive dimensions {width}x{height}"
        )));
    }
    Ok((width as u32, height as u32))
}

/// Serialize a plane into a bitmap buffer.
///
/// Fails with [`ImagingError::InvalidDimensions`] only when a dimension or
/// the total size does not fit the 32-bit header fields.
pub fn encode(plane: &PixelPlane) -> Result<Vec<u8>, ImagingError> {
    let dims = plane.dimensions();
    let too_large = || ImagingError::InvalidDimensions(format!("{dims} too large to encode"));

    let width = i32::try_from(dims.width).map_err(|_| too_large())?;
    let height = i32::try_from(dims.height).map_err(|_| too_large())?;
    let pixels = plane.pixels();
    let image_size = u32::try_from(pixels.len()).map_err(|_| too_large())?;
    let file_size = image_size
        .checked_add(PIXEL_OFFSET as u32)
        .ok_or_else(too_large)?;

    let mut out = Vec::with_capacity(PIXEL_OFFSET + pixels.len());

    // File header
    out.extend_from_slice(SIGNATURE);
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(PIXEL_OFFSET as u32).to_le_bytes());

    // Info header
    out.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    for _ in 0..4 {
        out.extend_from_slice(&0u32.to_le_bytes());
    }
    debug_assert_eq!(out.len(), PIXEL_OFFSET);

    out.extend_from_slice(pixels);
    Ok(out)
}
