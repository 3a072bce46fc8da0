//! Image processing: fixed-format bitmaps, no external codecs.
//!
//! | Operation | Function |
//! |---|---|
//! | **Decode** | [`bitmap::decode`]: 54-byte header + packed BGR rows |
//! | **Encode** | [`bitmap::encode`] |
//! | **Fit** | [`compute_target_dimensions`]: aspect-preserving, truncating |
//! | **Resize** | [`resize()`]: center crop-or-pad, white fill |
//!
//! The module is split into:
//! - **Plane**: [`PixelPlane`], [`Dimensions`] and [`ImagingError`]
//! - **Bitmap**: the byte-level codec
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Resize**: crop-or-pad over a decoded plane

pub mod bitmap;
mod calculations;
mod plane;
mod resize;

pub use calculations::{compute_target_dimensions, crop_offsets};
pub use plane::{BYTES_PER_PIXEL, Dimensions, ImagingError, PixelPlane};
pub use resize::{PAD_COLOR, crop_or_pad, resize};

