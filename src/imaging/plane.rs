//! Decoded raster types and the imaging error.
//!
//! A [`PixelPlane`] is the in-memory form every imaging operation works on:
//! width, height and a tightly packed row-major run of 3-byte
//! (blue, green, red) triples. The constructor enforces the length invariant,
//! so code holding a plane never needs to re-check it.

use thiserror::Error;

/// Bytes per pixel in a plane (blue, green, red).
pub const BYTES_PER_PIXEL: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImagingError {
    #[error("Malformed image: {0}")]
    MalformedImage(String),
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// A (width, height) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixel bytes a plane of this size occupies, or `None` on overflow.
    pub fn pixel_bytes(self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(BYTES_PER_PIXEL)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Decoded image: dimensions plus row-major BGR pixel bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelPlane {
    dimensions: Dimensions,
    pixels: Vec<u8>,
}

impl PixelPlane {
    /// Build a plane, checking that both edges are positive and that
    /// `pixels.len() == width * height * 3`.
    pub fn new(dimensions: Dimensions, pixels: Vec<u8>) -> Result<Self, ImagingError> {
        if dimensions.is_empty() {
            return Err(ImagingError::InvalidDimensions(format!(
                "plane must have positive width and height, got {dimensions}"
            )));
        }
        let expected = dimensions.pixel_bytes().ok_or_else(|| {
            ImagingError::InvalidDimensions(format!("{dimensions} overflows pixel buffer size"))
        })?;
        if pixels.len() != expected {
            return Err(ImagingError::MalformedImage(format!(
                "{dimensions} plane needs {expected} pixel bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self { dimensions, pixels })
    }

    /// A plane with every pixel set to `bgr`.
    pub fn filled(dimensions: Dimensions, bgr: [u8; 3]) -> Result<Self, ImagingError> {
        let count = (dimensions.width as usize).saturating_mul(dimensions.height as usize);
        let pixels = bgr.iter().copied().cycle().take(count * BYTES_PER_PIXEL).collect();
        Self::new(dimensions, pixels)
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// The BGR triple at `(x, y)`, or `None` when outside the plane.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.dimensions.width || y >= self.dimensions.height {
            return None;
        }
        let offset = (y as usize * self.dimensions.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.pixels[offset..offset + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2]])
    }
}
