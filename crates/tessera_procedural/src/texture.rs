//! # Colour-Map Textures
//!
//! One pixel per [`ColorField`] cell. Sampling is point-filtered and clamps
//! at the edges: no interpolation, no wrapping.

use std::collections::HashSet;

use crate::error::{TerrainError, TerrainResult};
use crate::region::{Color, ColorField};

/// An RGB image, row-major, immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Image {
    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, clamped to the nearest edge pixel.
    ///
    /// # Panics
    ///
    /// Panics on an empty image.
    #[must_use]
    pub fn pixel(&self, x: i64, y: i64) -> Color {
        assert!(!self.pixels.is_empty(), "sampling an empty image");
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width + x]
    }

    /// Nearest-neighbour lookup at normalized coordinates.
    ///
    /// `(0, 0)` is the first pixel; values outside `[0, 1)` clamp.
    #[must_use]
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let x = (u * self.width as f32).floor() as i64;
        let y = (v * self.height as f32).floor() as i64;
        self.pixel(x, y)
    }

    /// Packed `RGBRGB...` bytes for upload or encoding.
    #[must_use]
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_array()).collect()
    }

    /// Number of distinct colours present.
    #[must_use]
    pub fn distinct_colors(&self) -> usize {
        self.pixels.iter().collect::<HashSet<_>>().len()
    }
}

/// Turns a colour field into an image of `width x height` pixels.
///
/// # Errors
///
/// Returns [`TerrainError::DimensionMismatch`] if the field does not hold
/// exactly `width * height` colours.
pub fn synthesize(colors: &ColorField, width: usize, height: usize) -> TerrainResult<Image> {
    let actual = colors.colors().len();
    if actual != width * height {
        return Err(TerrainError::DimensionMismatch {
            expected: width * height,
            actual,
        });
    }
    Ok(Image {
        width,
        height,
        pixels: colors.colors().to_vec(),
    })
}
