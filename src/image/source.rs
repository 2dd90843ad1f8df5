//! The pixel-access boundary between images and the clustering engine.

use crate::error::Result;

/// An RGB color with 8-bit channels. Doubles as the centroid type: a
/// centroid is the mean color of the pixels currently assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Read/write access to the pixels of a raster image.
///
/// Dimensions are fixed for the source's lifetime and must both be at
/// least 1. Accessors take `(row, col)` with `row` in `[0, height)` and
/// `col` in `[0, width)`; out-of-range coordinates return
/// [`Error::OutOfBounds`](crate::error::Error::OutOfBounds) rather than
/// panicking or reading undefined memory.
pub trait PixelSource {
    /// Image width in pixels.
    fn width(&self) -> u32;

    /// Image height in pixels.
    fn height(&self) -> u32;

    /// Returns the color stored at `(row, col)`.
    fn get_pixel(&self, row: u32, col: u32) -> Result<Rgb>;

    /// Overwrites the color stored at `(row, col)`.
    fn set_pixel(&mut self, row: u32, col: u32, color: Rgb) -> Result<()>;
}
