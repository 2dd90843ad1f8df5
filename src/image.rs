//! Pixel sources consumed by the clustering engine.
//!
//! The engine never assumes a byte layout; it talks to images exclusively
//! through the [`PixelSource`] trait. [`ImageBuffer`] is the bundled
//! implementation backing pixels with a flat row-major byte vector, but any
//! decoded-image object that can answer bounds-checked reads and writes can
//! stand in for it.

pub mod buffer;
pub mod source;

pub use buffer::ImageBuffer;
pub use source::{PixelSource, Rgb};
