//! An owned in-memory image backed by a flat row-major byte buffer.

use crate::error::{Error, Result};
use crate::image::source::{PixelSource, Rgb};

/// Bytes per pixel in the backing buffer (R, G, B).
const CHANNELS: usize = 3;

/// A width x height RGB image stored as one contiguous `Vec<u8>` in
/// row-major order, three bytes per pixel.
///
/// # Example
///
/// ```
/// use colorquant::image::{ImageBuffer, PixelSource, Rgb};
///
/// let mut img = ImageBuffer::new(4, 2).unwrap();
/// img.set_pixel(1, 3, Rgb::new(200, 100, 50)).unwrap();
/// assert_eq!(img.get_pixel(1, 3).unwrap(), Rgb::new(200, 100, 50));
/// assert!(img.get_pixel(2, 0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Creates a black image of the given dimensions.
    ///
    /// Returns `InvalidParameter` if either dimension is zero and
    /// `ResourceExhaustion` if the byte size overflows or cannot be
    /// reserved.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = Self::byte_len(width, height)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| {
            Error::ResourceExhaustion(format!("cannot allocate {} image bytes", len))
        })?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wraps an existing row-major RGB byte vector.
    ///
    /// `data.len()` must equal `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let len = Self::byte_len(width, height)?;
        if data.len() != len {
            return Err(Error::InvalidParameter(format!(
                "raw buffer holds {} bytes but a {}x{} image needs {}",
                data.len(),
                height,
                width,
                len
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Borrows the backing bytes in row-major R, G, B order.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the image, returning the backing bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    fn byte_len(width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter(format!(
                "image dimensions must be at least 1x1, got {}x{}",
                height, width
            )));
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| {
                Error::ResourceExhaustion(format!(
                    "byte size of a {}x{} image overflows usize",
                    height, width
                ))
            })
    }

    /// Byte offset of the first channel of `(row, col)`, or an
    /// `OutOfBounds` error.
    fn offset(&self, row: u32, col: u32) -> Result<usize> {
        if row >= self.height || col >= self.width {
            return Err(Error::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok((row as usize * self.width as usize + col as usize) * CHANNELS)
    }
}

impl PixelSource for ImageBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn get_pixel(&self, row: u32, col: u32) -> Result<Rgb> {
        let at = self.offset(row, col)?;
        Ok(Rgb::new(self.data[at], self.data[at + 1], self.data[at + 2]))
    }

    fn set_pixel(&mut self, row: u32, col: u32, color: Rgb) -> Result<()> {
        let at = self.offset(row, col)?;
        self.data[at] = color.r;
        self.data[at + 1] = color.g;
        self.data[at + 2] = color.b;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_new_image_is_black() {
        let img = ImageBuffer::new(3, 2).unwrap();
        for row in 0..2 {
            for col in 0..3 {
                assert_eq!(img.get_pixel(row, col).unwrap(), Rgb::new(0, 0, 0));
            }
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            ImageBuffer::new(0, 5),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            ImageBuffer::new(5, 0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_from_raw_length_mismatch() {
        let result = ImageBuffer::from_raw(2, 2, vec![0u8; 11]);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_row_major_layout() {
        let mut img = ImageBuffer::new(2, 2).unwrap();
        img.set_pixel(0, 1, Rgb::new(1, 2, 3)).unwrap();
        img.set_pixel(1, 0, Rgb::new(4, 5, 6)).unwrap();
        assert_eq!(img.as_raw(), &[0, 0, 0, 1, 2, 3, 4, 5, 6, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut img = ImageBuffer::new(4, 3).unwrap();
        assert!(matches!(
            img.get_pixel(3, 0),
            Err(Error::OutOfBounds { row: 3, col: 0, .. })
        ));
        assert!(matches!(
            img.set_pixel(0, 4, Rgb::new(9, 9, 9)),
            Err(Error::OutOfBounds { row: 0, col: 4, .. })
        ));
    }
}
