//! Error types shared across the crate.

use thiserror::Error;

/// Errors reported by the quantization engine and the pixel sources it
/// consumes.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter is outside its documented domain,
    /// e.g. zero clusters or a zero-sized image.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A pixel access named a coordinate outside the source's bounds.
    #[error("Pixel ({row}, {col}) is out of bounds for a {height}x{width} image")]
    OutOfBounds {
        /// Requested row.
        row: u32,
        /// Requested column.
        col: u32,
        /// Width of the source that rejected the access.
        width: u32,
        /// Height of the source that rejected the access.
        height: u32,
    },

    /// Storage proportional to the image or cluster count could not be
    /// sized or reserved.
    #[error("Resource exhaustion: {0}")]
    ResourceExhaustion(String),
}

/// Result type for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
