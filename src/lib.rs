pub mod cluster;
pub mod error;
pub mod image;

pub use cluster::{quantize, quantize_parallel, KMeansConfig, QuantizeReport, Termination};
pub use error::{Error, Result};
pub use image::{ImageBuffer, PixelSource, Rgb};
