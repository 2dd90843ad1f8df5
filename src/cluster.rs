//! Clustering engines for palette reduction.
//!
//! This module currently provides one engine:
//! - K-means over RGB space ([`k_means`]), the classic iterative
//!   assign/update loop with a bounded iteration count.

use crate::error::Error;

/// Result type for clustering operations.
pub type Result<T> = std::result::Result<T, Error>;

pub mod k_means;

pub use k_means::{
    quantize, quantize_parallel, KMeansConfig, QuantizeReport, Termination,
    DEFAULT_MAX_ITERATIONS,
};
