//! K-means color quantization over RGB space.
//!
//! The engine partitions every pixel of a [`PixelSource`] into `k` clusters
//! by squared-Euclidean color distance, then recolors each pixel with the
//! mean color of its cluster. The result is a visually similar image drawn
//! from a palette of at most `k` colors.
//!
//! # How it works
//!
//! 1. **Initialization**: each of the `k` centroids is copied from a pixel
//!    at a uniformly random coordinate. Duplicates are allowed; identically
//!    seeded clusters either diverge over the iterations or stay merged,
//!    and both outcomes are accepted.
//! 2. **Assignment**: every pixel is assigned to the centroid at minimal
//!    squared RGB distance. Ties go to the lowest cluster index. Channel
//!    sums and a pixel count are accumulated per cluster as a side product.
//! 3. **Update**: each cluster with at least one pixel replaces its
//!    centroid with the integer-truncated mean of the accumulated sums.
//!    Empty clusters keep their previous centroid.
//! 4. **Convergence**: the loop stops when an assignment pass moves zero
//!    pixels between clusters, or after a fixed iteration cap (8 by
//!    default). At least one full assign/update cycle always runs.
//!
//! On termination every pixel is overwritten with its cluster's final
//! centroid through [`PixelSource::set_pixel`].
//!
//! # Example
//!
//! ```
//! use colorquant::cluster::k_means::{quantize, KMeansConfig};
//! use colorquant::image::{ImageBuffer, PixelSource, Rgb};
//!
//! let mut img = ImageBuffer::new(4, 4).unwrap();
//! for row in 0..4 {
//!     for col in 0..4 {
//!         img.set_pixel(row, col, Rgb::new((row * 60) as u8, (col * 60) as u8, 0)).unwrap();
//!     }
//! }
//!
//! let report = quantize(&mut img, &KMeansConfig::new(3).with_seed(7)).unwrap();
//! assert_eq!(report.palette.len(), 3);
//! assert!(report.iterations >= 1);
//! ```
//!
//! # Complexity
//!
//! * Time: O(W * H * K) per iteration for the assignment step, which
//!   dominates everything else; the update step is O(K).
//! * Space: O(W * H) for the assignment map plus O(K) for centroids and
//!   accumulators.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::cluster::Result;
use crate::error::Error;
use crate::image::{PixelSource, Rgb};

/// Iteration cap applied when the caller does not override it.
pub const DEFAULT_MAX_ITERATIONS: usize = 8;

/// Configuration options for a quantization run.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters to reduce the image to. Must be at least 1.
    pub k: usize,
    /// Hard cap on assign/update iterations. Must be at least 1.
    pub max_iterations: usize,
    /// Seed for centroid sampling. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl KMeansConfig {
    /// Creates a config for `k` clusters with the default iteration cap
    /// and entropy-based seeding.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: None,
        }
    }

    /// Customize the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Seed centroid sampling for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Why a run stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An assignment pass moved zero pixels.
    Converged,
    /// The iteration cap was reached while pixels were still moving.
    MaxIterationsReached,
}

/// Summary of a completed quantization run.
#[derive(Debug, Clone)]
pub struct QuantizeReport {
    /// Number of assign/update iterations executed, in `1..=max_iterations`.
    pub iterations: usize,
    /// Which terminal condition ended the loop.
    pub termination: Termination,
    /// Final centroid colors, indexed by cluster. Every output pixel holds
    /// one of these values.
    pub palette: Vec<Rgb>,
    /// Move count of the last assignment pass. Zero iff converged.
    pub last_moves: u64,
}

/// Per-cluster channel sums and pixel count for one assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Accumulator {
    r: u64,
    g: u64,
    b: u64,
    count: u64,
}

impl Accumulator {
    fn add(&mut self, pixel: Rgb) {
        self.r += pixel.r as u64;
        self.g += pixel.g as u64;
        self.b += pixel.b as u64;
        self.count += 1;
    }

    fn merge(&mut self, other: &Accumulator) {
        self.r += other.r;
        self.g += other.g;
        self.b += other.b;
        self.count += other.count;
    }

    /// Integer-truncated mean color, or `None` for an empty cluster.
    fn mean(&self) -> Option<Rgb> {
        if self.count == 0 {
            return None;
        }
        Some(Rgb::new(
            (self.r / self.count) as u8,
            (self.g / self.count) as u8,
            (self.b / self.count) as u8,
        ))
    }
}

/// Quantizes `source` in place to at most `config.k` colors, returning a
/// summary of the run.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] if `config.k` or `config.max_iterations`
///   is zero, or the source reports a zero dimension. No work is performed.
/// - [`Error::ResourceExhaustion`] if the assignment map or accumulator
///   storage cannot be sized or reserved.
///
/// `k` larger than the pixel count is not an error: sampling simply
/// produces duplicate centroids and the image degrades to fewer effective
/// clusters.
pub fn quantize<S: PixelSource>(source: &mut S, config: &KMeansConfig) -> Result<QuantizeReport> {
    validate(source, config)?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let centroids = seed_centroids(source, config.k, &mut rng)?;
    run(source, centroids, config.max_iterations, assign_pixels)
}

/// Like [`quantize`], but assigns pixels across threads with rayon.
///
/// Each worker scans whole rows into private accumulators which are merged
/// afterward, so results are bit-identical to the serial path for the same
/// seed.
pub fn quantize_parallel<S: PixelSource + Sync>(
    source: &mut S,
    config: &KMeansConfig,
) -> Result<QuantizeReport> {
    validate(source, config)?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let centroids = seed_centroids(source, config.k, &mut rng)?;
    run(source, centroids, config.max_iterations, par_assign_pixels)
}

fn validate<S: PixelSource>(source: &S, config: &KMeansConfig) -> Result<()> {
    if config.k == 0 {
        return Err(Error::InvalidParameter(
            "cluster count k must be at least 1".to_string(),
        ));
    }
    if config.max_iterations == 0 {
        return Err(Error::InvalidParameter(
            "iteration cap must be at least 1".to_string(),
        ));
    }
    if source.width() == 0 || source.height() == 0 {
        return Err(Error::InvalidParameter(format!(
            "pixel source must be at least 1x1, got {}x{}",
            source.height(),
            source.width()
        )));
    }
    Ok(())
}

/// Copies `k` centroids from uniformly random pixel coordinates. No
/// uniqueness is enforced.
fn seed_centroids<S: PixelSource>(source: &S, k: usize, rng: &mut ChaCha20Rng) -> Result<Vec<Rgb>> {
    let mut centroids = Vec::new();
    centroids
        .try_reserve_exact(k)
        .map_err(|_| Error::ResourceExhaustion(format!("cannot allocate {} centroids", k)))?;
    for _ in 0..k {
        let row = rng.gen_range(0..source.height());
        let col = rng.gen_range(0..source.width());
        centroids.push(source.get_pixel(row, col)?);
    }
    Ok(centroids)
}

/// Allocates the row-major assignment map, every entry at the sentinel
/// cluster 0.
fn new_assignments(width: u32, height: u32) -> Result<Vec<usize>> {
    let len = (width as usize).checked_mul(height as usize).ok_or_else(|| {
        Error::ResourceExhaustion(format!(
            "assignment map for a {}x{} image overflows usize",
            height, width
        ))
    })?;
    let mut assignments = Vec::new();
    assignments.try_reserve_exact(len).map_err(|_| {
        Error::ResourceExhaustion(format!("cannot allocate {} assignment entries", len))
    })?;
    assignments.resize(len, 0);
    Ok(assignments)
}

fn new_accumulators(k: usize) -> Result<Vec<Accumulator>> {
    let mut accumulators = Vec::new();
    accumulators
        .try_reserve_exact(k)
        .map_err(|_| Error::ResourceExhaustion(format!("cannot allocate {} accumulators", k)))?;
    accumulators.resize(k, Accumulator::default());
    Ok(accumulators)
}

/// Squared Euclidean distance in RGB space. Bounded by 3 * 255^2, so u32
/// arithmetic never overflows.
fn distance_sq(pixel: Rgb, centroid: Rgb) -> u32 {
    let dr = pixel.r as i32 - centroid.r as i32;
    let dg = pixel.g as i32 - centroid.g as i32;
    let db = pixel.b as i32 - centroid.b as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Index of the centroid nearest to `pixel`. Strict less-than against the
/// running minimum, so on a tie the lowest index wins.
fn nearest_centroid(pixel: Rgb, centroids: &[Rgb]) -> usize {
    let mut best = 0;
    let mut best_dist = distance_sq(pixel, centroids[0]);
    for (idx, &centroid) in centroids.iter().enumerate().skip(1) {
        let dist = distance_sq(pixel, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

/// One serial assignment pass: rewrites the assignment map, fills the
/// accumulators, and returns the number of pixels that changed cluster.
/// Pixel data is only read.
fn assign_pixels<S: PixelSource>(
    source: &S,
    centroids: &[Rgb],
    assignments: &mut [usize],
    accumulators: &mut [Accumulator],
) -> Result<u64> {
    let width = source.width() as usize;
    let mut moves = 0u64;
    for row in 0..source.height() {
        for col in 0..source.width() {
            let pixel = source.get_pixel(row, col)?;
            let best = nearest_centroid(pixel, centroids);
            let slot = &mut assignments[row as usize * width + col as usize];
            if *slot != best {
                *slot = best;
                moves += 1;
            }
            accumulators[best].add(pixel);
        }
    }
    Ok(moves)
}

/// Parallel assignment pass: each rayon worker scans whole rows into
/// private accumulators, and the per-row partials are merged by reduction.
/// Merging is integer addition, so the result matches [`assign_pixels`]
/// exactly.
fn par_assign_pixels<S: PixelSource + Sync>(
    source: &S,
    centroids: &[Rgb],
    assignments: &mut [usize],
    accumulators: &mut [Accumulator],
) -> Result<u64> {
    let width = source.width() as usize;
    let (moves, partials) = assignments
        .par_chunks_mut(width)
        .enumerate()
        .map(|(row, slots)| scan_row(source, centroids, row as u32, slots))
        .try_reduce(
            || (0, vec![Accumulator::default(); centroids.len()]),
            |(moves_a, mut partials_a), (moves_b, partials_b)| {
                for (a, b) in partials_a.iter_mut().zip(partials_b.iter()) {
                    a.merge(b);
                }
                Ok((moves_a + moves_b, partials_a))
            },
        )?;
    for (total, partial) in accumulators.iter_mut().zip(partials.iter()) {
        total.merge(partial);
    }
    Ok(moves)
}

fn scan_row<S: PixelSource>(
    source: &S,
    centroids: &[Rgb],
    row: u32,
    slots: &mut [usize],
) -> Result<(u64, Vec<Accumulator>)> {
    let mut accumulators = vec![Accumulator::default(); centroids.len()];
    let mut moves = 0u64;
    for (col, slot) in slots.iter_mut().enumerate() {
        let pixel = source.get_pixel(row, col as u32)?;
        let best = nearest_centroid(pixel, centroids);
        if *slot != best {
            *slot = best;
            moves += 1;
        }
        accumulators[best].add(pixel);
    }
    Ok((moves, accumulators))
}

/// Replaces each non-empty cluster's centroid with the truncated mean of
/// its accumulated sums; empty clusters keep their previous centroid.
/// Resets every accumulator for the next pass.
fn update_centroids(centroids: &mut [Rgb], accumulators: &mut [Accumulator]) {
    for (centroid, accumulator) in centroids.iter_mut().zip(accumulators.iter_mut()) {
        if let Some(mean) = accumulator.mean() {
            *centroid = mean;
        }
        *accumulator = Accumulator::default();
    }
}

/// Overwrites every pixel with its cluster's centroid color.
fn recolor<S: PixelSource>(
    source: &mut S,
    centroids: &[Rgb],
    assignments: &[usize],
) -> Result<()> {
    let width = source.width() as usize;
    for row in 0..source.height() {
        for col in 0..source.width() {
            let cluster = assignments[row as usize * width + col as usize];
            source.set_pixel(row, col, centroids[cluster])?;
        }
    }
    Ok(())
}

/// The assign/update driver. Always runs at least one full cycle; stops on
/// zero moves or at the iteration cap, then recolors the source from the
/// final assignments.
fn run<S, F>(
    source: &mut S,
    mut centroids: Vec<Rgb>,
    max_iterations: usize,
    mut assign: F,
) -> Result<QuantizeReport>
where
    S: PixelSource,
    F: FnMut(&S, &[Rgb], &mut [usize], &mut [Accumulator]) -> Result<u64>,
{
    let mut assignments = new_assignments(source.width(), source.height())?;
    let mut accumulators = new_accumulators(centroids.len())?;

    let mut iterations = 0;
    let (termination, last_moves) = loop {
        let moves = assign(source, &centroids, &mut assignments, &mut accumulators)?;
        update_centroids(&mut centroids, &mut accumulators);
        iterations += 1;
        debug!("iteration {}: {} moves", iterations, moves);

        if moves == 0 {
            break (Termination::Converged, moves);
        }
        if iterations >= max_iterations {
            break (Termination::MaxIterationsReached, moves);
        }
    };

    recolor(source, &centroids, &assignments)?;
    debug!("final palette: {:?}", centroids);

    Ok(QuantizeReport {
        iterations,
        termination,
        palette: centroids,
        last_moves,
    })
}
