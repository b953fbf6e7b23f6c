//! # Fractal Noise Fields
//!
//! Seeded simplex noise and the multi-octave height field built from it.
//!
//! ## Determinism Guarantee
//!
//! Given the same [`NoiseParameters`] and grid size, [`generate`] produces
//! **bit-identical** fields on every call. Nothing is read from ambient
//! state: the permutation table and the per-octave offsets are both derived
//! from the seed alone.
//!
//! ## Normalization
//!
//! Every field is remapped to `[0, 1]` using its *own* minimum and maximum.
//! Two neighbouring chunks are therefore normalized independently, which can
//! leave visible seams along shared edges. This is the known behaviour of the
//! pipeline and is kept on purpose.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tessera_shared::{Vec2, MIN_NOISE_SCALE};

use crate::error::{TerrainError, TerrainResult};

/// Octave offsets are drawn from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`.
const OCTAVE_OFFSET_RANGE: i32 = 100_000;

/// Sub-seed purpose for the simplex permutation table.
const PERMUTATION_STREAM: u64 = 1;

/// Most octaves a configuration may ask for. Past this the per-octave
/// amplitude is below `f32` resolution for any valid persistence < 1.
pub const MAX_OCTAVES: u32 = 32;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose.
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

/// Pre-computed permutation table for noise.
///
/// This is computed once from the seed and reused.
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
    /// Gradient table (12 gradients for 2D simplex).
    grad: [[i8; 2]; 12],
}

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];

        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle with a seeded ChaCha stream
        let mut rng = ChaCha8Rng::seed_from_u64(seed.value());
        for i in (1..256).rev() {
            let j = rng.gen_range(0..=i);
            perm.swap(i, j);
        }

        // Double the table to avoid index wrapping
        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        let grad = [
            [1, 0], [1, 1], [0, 1], [-1, 1],
            [-1, 0], [-1, -1], [0, -1], [1, -1],
            [1, 0], [0, 1], [-1, 0], [0, -1],
        ];

        Self { perm, grad }
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }

    #[inline]
    fn gradient(&self, hash: u8) -> [i8; 2] {
        self.grad[(hash % 12) as usize]
    }
}

/// 2D Simplex noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
///
/// # Example
///
/// ```rust
/// use tessera_procedural::noise::{SimplexNoise, WorldSeed};
///
/// let noise = SimplexNoise::new(WorldSeed::new(42));
/// let value = noise.sample(100.5, 200.3);
/// assert!((-1.0..=1.0).contains(&value));
/// ```
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_439; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187; // (3 - sqrt(3)) / 6

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        if !(x.is_finite() && y.is_finite()) {
            return 0.0;
        }

        // Skew input coordinates to simplex grid
        let skew = (x + y) * Self::F2;
        let i = (x + skew).floor();
        let j = (y + skew).floor();

        // Unskew to get first corner in simplex
        let unskew = (i + j) * Self::G2;
        let x0 = x - (i - unskew);
        let y0 = y - (j - unskew);
        if !(x0.is_finite() && y0.is_finite()) {
            // Skewing overflowed near f64::MAX
            return 0.0;
        }

        // Upper or lower triangle
        let (i1, j1): (i32, i32) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - f64::from(i1) + Self::G2;
        let y1 = y0 - f64::from(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = lattice_index(i);
        let jj = lattice_index(j);
        let i1 = i1 as usize;
        let j1 = j1 as usize;

        let gi0 = self.perm_table.get(ii + self.perm_table.get(jj) as usize);
        let gi1 = self.perm_table.get(ii + i1 + self.perm_table.get(jj + j1) as usize);
        let gi2 = self.perm_table.get(ii + 1 + self.perm_table.get(jj + 1) as usize);

        let n0 = self.contribution(x0, y0, gi0);
        let n1 = self.contribution(x1, y1, gi1);
        let n2 = self.contribution(x2, y2, gi2);

        // 70.0 scales the corner sum to [-1, 1]
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    #[inline]
    fn contribution(&self, x: f64, y: f64, gradient_index: u8) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let grad = self.perm_table.gradient(gradient_index);
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
        }
    }
}

/// Permutation index of an already-floored lattice coordinate.
///
/// Stays in `0..256` for any finite input; coordinates past the `i64` range
/// saturate instead of overflowing.
#[inline]
fn lattice_index(corner: f64) -> usize {
    ((corner as i64) & 255) as usize
}

/// Sampling parameters for one height field.
///
/// Immutable per generation call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParameters {
    /// Seed for the permutation table and the octave offsets.
    pub seed: u64,
    /// Feature size in grid cells. Larger = smoother.
    pub scale: f64,
    /// Number of noise layers summed together.
    pub octaves: u32,
    /// Amplitude multiplier per octave, in (0, 1].
    pub persistence: f64,
    /// Frequency multiplier per octave, at least 1.
    pub lacunarity: f64,
    /// World-space offset of the sampled window.
    pub offset: Vec2,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: Vec2::ZERO,
        }
    }
}

impl NoiseParameters {
    /// Returns a copy whose offset is shifted by `center`.
    ///
    /// Chunks sample the same infinite field through different windows.
    #[must_use]
    pub fn centered_on(self, center: Vec2) -> Self {
        Self {
            offset: self.offset + center,
            ..self
        }
    }

    /// Checks every parameter against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> TerrainResult<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(TerrainError::invalid("noise.scale", format!("must be positive, got {}", self.scale)));
        }
        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(TerrainError::invalid(
                "noise.octaves",
                format!("must be in 1..={MAX_OCTAVES}, got {}", self.octaves),
            ));
        }
        if !(self.persistence > 0.0 && self.persistence <= 1.0) {
            return Err(TerrainError::invalid(
                "noise.persistence",
                format!("must be in (0, 1], got {}", self.persistence),
            ));
        }
        if !(self.lacunarity.is_finite() && self.lacunarity >= 1.0) {
            return Err(TerrainError::invalid(
                "noise.lacunarity",
                format!("must be >= 1, got {}", self.lacunarity),
            ));
        }
        if !(self.offset.x.is_finite() && self.offset.y.is_finite()) {
            return Err(TerrainError::invalid("noise.offset", "must be finite"));
        }
        Ok(())
    }

    /// Scale actually used for sampling.
    #[must_use]
    pub fn effective_scale(&self) -> f64 {
        if self.scale.is_finite() && self.scale > MIN_NOISE_SCALE {
            self.scale
        } else {
            MIN_NOISE_SCALE
        }
    }

    /// Per-octave sample offsets, reproducible from `seed` and `offset` alone.
    ///
    /// The world offset is added on X and subtracted on Y so that increasing
    /// world Z and increasing grid row move through the field consistently.
    #[must_use]
    pub fn octave_offsets(&self) -> Vec<(f64, f64)> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..self.octaves)
            .map(|_| {
                let ox = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
                let oy = rng.gen_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE);
                (
                    f64::from(ox) + f64::from(self.offset.x),
                    f64::from(oy) - f64::from(self.offset.y),
                )
            })
            .collect()
    }
}

/// A 2D grid of height samples, normalized to `[0, 1]`.
///
/// Stored row-major: sample `(x, y)` lives at `y * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl HeightField {
    /// Wraps already-normalized samples.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::DimensionMismatch`] if `samples.len()` is not
    /// `width * height`.
    pub fn from_samples(width: usize, height: usize, samples: Vec<f32>) -> TerrainResult<Self> {
        if samples.len() != width * height {
            return Err(TerrainError::DimensionMismatch {
                expected: width * height,
                actual: samples.len(),
            });
        }
        Ok(Self { width, height, samples })
    }

    /// Samples along X.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Samples along Y.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        assert!(x < self.width && y < self.height, "sample ({x}, {y}) outside {}x{}", self.width, self.height);
        self.samples[y * self.width + x]
    }

    /// All samples, row-major.
    #[inline]
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Smallest and largest sample, or `None` for an empty field.
    #[must_use]
    pub fn range(&self) -> Option<(f32, f32)> {
        self.samples.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Generates a `width x height` fractal height field.
///
/// Each cell accumulates `amplitude * simplex(sample)` over all octaves,
/// multiplying amplitude by `persistence` and frequency by `lacunarity` after
/// each one. The result is remapped linearly from the field's own
/// `[min, max]` to `[0, 1]`. A constant field (including the empty and
/// single-cell cases) maps to all zeros.
///
/// A scale at or below zero is clamped to [`MIN_NOISE_SCALE`] rather than
/// rejected; configurations are rejected earlier by
/// [`NoiseParameters::validate`].
#[must_use]
pub fn generate(width: usize, height: usize, params: &NoiseParameters) -> HeightField {
    let noise = SimplexNoise::new(WorldSeed::new(params.seed).derive(PERMUTATION_STREAM));
    let offsets = params.octave_offsets();
    let scale = params.effective_scale();

    let half_width = width as f64 / 2.0;
    let half_height = height as f64 / 2.0;

    let mut raw = Vec::with_capacity(width * height);
    let mut min = f64::MAX;
    let mut max = f64::MIN;

    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0;
            let mut frequency = 1.0;
            let mut value = 0.0;

            for &(ox, oy) in &offsets {
                let sample_x = (x as f64 - half_width + ox) / scale * frequency;
                let sample_y = (y as f64 - half_height + oy) / scale * frequency;
                value += noise.sample(sample_x, sample_y) * amplitude;

                amplitude *= params.persistence;
                frequency *= params.lacunarity;
            }

            min = min.min(value);
            max = max.max(value);
            raw.push(value);
        }
    }

    let span = max - min;
    let samples = raw
        .into_iter()
        .map(|v| if span > 0.0 { ((v - min) / span) as f32 } else { 0.0 })
        .collect();

    HeightField { width, height, samples }
}
