//! # Deterministic Noise Utility
//!
//! Every observable random decision in the world comes from this module:
//!
//! - `coherent_noise`: smooth 2D simplex noise mapped to `[0, 1)`
//! - `offsets_from_seed`: per-channel sampling offsets derived from the seed
//! - `hash01` / `mix64`: avalanche hashing of integers
//! - `chunk_rng` / `keyed_rng`: ChaCha streams seeded from `(seed, key, salt)`
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, this module produces **exactly** the same
//! values on any platform, any time. ChaCha is used instead of `StdRng`
//! because its output stream is specified and stable across `rand` releases.

use std::sync::OnceLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wildmere_shared::{Cell, ChunkKey};

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

    /// Derives a sub-seed for a specific purpose (e.g., biome generation).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(mix64(hash))
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
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

        // Fisher-Yates shuffle with deterministic RNG
        let mut rng_state = seed.value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state as usize) % (i + 1);
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
        // Skew input coordinates to simplex grid
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        // Unskew to get first corner in simplex
        let unskew = f64::from(i.wrapping_add(j)) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let y1 = y0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;

        let gi0 = self.perm_table.get(ii + self.perm_table.get(jj) as usize);
        let gi1 = self.perm_table.get(ii + i1 + self.perm_table.get(jj + j1) as usize);
        let gi2 = self.perm_table.get(ii + 1 + self.perm_table.get(jj + 1) as usize);

        let n0 = self.contribution(x0, y0, gi0);
        let n1 = self.contribution(x1, y1, gi1);
        let n2 = self.contribution(x2, y2, gi2);

        // The magic number 70.0 normalizes the output
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

    /// Generates octaved (fractal) noise.
    ///
    /// Combines multiple layers of noise at different frequencies.
    ///
    /// # Arguments
    ///
    /// * `x`, `y` - Coordinates
    /// * `octaves` - Number of noise layers (typically 1-4 for climate)
    /// * `persistence` - Amplitude decay per octave (typically 0.5)
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }
}

/// Fast floor function.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) { xi - 1 } else { xi }
}

/// Range of the per-channel sampling offsets.
pub const OFFSET_RANGE: f64 = 100_000.0;

/// Largest value strictly below 1.0.
const ONE_BELOW: f64 = 1.0 - f64::EPSILON;

/// Sampling offset of one noise channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoiseOffset {
    /// X offset added before scaling.
    pub x: f64,
    /// Y offset added before scaling.
    pub y: f64,
}

/// Derives the sampling offset for a noise channel.
///
/// Distinct salts give independent offsets, so channels sampled at the same
/// cell are uncorrelated.
#[must_use]
pub fn offsets_from_seed(seed: WorldSeed, salt: u64) -> NoiseOffset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.derive(salt).value());
    NoiseOffset {
        x: rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE),
        y: rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE),
    }
}

/// The shared simplex lattice behind `coherent_noise`.
///
/// Built from a fixed seed: world variety comes from the offsets, not from
/// reshuffling the lattice.
fn base_noise() -> &'static SimplexNoise {
    static BASE: OnceLock<SimplexNoise> = OnceLock::new();
    BASE.get_or_init(|| SimplexNoise::new(WorldSeed::default()))
}

/// Smooth 2D noise in `[0, 1)`.
///
/// Continuous in `x` and `y`, bit-for-bit reproducible for identical inputs.
#[must_use]
pub fn coherent_noise(x: f64, y: f64, scale: f64, offset: NoiseOffset) -> f64 {
    let raw = base_noise().sample((x + offset.x) * scale, (y + offset.y) * scale);
    ((raw + 1.0) * 0.5).clamp(0.0, ONE_BELOW)
}

/// One seeded noise channel: an offset plus a scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseChannel {
    offset: NoiseOffset,
    scale: f64,
}

impl NoiseChannel {
    /// Creates the channel identified by `salt`.
    #[must_use]
    pub fn new(seed: WorldSeed, salt: u64, scale: f64) -> Self {
        Self {
            offset: offsets_from_seed(seed, salt),
            scale,
        }
    }

    /// Samples the channel at a cell, in `[0, 1)`.
    #[inline]
    #[must_use]
    pub fn sample(&self, cell: Cell) -> f64 {
        coherent_noise(f64::from(cell.x), f64::from(cell.y), self.scale, self.offset)
    }

    /// Returns the channel's scale.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }
}

/// SplitMix64 finalizer: a fast avalanche mix of one 64-bit value.
#[inline]
#[must_use]
pub const fn mix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic hash of an integer to `[0, 1)`.
#[inline]
#[must_use]
pub fn hash01(value: u64) -> f64 {
    // 53 significant bits fill the f64 mantissa exactly
    (mix64(value) >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Hashes `(seed, key, salt)` into one 64-bit value.
#[inline]
#[must_use]
pub const fn hash_key(seed: WorldSeed, key: u64, salt: u64) -> u64 {
    mix64(seed.value() ^ mix64(key ^ mix64(salt)))
}

/// Packs a cell into a 64-bit hash key.
#[inline]
#[must_use]
pub const fn cell_key(cell: Cell) -> u64 {
    ((cell.x as u32 as u64) << 32) | cell.y as u32 as u64
}

/// ChaCha stream for an arbitrary spatial key.
#[must_use]
pub fn keyed_rng(seed: WorldSeed, key: u64, salt: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(hash_key(seed, key, salt))
}

/// ChaCha stream for one chunk and one purpose.
#[must_use]
pub fn chunk_rng(seed: WorldSeed, chunk: ChunkKey, salt: u64) -> ChaCha8Rng {
    keyed_rng(seed, chunk.raw(), salt)
}
